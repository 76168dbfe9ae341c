use crate::domain::allocation::{AllocationProduct, AllocationRecord, Location};
use crate::domain::reference::{GroupKind, GroupReference};
use std::collections::BTreeMap;

/// Position inside a batch that consumes a resolved group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// The location of record `record`.
    Location { record: usize },
    /// Product allocation `allocation` of record `record`.
    Product { record: usize, allocation: usize },
}

/// Distinct group references found in a batch, each with every slot that
/// needs its members.
///
/// Backed by an ordered map so iteration order depends only on the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedReferences {
    index: BTreeMap<GroupReference, Vec<Slot>>,
}

impl ExtractedReferences {
    pub fn references(&self) -> impl Iterator<Item = &GroupReference> {
        self.index.keys()
    }

    pub fn slots(&self, reference: &GroupReference) -> &[Slot] {
        self.index.get(reference).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupReference, &[Slot])> {
        self.index.iter().map(|(r, s)| (r, s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn add(&mut self, reference: GroupReference, slot: Slot) {
        self.index.entry(reference).or_default().push(slot);
    }
}

/// Terminal-group reference of a location, if its group id is set.
pub fn terminal_reference(seller_number: &str, location: &Location) -> Option<GroupReference> {
    location
        .terminal_group_id()
        .map(|id| GroupReference::new(GroupKind::Terminal, seller_number, id))
}

/// Product reference of an allocation product. A family id takes precedence
/// over a group id.
pub fn product_reference(
    seller_number: &str,
    product: &AllocationProduct,
) -> Option<GroupReference> {
    if let Some(id) = product.family_id() {
        return Some(GroupReference::new(GroupKind::ProductFamily, seller_number, id));
    }
    product
        .group_id()
        .map(|id| GroupReference::new(GroupKind::ProductGroup, seller_number, id))
}

/// Walks the batch and collects the group references that need resolving.
///
/// Pure: no I/O, and the same input always yields the same result.
pub fn extract(records: &[AllocationRecord]) -> ExtractedReferences {
    let mut extracted = ExtractedReferences::default();

    for (record_idx, record) in records.iter().enumerate() {
        let seller = record.supplier.seller_num.as_str();

        if let Some(reference) = terminal_reference(seller, &record.location) {
            extracted.add(reference, Slot::Location { record: record_idx });
        }

        for (alloc_idx, pa) in record.product_allocation_list.iter().enumerate() {
            if let Some(reference) = product_reference(seller, &pa.allocation_product) {
                extracted.add(
                    reference,
                    Slot::Product {
                        record: record_idx,
                        allocation: alloc_idx,
                    },
                );
            }
        }
    }

    extracted
}

use super::extractor::{ExtractedReferences, Slot};
use super::fanout::ResolvedMap;
use crate::domain::allocation::AllocationRecord;

/// Writes resolved group members onto every slot that referenced them.
///
/// A failed, missing or wrong-kind entry clears the slot's mapped members, so
/// its view falls back to the direct reference or to empty. Only `resolved`
/// lookups are consulted; completion order of the fan-out is irrelevant.
pub fn join(
    records: &mut [AllocationRecord],
    extracted: &ExtractedReferences,
    resolved: &ResolvedMap,
) {
    for (reference, slots) in extracted.iter() {
        let group = resolved.get(reference);

        for slot in slots {
            match *slot {
                Slot::Location { record } => {
                    if let Some(record) = records.get_mut(record) {
                        record.location.mapped_terminals =
                            group.and_then(|g| g.terminals()).map(<[_]>::to_vec);
                    }
                }
                Slot::Product { record, allocation } => {
                    if let Some(pa) = records
                        .get_mut(record)
                        .and_then(|r| r.product_allocation_list.get_mut(allocation))
                    {
                        pa.allocation_product.mapped_products =
                            group.and_then(|g| g.products()).map(<[_]>::to_vec);
                    }
                }
            }
        }
    }
}

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Pass-through fields minus the key of a computed view, so a record read
/// back from earlier output does not emit that key twice.
struct Passthrough<'a> {
    extra: &'a Map<String, Value>,
    view_key: &'static str,
}

impl Serialize for Passthrough<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.extra.iter().filter(|(k, _)| *k != self.view_key))
    }
}

/// One allocation line item returned by the primary allocation query.
///
/// Fields the engine does not interpret are kept in `extra` so the record can be
/// written back out without losing catalog data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRecord {
    #[serde(default)]
    pub supplier: Supplier,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub product_allocation_list: Vec<ProductAllocation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AllocationRecord {
    /// Every product this record allocates, in product-allocation order.
    pub fn all_products(&self) -> Vec<&Product> {
        self.product_allocation_list
            .iter()
            .flat_map(|pa| pa.allocation_product.all_products())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(default)]
    pub seller_num: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An opaque catalog group (terminal group, product family or product group).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGroup {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogGroup {
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            extra: Map::new(),
        }
    }
}

/// Serializes with an extra `allTerminals` array holding [`Location::all_terminals`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub terminal: Option<Terminal>,
    #[serde(default)]
    pub terminal_group: Option<CatalogGroup>,
    /// Members of `terminal_group`, filled in by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_terminals: Option<Vec<Terminal>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    /// The direct terminal if present, otherwise the resolved group members,
    /// otherwise nothing.
    pub fn all_terminals(&self) -> &[Terminal] {
        if let Some(terminal) = &self.terminal {
            return std::slice::from_ref(terminal);
        }
        self.mapped_terminals.as_deref().unwrap_or(&[])
    }

    pub fn terminal_group_id(&self) -> Option<i64> {
        self.terminal_group.as_ref().and_then(|g| g.id)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct View<'a> {
            terminal: Option<&'a Terminal>,
            terminal_group: Option<&'a CatalogGroup>,
            #[serde(skip_serializing_if = "Option::is_none")]
            mapped_terminals: Option<&'a Vec<Terminal>>,
            all_terminals: &'a [Terminal],
            #[serde(flatten)]
            extra: Passthrough<'a>,
        }

        View {
            terminal: self.terminal.as_ref(),
            terminal_group: self.terminal_group.as_ref(),
            mapped_terminals: self.mapped_terminals.as_ref(),
            all_terminals: self.all_terminals(),
            extra: Passthrough {
                extra: &self.extra,
                view_key: "allTerminals",
            },
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terminal {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub alternate_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mapped_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub plant_id: Option<String>,
    #[serde(default)]
    pub splc: Option<String>,
    #[serde(default)]
    pub tcn: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAllocation {
    #[serde(default)]
    pub allocation_product: AllocationProduct,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Serializes with an extra `allProducts` array holding
/// [`AllocationProduct::all_products`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationProduct {
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub product_family: Option<CatalogGroup>,
    #[serde(default)]
    pub product_group: Option<CatalogGroup>,
    /// Members of the family (or, failing that, the group), filled in by
    /// enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_products: Option<Vec<Product>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AllocationProduct {
    /// The direct product if present, otherwise the resolved group members,
    /// otherwise nothing.
    pub fn all_products(&self) -> &[Product] {
        if let Some(product) = &self.product {
            return std::slice::from_ref(product);
        }
        self.mapped_products.as_deref().unwrap_or(&[])
    }

    pub fn family_id(&self) -> Option<i64> {
        self.product_family.as_ref().and_then(|g| g.id)
    }

    pub fn group_id(&self) -> Option<i64> {
        self.product_group.as_ref().and_then(|g| g.id)
    }
}

impl Serialize for AllocationProduct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct View<'a> {
            product: Option<&'a Product>,
            product_family: Option<&'a CatalogGroup>,
            product_group: Option<&'a CatalogGroup>,
            #[serde(skip_serializing_if = "Option::is_none")]
            mapped_products: Option<&'a Vec<Product>>,
            all_products: &'a [Product],
            #[serde(flatten)]
            extra: Passthrough<'a>,
        }

        View {
            product: self.product.as_ref(),
            product_family: self.product_family.as_ref(),
            product_group: self.product_group.as_ref(),
            mapped_products: self.mapped_products.as_ref(),
            all_products: self.all_products(),
            extra: Passthrough {
                extra: &self.extra,
                view_key: "allProducts",
            },
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(id: i64, name: &str) -> Terminal {
        Terminal {
            id,
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_direct_terminal_wins_over_mapped() {
        let location = Location {
            terminal: Some(terminal(1, "Direct")),
            terminal_group: Some(CatalogGroup::with_id(7)),
            mapped_terminals: Some(vec![terminal(5, "T5"), terminal(6, "T6")]),
            ..Default::default()
        };
        assert_eq!(location.all_terminals(), &[terminal(1, "Direct")]);
    }

    #[test]
    fn test_mapped_terminals_without_direct() {
        let location = Location {
            terminal_group: Some(CatalogGroup::with_id(7)),
            mapped_terminals: Some(vec![terminal(5, "T5")]),
            ..Default::default()
        };
        assert_eq!(location.all_terminals(), &[terminal(5, "T5")]);
    }

    #[test]
    fn test_empty_view_without_any_reference() {
        let location = Location::default();
        assert!(location.all_terminals().is_empty());
        assert!(AllocationProduct::default().all_products().is_empty());
    }

    #[test]
    fn test_record_deserialization_keeps_unknown_fields() {
        let json = r#"{
            "supplier": { "sellerNum": "100", "name": "Acme" },
            "location": { "terminalGroup": { "id": 7, "name": "Gulf" } },
            "productAllocationList": [
                { "allocationProduct": { "productFamily": { "id": 3 } }, "volume": 1200 }
            ],
            "allocationId": 42
        }"#;
        let record: AllocationRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.supplier.seller_num, "100");
        assert_eq!(record.location.terminal_group_id(), Some(7));
        assert!(record.location.terminal.is_none());
        assert_eq!(
            record.product_allocation_list[0].allocation_product.family_id(),
            Some(3)
        );
        assert_eq!(record.extra.get("allocationId"), Some(&Value::from(42)));
        assert_eq!(
            record.product_allocation_list[0].extra.get("volume"),
            Some(&Value::from(1200))
        );

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["supplier"]["name"], "Acme");
        assert_eq!(back["location"]["terminalGroup"]["name"], "Gulf");
        assert!(back["location"].get("mappedTerminals").is_none());
        assert_eq!(back["location"]["allTerminals"], serde_json::json!([]));
    }

    #[test]
    fn test_serialized_location_carries_all_terminals() {
        let location = Location {
            terminal: Some(terminal(1, "Direct")),
            terminal_group: Some(CatalogGroup::with_id(7)),
            mapped_terminals: Some(vec![terminal(5, "T5")]),
            ..Default::default()
        };
        let json = serde_json::to_value(&location).unwrap();

        assert_eq!(json["mappedTerminals"][0]["id"], 5);
        assert_eq!(json["allTerminals"].as_array().unwrap().len(), 1);
        assert_eq!(json["allTerminals"][0]["id"], 1);
    }

    #[test]
    fn test_serialized_product_carries_all_products() {
        let product = AllocationProduct {
            product_family: Some(CatalogGroup::with_id(3)),
            mapped_products: Some(vec![Product {
                id: Some(4),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["allProducts"][0]["id"], 4);
        assert_eq!(json["productFamily"]["id"], 3);
    }

    #[test]
    fn test_reading_written_location_does_not_duplicate_view() {
        let location = Location {
            mapped_terminals: Some(vec![terminal(5, "T5")]),
            ..Default::default()
        };
        let written = serde_json::to_string(&location).unwrap();
        let read: Location = serde_json::from_str(&written).unwrap();
        let rewritten = serde_json::to_string(&read).unwrap();

        assert_eq!(rewritten.matches("allTerminals").count(), 1);
        assert_eq!(read.all_terminals(), &[terminal(5, "T5")]);
    }

    #[test]
    fn test_record_all_products_flattens_allocations() {
        let record = AllocationRecord {
            product_allocation_list: vec![
                ProductAllocation {
                    allocation_product: AllocationProduct {
                        product: Some(Product {
                            id: Some(1),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                ProductAllocation {
                    allocation_product: AllocationProduct {
                        mapped_products: Some(vec![
                            Product {
                                id: Some(2),
                                ..Default::default()
                            },
                            Product {
                                id: Some(3),
                                ..Default::default()
                            },
                        ]),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let ids: Vec<_> = record.all_products().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }
}

use super::allocation::Terminal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Credentials forwarded verbatim on every catalog call.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub web_service_key: String,
    pub apikey: String,
    pub username: String,
}

impl Credentials {
    pub fn new(
        web_service_key: impl Into<String>,
        apikey: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            web_service_key: web_service_key.into(),
            apikey: apikey.into(),
            username: username.into(),
        }
    }
}

// Keys stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Filters for the primary allocation query. Empty collections are omitted
/// from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationFilters {
    pub cust_supplier_id: Vec<String>,
    pub cust_terminal_id: Vec<String>,
    pub cust_product_id: Vec<String>,
    pub supplier_id: Vec<i64>,
    pub terminal_id: Vec<i64>,
    pub product_id: Vec<i64>,
    pub at_seller_num: Vec<String>,
    pub at_terminal: Vec<String>,
    pub at_terminal_group: Vec<String>,
    pub at_product_code: Vec<String>,
    pub at_product_group: Vec<String>,
    pub at_product_family: Vec<String>,
    pub include_rack_data: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<u32>,
}

impl AllocationFilters {
    /// Flattens the filters into `(name, value)` query pairs, repeating the name
    /// for each element of a collection.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        fn push<T: ToString>(
            pairs: &mut Vec<(&'static str, String)>,
            name: &'static str,
            values: &[T],
        ) {
            pairs.extend(values.iter().map(|v| (name, v.to_string())));
        }

        let mut pairs = Vec::new();
        push(&mut pairs, "custSupplierId", &self.cust_supplier_id);
        push(&mut pairs, "custTerminalId", &self.cust_terminal_id);
        push(&mut pairs, "custProductId", &self.cust_product_id);
        push(&mut pairs, "supplierId", &self.supplier_id);
        push(&mut pairs, "terminalId", &self.terminal_id);
        push(&mut pairs, "productId", &self.product_id);
        push(&mut pairs, "atSellerNum", &self.at_seller_num);
        push(&mut pairs, "atTerminal", &self.at_terminal);
        push(&mut pairs, "atTerminalGroup", &self.at_terminal_group);
        push(&mut pairs, "atProductCode", &self.at_product_code);
        push(&mut pairs, "atProductGroup", &self.at_product_group);
        push(&mut pairs, "atProductFamily", &self.at_product_family);
        if let Some(rack) = &self.include_rack_data {
            pairs.push(("includeRackData", rack.clone()));
        }
        if let Some(page) = &self.page {
            pairs.push(("page", page.clone()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        pairs
    }
}

/// Standard `{ "data": [...] }` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub data: Vec<T>,
}

/// Terminal as listed by the terminal-group membership endpoint. Its id is a
/// string, unlike the numeric id on allocation terminals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTerminal {
    #[serde(default)]
    pub id: Option<String>,
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
}

impl From<GroupTerminal> for Terminal {
    /// An id that does not parse as an integer becomes 0.
    fn from(t: GroupTerminal) -> Self {
        Terminal {
            id: t
                .id
                .as_deref()
                .and_then(|id| id.trim().parse().ok())
                .unwrap_or(0),
            alternate_id: None,
            name: t.name,
            mapped_name: t.mapped_name,
            country: t.country,
            owner: t.owner,
            plant_id: t.plant_id,
            splc: t.splc,
            tcn: t.tcn,
            extra: Map::new(),
        }
    }
}

/// Supplier listing entry. Only the seller number is interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierEntry {
    #[serde(default)]
    pub seller_num: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Location listing entry for one seller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product available for allocation at one location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationProductEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

use super::allocation::{Product, Terminal};
use crate::error::{CatalogError, ResolutionFailed};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cache operation name for terminal-group lookups.
pub const GROUPED_TERMINALS_OP: &str = "grouped_terminals";
/// Cache operation name for product family/group lookups.
pub const GROUPED_PRODUCTS_OP: &str = "grouped_products";

/// What a group identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Terminal,
    #[serde(rename = "family")]
    ProductFamily,
    #[serde(rename = "group")]
    ProductGroup,
}

impl GroupKind {
    /// Suffix appended to the cache key. Terminal groups have a single kind and
    /// carry no suffix.
    fn key_suffix(self) -> Option<&'static str> {
        match self {
            GroupKind::Terminal => None,
            GroupKind::ProductFamily => Some("family"),
            GroupKind::ProductGroup => Some("group"),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Terminal => write!(f, "terminal group"),
            GroupKind::ProductFamily => write!(f, "product family"),
            GroupKind::ProductGroup => write!(f, "product group"),
        }
    }
}

impl FromStr for GroupKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" => Ok(GroupKind::Terminal),
            "family" => Ok(GroupKind::ProductFamily),
            "group" => Ok(GroupKind::ProductGroup),
            other => Err(CatalogError::InvalidRequest(format!(
                "unknown grouping kind: {other}"
            ))),
        }
    }
}

/// A group identifier that must be expanded into its members.
///
/// Equality covers all three fields, which makes this the deduplication key for
/// a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupReference {
    pub kind: GroupKind,
    pub seller_number: String,
    pub group_id: i64,
}

impl GroupReference {
    pub fn new(kind: GroupKind, seller_number: impl Into<String>, group_id: i64) -> Self {
        Self {
            kind,
            seller_number: seller_number.into(),
            group_id,
        }
    }

    /// Stable cache key: `<operation>-<seller>-<group id>[-<kind>]`.
    pub fn cache_key(&self) -> String {
        let op = match self.kind {
            GroupKind::Terminal => GROUPED_TERMINALS_OP,
            GroupKind::ProductFamily | GroupKind::ProductGroup => GROUPED_PRODUCTS_OP,
        };
        match self.kind.key_suffix() {
            Some(suffix) => format!("{op}-{}-{}-{suffix}", self.seller_number, self.group_id),
            None => format!("{op}-{}-{}", self.seller_number, self.group_id),
        }
    }
}

impl fmt::Display for GroupReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (seller {})",
            self.kind, self.group_id, self.seller_number
        )
    }
}

/// Members returned by the catalog for one group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupMembers {
    Terminals(Vec<Terminal>),
    Products(Vec<Product>),
}

impl GroupMembers {
    /// Empty member list of the shape a given kind resolves to.
    pub fn empty_for(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Terminal => GroupMembers::Terminals(Vec::new()),
            GroupKind::ProductFamily | GroupKind::ProductGroup => {
                GroupMembers::Products(Vec::new())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GroupMembers::Terminals(t) => t.len(),
            GroupMembers::Products(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of resolving one [`GroupReference`].
#[derive(Debug)]
pub struct ResolvedGroup {
    pub members: GroupMembers,
    pub failure: Option<ResolutionFailed>,
}

impl ResolvedGroup {
    pub fn resolved(members: GroupMembers) -> Self {
        Self {
            members,
            failure: None,
        }
    }

    pub fn failed(reference: GroupReference, cause: CatalogError) -> Self {
        Self {
            members: GroupMembers::empty_for(reference.kind),
            failure: Some(ResolutionFailed { reference, cause }),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.failure.is_none()
    }

    pub fn terminals(&self) -> Option<&[Terminal]> {
        match (&self.members, &self.failure) {
            (GroupMembers::Terminals(t), None) => Some(t),
            _ => None,
        }
    }

    pub fn products(&self) -> Option<&[Product]> {
        match (&self.members, &self.failure) {
            (GroupMembers::Products(p), None) => Some(p),
            _ => None,
        }
    }
}

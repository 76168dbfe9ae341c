use crate::domain::reference::GroupReference;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Catalog returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Resolution cancelled")]
    Cancelled,
    #[error(transparent)]
    Shared(#[from] Arc<CatalogError>),
}

impl CatalogError {
    /// Whether a retry could plausibly succeed. Connection failures, timeouts,
    /// 5xx, 408 and 404 qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Transport(e) => {
                e.is_connect()
                    || e.is_timeout()
                    || e.is_request()
                    || e.status().is_some_and(|s| is_transient_status(s.as_u16()))
            }
            CatalogError::Status { status, .. } => is_transient_status(*status),
            CatalogError::Shared(inner) => inner.is_transient(),
            _ => false,
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 404
}

/// A single group reference that could not be resolved.
///
/// Carried as data on the resolved map rather than raised, so one bad group
/// only degrades the records that point at it.
#[derive(Error, Debug)]
#[error("failed to resolve {reference}: {cause}")]
pub struct ResolutionFailed {
    pub reference: GroupReference,
    #[source]
    pub cause: CatalogError,
}

pub type Result<T> = std::result::Result<T, CatalogError>;

//! Output adapters for enrichment results.

pub mod http_api;
pub mod json;

//! Adapters behind the domain ports: the HTTP catalog and its retry wrapper,
//! an in-memory catalog, and the moka-backed group cache.

pub mod http;
pub mod in_memory;
pub mod moka_cache;
pub mod retry;

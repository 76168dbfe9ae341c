//! Application layer containing the enrichment pipeline.
//!
//! `AllocationEngine` is the entry point. A batch flows through extraction of
//! distinct group references, a bounded concurrent fan-out that resolves them
//! through the cache, and a join that writes members back onto every record.

pub mod cancel;
pub mod engine;
pub mod extractor;
pub mod fanout;
pub mod join;
pub mod resolver;

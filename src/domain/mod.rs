//! Domain model: allocation records, group references and the ports the
//! engine consumes.

pub mod allocation;
pub mod catalog;
pub mod ports;
pub mod reference;

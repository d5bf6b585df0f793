//! Core types and operations for the Cemetree registry.
//!
//! This crate owns the in-memory entity graph (people, cemeteries, family
//! links, grave visits) and every operation that reads or rewires it. It does
//! no file I/O; storage backends implement [`store::RegistryStore`].

pub mod cemetery;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod person;
pub mod query;
pub mod registry;
pub mod relatives;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use registry::Registry;

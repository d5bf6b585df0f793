//! Flat-file backend for the Cemetree registry.
//!
//! Three header-led, comma-separated files sit next to each other under a
//! common path prefix: `cemeteries.csv`, `people.csv` and `visits.csv`.
//! Loading rebuilds the whole relationship graph from raw identifiers.

mod encode;
mod schema;
mod store;

pub mod error;

pub use encode::{DATE_FORMAT, TIME_FORMAT};
pub use error::{Error, Result};
pub use schema::DataFile;
pub use store::CsvStore;

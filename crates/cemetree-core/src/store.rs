//! The `RegistryStore` trait: the seam between the in-memory registry and
//! whatever keeps it between runs.
//!
//! Backends (e.g. `cemetree-store-csv`) implement it; the CLI depends on this
//! abstraction, not on a concrete backend.

use crate::Registry;

/// Abstraction over a Cemetree persistence backend.
///
/// Loading rebuilds every cross-reference and occupancy count from raw
/// identifiers; saving writes only what is needed to do that again.
pub trait RegistryStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the whole registry. Fails if any backing resource is missing or
  /// malformed; there is no partial load.
  fn load(&self) -> Result<Registry, Self::Error>;

  /// Write the whole registry, replacing what was stored before.
  fn save(&self, registry: &Registry) -> Result<(), Self::Error>;
}

//! Runtime settings, layered from an optional TOML file and `CEMETREE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use cemetree_core::cemetery::DEFAULT_CAPACITY;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Prepended to `cemeteries.csv`, `people.csv` and `visits.csv`.
  pub data_prefix:      PathBuf,
  /// Capacity given to every cemetery read from disk.
  pub default_capacity: u32,
  /// Grants searching the living and editing the registry.
  pub admin:            bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      data_prefix:      PathBuf::from("data/"),
      default_capacity: DEFAULT_CAPACITY,
      admin:            false,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then let the environment override it.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CEMETREE"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.data_prefix, PathBuf::from("data/"));
    assert_eq!(settings.default_capacity, 20_000);
    assert!(!settings.admin);
  }

  #[test]
  fn file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cemetree.toml");
    fs::write(&path, "data_prefix = \"archive/2024-\"\ndefault_capacity = 300\n").unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.data_prefix, PathBuf::from("archive/2024-"));
    assert_eq!(settings.default_capacity, 300);
    assert!(!settings.admin);
  }
}

//! Error type for `cemetree-store-csv`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] cemetree_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("missing data file: {}", .0.display())]
  MissingFile(PathBuf),

  #[error("{}: unexpected header {found:?}", file.display())]
  Header { file: PathBuf, found: String },

  #[error("{}:{line}: {source}", file.display())]
  Row {
    file:   PathBuf,
    line:   usize,
    #[source]
    source: Box<Error>,
  },

  #[error("expected {expected} columns, found {found}")]
  ColumnCount { expected: usize, found: usize },

  #[error("invalid {column}: {value:?}")]
  InvalidField { column: &'static str, value: String },

  #[error("unterminated quoted field")]
  UnterminatedQuote,

  #[error("person {person} is buried in unknown cemetery {cemetery}")]
  DanglingCemetery { person: String, cemetery: String },
}

impl Error {
  pub(crate) fn at(self, file: PathBuf, line: usize) -> Self {
    Self::Row {
      file,
      line,
      source: Box::new(self),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error types for `cemetree-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(String),

  #[error("cemetery not found: {0}")]
  CemeteryNotFound(String),

  #[error("person {0} already exists")]
  PersonExists(String),

  #[error("cemetery {0} already exists")]
  CemeteryExists(String),

  #[error("cemetery {id} is full ({occupancy}/{capacity})")]
  CapacityExceeded {
    id:        String,
    occupancy: u32,
    capacity:  u32,
  },

  #[error("death date {death} is before birth date {birth} or after {today}")]
  InvalidTemporalOrder {
    birth: NaiveDate,
    death: NaiveDate,
    today: NaiveDate,
  },

  #[error("person {0} is not deceased")]
  NotDeceased(String),

  #[error("person {0} is already deceased")]
  AlreadyDeceased(String),

  #[error("person {person} is not interred in cemetery {cemetery}")]
  NotInterred { person: String, cemetery: String },

  #[error("cemetery {id} still holds {occupancy} people")]
  CemeteryNotEmpty { id: String, occupancy: u32 },

  #[error("person {0} cannot be their own relative")]
  SelfReference(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Person — a registered individual, living or deceased.
//!
//! Raw relationship identifiers (`mother_id`, `father_id`, `spouse_id`) are
//! what gets persisted. The resolved links alongside them are installed and
//! removed only by [`crate::graph`], and point at identifiers that are
//! currently present in the registry.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Sex ─────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Sex {
  Male,
  Female,
}

// ─── Death ───────────────────────────────────────────────────────────────────

/// The death record of a person. Date, cause and resting place are set and
/// cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
  pub date:        NaiveDate,
  /// May be empty when the cause was never recorded.
  pub cause:       String,
  pub cemetery_id: String,
}

// ─── Resolved links ──────────────────────────────────────────────────────────

/// Relationship edges that resolved against the registry at connect time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Links {
  pub(crate) mother:   Option<String>,
  pub(crate) father:   Option<String>,
  pub(crate) spouse:   Option<String>,
  pub(crate) children: BTreeSet<String>,
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub id:         String,
  pub name:       String,
  pub surname:    String,
  pub sex:        Sex,
  /// Holds administrative privileges in the operator shell.
  pub admin:      bool,
  pub birth_date: NaiveDate,
  pub death:      Option<Death>,
  pub mother_id:  Option<String>,
  pub father_id:  Option<String>,
  pub spouse_id:  Option<String>,
  #[serde(default)]
  pub(crate) links: Links,
}

impl PartialEq for Person {
  fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for Person {}

impl Person {
  /// A living person with no recorded relatives.
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    surname: impl Into<String>,
    sex: Sex,
    birth_date: NaiveDate,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      surname: surname.into(),
      sex,
      admin: false,
      birth_date,
      death: None,
      mother_id: None,
      father_id: None,
      spouse_id: None,
      links: Links::default(),
    }
  }

  pub fn with_mother(mut self, id: impl Into<String>) -> Self {
    self.mother_id = Some(id.into());
    self
  }

  pub fn with_father(mut self, id: impl Into<String>) -> Self {
    self.father_id = Some(id.into());
    self
  }

  pub fn with_spouse(mut self, id: impl Into<String>) -> Self {
    self.spouse_id = Some(id.into());
    self
  }

  pub fn with_death(
    mut self,
    date: NaiveDate,
    cause: impl Into<String>,
    cemetery_id: impl Into<String>,
  ) -> Self {
    self.death = Some(Death {
      date,
      cause: cause.into(),
      cemetery_id: cemetery_id.into(),
    });
    self
  }

  pub fn is_dead(&self) -> bool { self.death.is_some() }

  pub fn death_date(&self) -> Option<NaiveDate> {
    self.death.as_ref().map(|d| d.date)
  }

  pub fn death_cause(&self) -> Option<&str> {
    self.death.as_ref().map(|d| d.cause.as_str())
  }

  pub fn cemetery_id(&self) -> Option<&str> {
    self.death.as_ref().map(|d| d.cemetery_id.as_str())
  }

  pub fn full_name(&self) -> String { format!("{} {}", self.name, self.surname) }

  /// Whole years lived: up to the death date for the deceased, up to `today`
  /// for the living. Zero if the reference date precedes the birth date.
  pub fn age(&self, today: NaiveDate) -> u32 {
    let until = self.death_date().unwrap_or(today);
    until.years_since(self.birth_date).unwrap_or(0)
  }

  pub fn mother(&self) -> Option<&str> { self.links.mother.as_deref() }

  pub fn father(&self) -> Option<&str> { self.links.father.as_deref() }

  pub fn spouse(&self) -> Option<&str> { self.links.spouse.as_deref() }

  /// Children whose mother or father link resolves to this person, in
  /// identifier order.
  pub fn children(&self) -> impl Iterator<Item = &str> {
    self.links.children.iter().map(String::as_str)
  }

  pub fn child_count(&self) -> usize { self.links.children.len() }
}

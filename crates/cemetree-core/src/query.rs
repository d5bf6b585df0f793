//! Partial-filter matching and sorting for people and cemeteries.
//!
//! A filter has the shape of the entity it matches; every `None` field is a
//! wildcard. Text compares case-insensitively, dates and identifiers by
//! value. Sorting is a separate step keyed by a [`PersonSort`] or
//! [`CemeterySort`].

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Deserialize;
use strum::{Display, EnumString};

use crate::{
  Registry,
  cemetery::Cemetery,
  person::{Person, Sex},
};

// ─── Filters ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonFilter {
  pub id:          Option<String>,
  pub name:        Option<String>,
  pub surname:     Option<String>,
  pub sex:         Option<Sex>,
  pub admin:       Option<bool>,
  pub birth_date:  Option<NaiveDate>,
  pub death_date:  Option<NaiveDate>,
  pub death_cause: Option<String>,
  pub cemetery_id: Option<String>,
  pub mother_id:   Option<String>,
  pub father_id:   Option<String>,
  pub spouse_id:   Option<String>,
}

impl PersonFilter {
  pub fn matches(&self, person: &Person) -> bool {
    text_matches(&self.id, Some(person.id.as_str()))
      && text_matches(&self.name, Some(person.name.as_str()))
      && text_matches(&self.surname, Some(person.surname.as_str()))
      && value_matches(&self.sex, Some(&person.sex))
      && value_matches(&self.admin, Some(&person.admin))
      && value_matches(&self.birth_date, Some(&person.birth_date))
      && value_matches(&self.death_date, person.death_date().as_ref())
      && text_matches(&self.death_cause, person.death_cause())
      && value_matches(&self.cemetery_id.as_deref(), person.cemetery_id().as_ref())
      && value_matches(&self.mother_id.as_deref(), person.mother_id.as_deref().as_ref())
      && value_matches(&self.father_id.as_deref(), person.father_id.as_deref().as_ref())
      && value_matches(&self.spouse_id.as_deref(), person.spouse_id.as_deref().as_ref())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CemeteryFilter {
  pub id:            Option<String>,
  pub name:          Option<String>,
  pub country:       Option<String>,
  pub city:          Option<String>,
  pub district:      Option<String>,
  pub neighbourhood: Option<String>,
  pub street:        Option<String>,
}

impl CemeteryFilter {
  pub fn matches(&self, cemetery: &Cemetery) -> bool {
    let address = &cemetery.address;
    text_matches(&self.id, Some(cemetery.id.as_str()))
      && text_matches(&self.name, Some(cemetery.name.as_str()))
      && text_matches(&self.country, Some(address.country.as_str()))
      && text_matches(&self.city, Some(address.city.as_str()))
      && text_matches(&self.district, Some(address.district.as_str()))
      && text_matches(&self.neighbourhood, Some(address.neighbourhood.as_str()))
      && text_matches(&self.street, Some(address.street.as_str()))
  }
}

fn text_matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
  match (wanted, actual) {
    (None, _) => true,
    (Some(wanted), Some(actual)) => wanted.to_lowercase() == actual.to_lowercase(),
    (Some(_), None) => false,
  }
}

fn value_matches<T: PartialEq>(wanted: &Option<T>, actual: Option<&T>) -> bool {
  match wanted {
    None => true,
    Some(wanted) => actual == Some(wanted),
  }
}

/// Which date [`narrow_by_date`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DateField {
  Birth,
  Death,
}

/// Keep the people whose `field` date lies within `from..=to`. A missing
/// bound is open; a person without that date is dropped.
pub fn narrow_by_date<'a>(
  people: Vec<&'a Person>,
  field: DateField,
  from: Option<NaiveDate>,
  to: Option<NaiveDate>,
) -> Vec<&'a Person> {
  people
    .into_iter()
    .filter(|p| {
      let date = match field {
        DateField::Birth => Some(p.birth_date),
        DateField::Death => p.death_date(),
      };
      date.is_some_and(|d| from.is_none_or(|f| d >= f) && to.is_none_or(|t| d <= t))
    })
    .collect()
}

impl Registry {
  /// People matching `filter`. With `include_alive == false` only the
  /// deceased are returned; searching the living is a privileged operation
  /// gated by the caller.
  pub fn filter_people(
    &self,
    filter: &PersonFilter,
    include_alive: bool,
  ) -> Vec<&Person> {
    self
      .people()
      .filter(|p| (include_alive || p.is_dead()) && filter.matches(p))
      .collect()
  }

  pub fn filter_cemeteries(&self, filter: &CemeteryFilter) -> Vec<&Cemetery> {
    self.cemeteries().filter(|c| filter.matches(c)).collect()
  }
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PersonSort {
  #[default]
  Id,
  Name,
  Surname,
  Birth,
  Death,
  Age,
}

impl PersonSort {
  /// Parse a key name, falling back to identifier order when unknown.
  pub fn from_key(key: &str) -> Self { key.parse().unwrap_or_default() }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CemeterySort {
  #[default]
  Id,
  Name,
  /// Country first, street last.
  Address,
  /// Fullest first.
  Ratio,
}

impl CemeterySort {
  pub fn from_key(key: &str) -> Self { key.parse().unwrap_or_default() }
}

/// Sort in place. Ties fall back to identifier order. `today` is the
/// reference date for the ages of the living.
pub fn sort_people(people: &mut [&Person], key: PersonSort, today: NaiveDate) {
  people.sort_by(|a, b| {
    let primary = match key {
      PersonSort::Id => Ordering::Equal,
      PersonSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
      PersonSort::Surname => {
        a.surname.to_lowercase().cmp(&b.surname.to_lowercase())
      }
      PersonSort::Birth => a.birth_date.cmp(&b.birth_date),
      PersonSort::Death => a.death_date().cmp(&b.death_date()),
      PersonSort::Age => a.age(today).cmp(&b.age(today)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
  });
}

pub fn sort_cemeteries(cemeteries: &mut [&Cemetery], key: CemeterySort) {
  cemeteries.sort_by(|a, b| {
    let primary = match key {
      CemeterySort::Id => Ordering::Equal,
      CemeterySort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
      CemeterySort::Address => a.address.reversed().cmp(&b.address.reversed()),
      CemeterySort::Ratio => b.occupancy_ratio().total_cmp(&a.occupancy_ratio()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
  });
}

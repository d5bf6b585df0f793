//! [`Registry`] — the single aggregate that owns every person and cemetery.
//!
//! Relationships are stored as identifiers and resolved through the maps held
//! here, so no entity ever owns another. Every component receives the
//! registry explicitly; there is no global state.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
  Error, Result,
  cemetery::{Address, Cemetery, Visit},
  person::Person,
};

#[derive(Debug, Clone, Default)]
pub struct Registry {
  pub(crate) people:     BTreeMap<String, Person>,
  pub(crate) cemeteries: BTreeMap<String, Cemetery>,
}

/// Partial update for [`Registry::edit_cemetery`]; `None` keeps the current
/// value. Capacity is not editable: it comes from configuration on every
/// load.
#[derive(Debug, Clone, Default)]
pub struct CemeteryEdit {
  pub name:          Option<String>,
  pub country:       Option<String>,
  pub city:          Option<String>,
  pub district:      Option<String>,
  pub neighbourhood: Option<String>,
  pub street:        Option<String>,
}

/// A ledger entry as seen from the visitor's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord<'a> {
  pub cemetery_id: &'a str,
  pub visited_id:  &'a str,
  pub visit:       &'a Visit,
}

impl Registry {
  pub fn new() -> Self { Self::default() }

  // ── Entity store: people ──────────────────────────────────────────────────

  /// Insert or overwrite a person without touching any relationship. Callers
  /// creating a new person must check [`Registry::contains_person`] first.
  pub fn put_person(&mut self, person: Person) -> Option<Person> {
    self.people.insert(person.id.clone(), person)
  }

  pub fn person(&self, id: &str) -> Option<&Person> { self.people.get(id) }

  /// Like [`Registry::person`] but fails with `PersonNotFound`.
  pub fn get_person(&self, id: &str) -> Result<&Person> {
    self
      .people
      .get(id)
      .ok_or_else(|| Error::PersonNotFound(id.to_owned()))
  }

  pub(crate) fn person_mut(&mut self, id: &str) -> Result<&mut Person> {
    self
      .people
      .get_mut(id)
      .ok_or_else(|| Error::PersonNotFound(id.to_owned()))
  }

  /// Drop a person from the store. Does not cascade; see
  /// [`Registry::remove_person`] for the full removal.
  pub fn take_person(&mut self, id: &str) -> Result<Person> {
    self
      .people
      .remove(id)
      .ok_or_else(|| Error::PersonNotFound(id.to_owned()))
  }

  pub fn contains_person(&self, id: &str) -> bool { self.people.contains_key(id) }

  pub fn people(&self) -> impl Iterator<Item = &Person> { self.people.values() }

  pub fn people_count(&self) -> usize { self.people.len() }

  // ── Entity store: cemeteries ──────────────────────────────────────────────

  pub fn put_cemetery(&mut self, cemetery: Cemetery) -> Option<Cemetery> {
    self.cemeteries.insert(cemetery.id.clone(), cemetery)
  }

  pub fn cemetery(&self, id: &str) -> Option<&Cemetery> { self.cemeteries.get(id) }

  pub fn get_cemetery(&self, id: &str) -> Result<&Cemetery> {
    self
      .cemeteries
      .get(id)
      .ok_or_else(|| Error::CemeteryNotFound(id.to_owned()))
  }

  pub(crate) fn cemetery_mut(&mut self, id: &str) -> Result<&mut Cemetery> {
    self
      .cemeteries
      .get_mut(id)
      .ok_or_else(|| Error::CemeteryNotFound(id.to_owned()))
  }

  pub fn contains_cemetery(&self, id: &str) -> bool {
    self.cemeteries.contains_key(id)
  }

  pub fn cemeteries(&self) -> impl Iterator<Item = &Cemetery> {
    self.cemeteries.values()
  }

  pub fn cemetery_count(&self) -> usize { self.cemeteries.len() }

  /// Cemeteries holding more people than their capacity allows.
  pub fn over_capacity(&self) -> impl Iterator<Item = &Cemetery> {
    self.cemeteries.values().filter(|c| c.is_over_capacity())
  }

  // ── Cemetery CRUD ─────────────────────────────────────────────────────────

  pub fn add_cemetery(&mut self, cemetery: Cemetery) -> Result<()> {
    if self.contains_cemetery(&cemetery.id) {
      return Err(Error::CemeteryExists(cemetery.id));
    }
    tracing::debug!(id = %cemetery.id, "adding cemetery");
    self.put_cemetery(cemetery);
    Ok(())
  }

  pub fn edit_cemetery(&mut self, id: &str, edit: CemeteryEdit) -> Result<()> {
    let cemetery = self.cemetery_mut(id)?;
    let Address {
      country,
      city,
      district,
      neighbourhood,
      street,
      ..
    } = &mut cemetery.address;

    for (slot, value) in [
      (&mut cemetery.name, edit.name),
      (country, edit.country),
      (city, edit.city),
      (district, edit.district),
      (neighbourhood, edit.neighbourhood),
      (street, edit.street),
    ] {
      if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = value;
      }
    }
    Ok(())
  }

  /// Remove an empty cemetery together with its visit ledger.
  pub fn remove_cemetery(&mut self, id: &str) -> Result<Cemetery> {
    let cemetery = self.get_cemetery(id)?;
    if cemetery.occupancy() > 0 {
      return Err(Error::CemeteryNotEmpty {
        id:        id.to_owned(),
        occupancy: cemetery.occupancy(),
      });
    }
    self
      .cemeteries
      .remove(id)
      .ok_or_else(|| Error::CemeteryNotFound(id.to_owned()))
  }

  // ── Visit ledger ──────────────────────────────────────────────────────────

  /// Record that `visitor_id` visited the grave of `visited_id`. The visited
  /// person must be interred in `cemetery_id`. Returns `false` if this exact
  /// visit was already on record.
  pub fn record_visit(
    &mut self,
    cemetery_id: &str,
    visited_id: &str,
    visitor_id: &str,
    at: NaiveDateTime,
  ) -> Result<bool> {
    self.get_person(visitor_id)?;
    let visited = self.get_person(visited_id)?;
    self.get_cemetery(cemetery_id)?;

    if visited.cemetery_id() != Some(cemetery_id) {
      return Err(Error::NotInterred {
        person:   visited_id.to_owned(),
        cemetery: cemetery_id.to_owned(),
      });
    }

    let visit = Visit {
      visitor_id: visitor_id.to_owned(),
      at,
    };
    Ok(self.cemetery_mut(cemetery_id)?.add_visit(visited_id, visit))
  }

  /// Visits to one grave, most recent first.
  pub fn visits_of(
    &self,
    cemetery_id: &str,
    visited_id: &str,
  ) -> Result<Vec<&Visit>> {
    let cemetery = self.get_cemetery(cemetery_id)?;
    self.get_person(visited_id)?;
    Ok(cemetery.visits_of(visited_id).collect())
  }

  /// Every visit made by `visitor_id`, most recent first.
  pub fn visits_by(&self, visitor_id: &str) -> Result<Vec<VisitRecord<'_>>> {
    self.get_person(visitor_id)?;
    let mut records: Vec<_> = self
      .cemeteries
      .values()
      .flat_map(move |c| {
        c.all_visits()
          .filter(move |(_, v)| v.visitor_id == visitor_id)
          .map(move |(visited_id, visit)| VisitRecord {
            cemetery_id: c.id.as_str(),
            visited_id,
            visit,
          })
      })
      .collect();
    records.sort_by(|a, b| a.visit.cmp(b.visit));
    Ok(records)
  }
}

//! Person lifecycle: registration, edits, removal and the ALIVE ⇄ DEAD
//! transitions.
//!
//! Unlike loading from storage, these entry points validate their input
//! before anything is touched: relatives must exist, death dates must fall
//! between birth and today, and a burial needs a cemetery with room left.

use chrono::NaiveDate;

use crate::{
  Error, Registry, Result,
  graph::Admission,
  person::{Death, Person, Sex},
};

/// Partial update for [`Registry::edit_person`]. Outer `None` keeps the
/// current value; for relatives, `Some(None)` clears the link.
#[derive(Debug, Clone, Default)]
pub struct PersonEdit {
  pub name:        Option<String>,
  pub surname:     Option<String>,
  pub sex:         Option<Sex>,
  pub admin:       Option<bool>,
  pub birth_date:  Option<NaiveDate>,
  pub death_cause: Option<String>,
  pub mother_id:   Option<Option<String>>,
  pub father_id:   Option<Option<String>>,
  pub spouse_id:   Option<Option<String>>,
}

/// A death date must not precede the birth date nor lie after `today`.
pub fn validate_death(
  birth: NaiveDate,
  death: NaiveDate,
  today: NaiveDate,
) -> Result<()> {
  if death < birth || death > today {
    return Err(Error::InvalidTemporalOrder {
      birth,
      death,
      today,
    });
  }
  Ok(())
}

impl Registry {
  /// Register a new person and connect it. Named relatives must already be
  /// registered; a dead person must fit in their cemetery.
  pub fn add_person(
    &mut self,
    person: Person,
    today: NaiveDate,
  ) -> Result<Admission> {
    if self.contains_person(&person.id) {
      return Err(Error::PersonExists(person.id));
    }
    self.check_relatives(&person)?;
    if let Some(death) = &person.death {
      validate_death(person.birth_date, death.date, today)?;
      self.check_room(&death.cemetery_id)?;
    }
    tracing::debug!(id = %person.id, "registering person");
    self.connect(person)
  }

  /// Apply `edit` to `id`. Relationship fields are rewired atomically: the
  /// old edges are removed, the fields changed, and the edges reinstalled.
  /// Only relatives named by the edit itself need to be registered.
  pub fn edit_person(
    &mut self,
    id: &str,
    edit: PersonEdit,
    today: NaiveDate,
  ) -> Result<()> {
    let named: Vec<String> = [&edit.mother_id, &edit.father_id, &edit.spouse_id]
      .into_iter()
      .flatten()
      .flatten()
      .cloned()
      .collect();

    let mut draft = self.get_person(id)?.clone();
    apply_edit(&mut draft, edit)?;
    crate::graph::check_references(&draft)?;
    for relative in &named {
      self.get_person(relative)?;
    }
    if let Some(death) = &draft.death {
      validate_death(draft.birth_date, death.date, today)?;
    }

    self.rewire(id, move |person| *person = draft)?;
    Ok(())
  }

  /// Remove `id` entirely: sever every relationship, forget the raw parent
  /// identifiers its children held, drop its visits as visited and visitor,
  /// then release the identifier.
  pub fn remove_person(&mut self, id: &str) -> Result<Person> {
    let children = self.disconnect(id)?;
    for child_id in &children {
      if let Some(child) = self.people.get_mut(child_id) {
        if child.mother_id.as_deref() == Some(id) {
          child.mother_id = None;
        }
        if child.father_id.as_deref() == Some(id) {
          child.father_id = None;
        }
      }
    }

    for cemetery in self.cemeteries.values_mut() {
      cemetery.forget_visited(id);
      cemetery.forget_visitor(id);
    }

    tracing::debug!(id, orphaned = children.len(), "removed person");
    self.take_person(id)
  }

  /// ALIVE → DEAD. The cemetery must exist and have room; the death date
  /// must fall between birth and `today`.
  pub fn mark_dead(
    &mut self,
    id: &str,
    date: NaiveDate,
    cause: impl Into<String>,
    cemetery_id: &str,
    today: NaiveDate,
  ) -> Result<()> {
    let person = self.get_person(id)?;
    if person.is_dead() {
      return Err(Error::AlreadyDeceased(id.to_owned()));
    }
    validate_death(person.birth_date, date, today)?;
    self.check_room(cemetery_id)?;

    let death = Death {
      date,
      cause: cause.into(),
      cemetery_id: cemetery_id.to_owned(),
    };
    self.rewire(id, move |p| p.death = Some(death))?;
    Ok(())
  }

  /// DEAD → ALIVE. Clears the death record, frees the cemetery slot and
  /// discards the visits recorded at the grave.
  pub fn mark_alive(&mut self, id: &str) -> Result<()> {
    let cemetery_id = self
      .get_person(id)?
      .cemetery_id()
      .map(str::to_owned)
      .ok_or_else(|| Error::NotDeceased(id.to_owned()))?;

    self.rewire(id, |p| p.death = None)?;
    if let Some(cemetery) = self.cemeteries.get_mut(&cemetery_id) {
      cemetery.forget_visited(id);
    }
    Ok(())
  }

  fn check_relatives(&self, person: &Person) -> Result<()> {
    crate::graph::check_references(person)?;
    for relative in [&person.mother_id, &person.father_id, &person.spouse_id]
      .into_iter()
      .flatten()
    {
      self.get_person(relative)?;
    }
    Ok(())
  }

  fn check_room(&self, cemetery_id: &str) -> Result<()> {
    let cemetery = self.get_cemetery(cemetery_id)?;
    if cemetery.is_full() {
      return Err(Error::CapacityExceeded {
        id:        cemetery.id.clone(),
        occupancy: cemetery.occupancy(),
        capacity:  cemetery.capacity,
      });
    }
    Ok(())
  }
}

fn apply_edit(person: &mut Person, edit: PersonEdit) -> Result<()> {
  let PersonEdit {
    name,
    surname,
    sex,
    admin,
    birth_date,
    death_cause,
    mother_id,
    father_id,
    spouse_id,
  } = edit;

  if let Some(name) = name.filter(|s| !s.trim().is_empty()) {
    person.name = name;
  }
  if let Some(surname) = surname.filter(|s| !s.trim().is_empty()) {
    person.surname = surname;
  }
  if let Some(sex) = sex {
    person.sex = sex;
  }
  if let Some(admin) = admin {
    person.admin = admin;
  }
  if let Some(birth_date) = birth_date {
    person.birth_date = birth_date;
  }
  if let Some(cause) = death_cause {
    match &mut person.death {
      Some(death) => death.cause = cause,
      None => return Err(Error::NotDeceased(person.id.clone())),
    }
  }
  if let Some(mother_id) = mother_id {
    person.mother_id = mother_id;
  }
  if let Some(father_id) = father_id {
    person.father_id = father_id;
  }
  if let Some(spouse_id) = spouse_id {
    person.spouse_id = spouse_id;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDateTime;

  use super::*;
  use crate::cemetery::{Address, Cemetery};

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn today() -> NaiveDate { date(2024, 6, 1) }

  fn noon(d: NaiveDate) -> NaiveDateTime { d.and_hms_opt(12, 0, 0).unwrap() }

  fn registry() -> Registry {
    let mut r = Registry::new();
    r.add_cemetery(Cemetery::new("01-001", "Edirnekapi", Address::default(), 2))
      .unwrap();
    r.add_person(
      Person::new("mom", "Leyla", "Demir", Sex::Female, date(1950, 3, 3)),
      today(),
    )
    .unwrap();
    r.add_person(
      Person::new("dad", "Kemal", "Demir", Sex::Male, date(1948, 7, 7))
        .with_spouse("mom"),
      today(),
    )
    .unwrap();
    r.add_person(
      Person::new("kid", "Can", "Demir", Sex::Male, date(1980, 1, 1))
        .with_mother("mom")
        .with_father("dad"),
      today(),
    )
    .unwrap();
    r
  }

  #[test]
  fn duplicate_identifier_is_rejected() {
    let mut r = registry();
    let err = r
      .add_person(
        Person::new("mom", "X", "Y", Sex::Female, date(1960, 1, 1)),
        today(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::PersonExists(_)));
  }

  #[test]
  fn registration_requires_known_relatives() {
    let mut r = registry();
    let err = r
      .add_person(
        Person::new("x", "X", "Y", Sex::Female, date(1990, 1, 1))
          .with_mother("nobody"),
        today(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::PersonNotFound(_)));
  }

  #[test]
  fn mark_dead_occupies_a_slot() {
    let mut r = registry();
    r.mark_dead("dad", date(2010, 2, 2), "Stroke", "01-001", today())
      .unwrap();
    let dad = r.person("dad").unwrap();
    assert_eq!(dad.cemetery_id(), Some("01-001"));
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 1);
    // relationships survive the transition
    assert_eq!(r.person("mom").unwrap().spouse(), Some("dad"));
    assert_eq!(r.person("kid").unwrap().father(), Some("dad"));
    assert_eq!(dad.child_count(), 1);
  }

  #[test]
  fn death_before_birth_is_rejected() {
    let mut r = registry();
    let err = r
      .mark_dead("kid", date(1970, 1, 1), "", "01-001", today())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTemporalOrder { .. }));
    assert!(!r.person("kid").unwrap().is_dead());
  }

  #[test]
  fn death_in_the_future_is_rejected() {
    let mut r = registry();
    let err = r
      .mark_dead("kid", date(2030, 1, 1), "", "01-001", today())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTemporalOrder { .. }));
  }

  #[test]
  fn full_cemetery_refuses_burial() {
    let mut r = registry();
    r.mark_dead("mom", date(2000, 1, 1), "", "01-001", today()).unwrap();
    r.mark_dead("dad", date(2001, 1, 1), "", "01-001", today()).unwrap();
    let err = r
      .mark_dead("kid", date(2020, 1, 1), "", "01-001", today())
      .unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { .. }));
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 2);
  }

  #[test]
  fn already_dead_cannot_die_again() {
    let mut r = registry();
    r.mark_dead("mom", date(2000, 1, 1), "", "01-001", today()).unwrap();
    assert!(matches!(
      r.mark_dead("mom", date(2000, 1, 2), "", "01-001", today()),
      Err(Error::AlreadyDeceased(_))
    ));
  }

  #[test]
  fn mark_alive_frees_the_slot_and_grave_visits() {
    let mut r = registry();
    r.mark_dead("mom", date(2000, 1, 1), "Flu", "01-001", today()).unwrap();
    r.record_visit("01-001", "mom", "kid", noon(date(2001, 1, 1)))
      .unwrap();

    r.mark_alive("mom").unwrap();
    let mom = r.person("mom").unwrap();
    assert!(!mom.is_dead());
    assert_eq!(mom.death_cause(), None);
    let cemetery = r.cemetery("01-001").unwrap();
    assert_eq!(cemetery.occupancy(), 0);
    assert_eq!(cemetery.visit_count(), 0);
    assert_eq!(mom.child_count(), 1);
  }

  #[test]
  fn mark_alive_on_the_living_fails() {
    let mut r = registry();
    assert!(matches!(r.mark_alive("kid"), Err(Error::NotDeceased(_))));
  }

  #[test]
  fn edit_rewires_parents() {
    let mut r = registry();
    r.add_person(
      Person::new("aunt", "Elif", "Demir", Sex::Female, date(1955, 5, 5)),
      today(),
    )
    .unwrap();

    r.edit_person(
      "kid",
      PersonEdit {
        mother_id: Some(Some("aunt".into())),
        ..Default::default()
      },
      today(),
    )
    .unwrap();

    assert_eq!(r.person("mom").unwrap().child_count(), 0);
    assert_eq!(r.person("aunt").unwrap().child_count(), 1);
    assert_eq!(r.person("kid").unwrap().mother(), Some("aunt"));
    assert_eq!(r.person("dad").unwrap().child_count(), 1);
  }

  #[test]
  fn edit_clearing_spouse_clears_both_sides() {
    let mut r = registry();
    r.edit_person(
      "dad",
      PersonEdit {
        spouse_id: Some(None),
        ..Default::default()
      },
      today(),
    )
    .unwrap();
    let mom = r.person("mom").unwrap();
    assert_eq!(mom.spouse(), None);
    assert_eq!(mom.spouse_id, None);
  }

  #[test]
  fn failed_edit_leaves_person_untouched() {
    let mut r = registry();
    let err = r
      .edit_person(
        "kid",
        PersonEdit {
          name: Some("Renamed".into()),
          father_id: Some(Some("kid".into())),
          ..Default::default()
        },
        today(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::SelfReference(_)));
    let kid = r.person("kid").unwrap();
    assert_eq!(kid.name, "Can");
    assert_eq!(kid.father(), Some("dad"));
  }

  #[test]
  fn death_cause_edit_needs_a_death() {
    let mut r = registry();
    let err = r
      .edit_person(
        "kid",
        PersonEdit {
          death_cause: Some("Unknown".into()),
          ..Default::default()
        },
        today(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::NotDeceased(_)));
  }

  #[test]
  fn remove_severs_every_reference() {
    let mut r = registry();
    r.mark_dead("dad", date(2010, 1, 1), "", "01-001", today()).unwrap();
    r.record_visit("01-001", "dad", "kid", noon(date(2011, 1, 1)))
      .unwrap();

    let removed = r.remove_person("dad").unwrap();
    assert_eq!(removed.id, "dad");
    assert!(r.person("dad").is_none());

    let kid = r.person("kid").unwrap();
    assert_eq!(kid.father(), None);
    assert_eq!(kid.father_id, None);
    assert_eq!(kid.mother(), Some("mom"));
    assert_eq!(r.person("mom").unwrap().spouse(), None);
    let cemetery = r.cemetery("01-001").unwrap();
    assert_eq!(cemetery.occupancy(), 0);
    assert_eq!(cemetery.visit_count(), 0);
  }

  #[test]
  fn removing_a_visitor_drops_their_visits() {
    let mut r = registry();
    r.mark_dead("dad", date(2010, 1, 1), "", "01-001", today()).unwrap();
    r.record_visit("01-001", "dad", "kid", noon(date(2011, 1, 1)))
      .unwrap();
    r.remove_person("kid").unwrap();
    assert_eq!(r.cemetery("01-001").unwrap().visit_count(), 0);
  }

  #[test]
  fn removing_unknown_person_is_not_found() {
    let mut r = registry();
    assert!(matches!(
      r.remove_person("ghost"),
      Err(Error::PersonNotFound(_))
    ));
  }
}

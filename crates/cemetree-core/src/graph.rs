//! The relationship graph: installing and removing the mother/father/spouse
//! edges and the cemetery membership of a person.
//!
//! Every edge is held on both ends as an identifier. [`Registry::connect`]
//! installs them, [`Registry::disconnect`] removes them, and anything that
//! changes a relationship-bearing field goes through [`Registry::rewire`] so
//! the graph is never observed half-updated.

use crate::{
  Error, Registry, Result,
  person::{Links, Person},
};

/// How a person was received by their cemetery when connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
  /// Living, or interred within capacity.
  Admitted,
  /// Interred even though the cemetery is now over capacity.
  OverCapacity {
    cemetery_id: String,
    occupancy:   u32,
    capacity:    u32,
  },
}

impl Admission {
  pub fn is_over_capacity(&self) -> bool {
    matches!(self, Self::OverCapacity { .. })
  }
}

impl Registry {
  /// Store a new `person` and wire its relationships. See
  /// [`Registry::connect_stored`]. An identifier already in the store is
  /// refused; changes to a stored person go through disconnect and
  /// reconnect instead.
  pub fn connect(&mut self, mut person: Person) -> Result<Admission> {
    if self.contains_person(&person.id) {
      return Err(Error::PersonExists(person.id));
    }
    check_references(&person)?;
    if let Some(cemetery_id) = person.cemetery_id() {
      self.get_cemetery(cemetery_id)?;
    }
    person.links = Links::default();
    let id = person.id.clone();
    self.put_person(person);
    self.connect_stored(&id)
  }

  /// Wire a person already present in the store:
  ///
  /// - each resolvable parent gains this person as a child;
  /// - a resolvable spouse gets a symmetric back-reference (and loses any
  ///   previous spouse);
  /// - a dead person is counted against their cemetery. Going over capacity
  ///   is reported through the returned [`Admission`], never refused.
  ///
  /// Identifiers that do not resolve are kept on the person as-is.
  pub fn connect_stored(&mut self, id: &str) -> Result<Admission> {
    let person = self.get_person(id)?;
    check_references(person)?;

    let mother_id = person.mother_id.clone();
    let father_id = person.father_id.clone();
    let spouse_id = person.spouse_id.clone();
    let cemetery_id = person.cemetery_id().map(str::to_owned);

    let mut admission = Admission::Admitted;
    if let Some(cemetery_id) = cemetery_id {
      let cemetery = self.cemetery_mut(&cemetery_id)?;
      if !cemetery.admit() {
        tracing::warn!(
          person = id,
          cemetery = %cemetery_id,
          occupancy = cemetery.occupancy(),
          capacity = cemetery.capacity,
          "cemetery is over capacity"
        );
        admission = Admission::OverCapacity {
          occupancy: cemetery.occupancy(),
          capacity: cemetery.capacity,
          cemetery_id,
        };
      }
    }

    let mother = self.adopt(mother_id.as_deref(), id);
    let father = self.adopt(father_id.as_deref(), id);
    let spouse = spouse_id.filter(|s| self.contains_person(s));

    if let Some(spouse_id) = &spouse {
      let previous = self.person_mut(spouse_id)?.links.spouse.take();
      if let Some(previous) = previous.filter(|p| p != id) {
        self.clear_spouse(&previous, spouse_id);
      }
      let other = self.person_mut(spouse_id)?;
      other.links.spouse = Some(id.to_owned());
      other.spouse_id = Some(id.to_owned());
    }

    let links = &mut self.person_mut(id)?.links;
    links.mother = mother;
    links.father = father;
    links.spouse = spouse;
    Ok(admission)
  }

  /// Undo every edge held by `id`: release its cemetery slot, leave the
  /// parents' children sets, clear the spouse on both sides, and null the
  /// matching parent link on each child. Children keep their raw parent
  /// identifier so a later reconnect can restore them.
  ///
  /// Returns the identifiers of the children that were detached.
  pub fn disconnect(&mut self, id: &str) -> Result<Vec<String>> {
    let person = self.person_mut(id)?;
    let links = std::mem::take(&mut person.links);
    let cemetery_id = person.cemetery_id().map(str::to_owned);

    if let Some(cemetery_id) = cemetery_id
      && let Some(cemetery) = self.cemeteries.get_mut(&cemetery_id)
    {
      cemetery.release();
    }

    for parent in [&links.mother, &links.father].into_iter().flatten() {
      if let Some(parent) = self.people.get_mut(parent) {
        parent.links.children.remove(id);
      }
    }

    if let Some(spouse) = &links.spouse {
      self.clear_spouse(spouse, id);
    }

    for child in &links.children {
      if let Some(child) = self.people.get_mut(child) {
        if child.links.mother.as_deref() == Some(id) {
          child.links.mother = None;
        }
        if child.links.father.as_deref() == Some(id) {
          child.links.father = None;
        }
      }
    }

    Ok(links.children.into_iter().collect())
  }

  /// Re-link children detached by [`Registry::disconnect`] whose raw parent
  /// identifier still names `id`.
  pub(crate) fn reattach_children(&mut self, id: &str, children: &[String]) {
    let mut adopted = Vec::new();
    for child_id in children {
      let Some(child) = self.people.get_mut(child_id) else {
        continue;
      };
      let mut linked = false;
      if child.mother_id.as_deref() == Some(id) {
        child.links.mother = Some(id.to_owned());
        linked = true;
      }
      if child.father_id.as_deref() == Some(id) {
        child.links.father = Some(id.to_owned());
        linked = true;
      }
      if linked {
        adopted.push(child_id.clone());
      }
    }
    if let Some(parent) = self.people.get_mut(id) {
      parent.links.children.extend(adopted);
    }
  }

  /// Apply `change` to a copy of `id`, check it, then disconnect the stored
  /// record, swap in the copy and reconnect it and its children. A change
  /// that fails the checks leaves the graph untouched. `change` must not
  /// alter the identifier.
  pub(crate) fn rewire(
    &mut self,
    id: &str,
    change: impl FnOnce(&mut Person),
  ) -> Result<Admission> {
    let mut person = self.get_person(id)?.clone();
    change(&mut person);
    debug_assert_eq!(person.id, id);
    check_references(&person)?;
    if let Some(cemetery_id) = person.cemetery_id() {
      self.get_cemetery(cemetery_id)?;
    }

    let children = self.disconnect(id)?;
    person.links = Links::default();
    self.put_person(person);
    let admission = self.connect_stored(id)?;
    self.reattach_children(id, &children);
    Ok(admission)
  }

  /// Add `child` to the children of `parent` if it resolves.
  fn adopt(&mut self, parent: Option<&str>, child: &str) -> Option<String> {
    let parent = self.people.get_mut(parent?)?;
    parent.links.children.insert(child.to_owned());
    Some(parent.id.clone())
  }

  /// Clear `who`'s spouse fields if they point at `partner`.
  fn clear_spouse(&mut self, who: &str, partner: &str) {
    if let Some(person) = self.people.get_mut(who) {
      if person.links.spouse.as_deref() == Some(partner) {
        person.links.spouse = None;
      }
      if person.spouse_id.as_deref() == Some(partner) {
        person.spouse_id = None;
      }
    }
  }
}

/// A person may not be their own parent or spouse.
pub(crate) fn check_references(person: &Person) -> Result<()> {
  let own = Some(person.id.as_str());
  if person.mother_id.as_deref() == own
    || person.father_id.as_deref() == own
    || person.spouse_id.as_deref() == own
  {
    return Err(Error::SelfReference(person.id.clone()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{
    cemetery::{Address, Cemetery},
    person::Sex,
  };

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn person(id: &str, sex: Sex) -> Person {
    Person::new(id, id.to_uppercase(), "Test", sex, date(1950, 1, 1))
  }

  fn dead(id: &str, cemetery: &str) -> Person {
    person(id, Sex::Male).with_death(date(2000, 1, 1), "Old age", cemetery)
  }

  fn family() -> Registry {
    let mut r = Registry::new();
    r.connect(person("mom", Sex::Female).with_spouse("dad")).unwrap();
    r.connect(person("dad", Sex::Male).with_spouse("mom")).unwrap();
    r.connect(person("kid", Sex::Male).with_mother("mom").with_father("dad"))
      .unwrap();
    r
  }

  fn occupancy_matches_interred(r: &Registry) -> bool {
    r.cemeteries().all(|c| {
      let interred = r
        .people()
        .filter(|p| p.cemetery_id() == Some(c.id.as_str()))
        .count();
      c.occupancy() as usize == interred
    })
  }

  #[test]
  fn connect_adds_child_to_each_parent_once() {
    let r = family();
    let mom = r.person("mom").unwrap();
    assert_eq!(mom.children().collect::<Vec<_>>(), vec!["kid"]);
    assert_eq!(r.person("dad").unwrap().child_count(), 1);
    assert_eq!(r.person("kid").unwrap().mother(), Some("mom"));
  }

  #[test]
  fn disconnect_removes_child_from_parents() {
    let mut r = family();
    r.disconnect("kid").unwrap();
    assert_eq!(r.person("mom").unwrap().child_count(), 0);
    assert_eq!(r.person("dad").unwrap().child_count(), 0);
  }

  #[test]
  fn spouse_links_are_symmetric() {
    let r = family();
    assert_eq!(r.person("mom").unwrap().spouse(), Some("dad"));
    assert_eq!(r.person("dad").unwrap().spouse(), Some("mom"));
  }

  #[test]
  fn one_sided_spouse_is_made_symmetric() {
    let mut r = Registry::new();
    r.connect(person("a", Sex::Female)).unwrap();
    r.connect(person("b", Sex::Male).with_spouse("a")).unwrap();
    let a = r.person("a").unwrap();
    assert_eq!(a.spouse(), Some("b"));
    assert_eq!(a.spouse_id.as_deref(), Some("b"));
  }

  #[test]
  fn new_spouse_displaces_the_old_one() {
    let mut r = family();
    r.connect(person("other", Sex::Male).with_spouse("mom")).unwrap();
    assert_eq!(r.person("mom").unwrap().spouse(), Some("other"));
    let dad = r.person("dad").unwrap();
    assert_eq!(dad.spouse(), None);
    assert_eq!(dad.spouse_id, None);
  }

  #[test]
  fn disconnect_clears_spouse_on_both_sides() {
    let mut r = family();
    r.disconnect("mom").unwrap();
    assert_eq!(r.person("dad").unwrap().spouse(), None);
    assert_eq!(r.person("mom").unwrap().spouse(), None);
  }

  #[test]
  fn disconnect_orphans_children_on_that_side_only() {
    let mut r = family();
    let detached = r.disconnect("mom").unwrap();
    assert_eq!(detached, vec!["kid".to_owned()]);
    let kid = r.person("kid").unwrap();
    assert_eq!(kid.mother(), None);
    assert_eq!(kid.father(), Some("dad"));
    assert_eq!(kid.mother_id.as_deref(), Some("mom"));
  }

  #[test]
  fn rewire_restores_children() {
    let mut r = family();
    r.rewire("mom", |p| p.name = "Mother".into()).unwrap();
    assert_eq!(r.person("kid").unwrap().mother(), Some("mom"));
    assert_eq!(r.person("mom").unwrap().child_count(), 1);
    assert_eq!(r.person("dad").unwrap().spouse(), Some("mom"));
  }

  #[test]
  fn unresolved_parent_is_kept_raw() {
    let mut r = Registry::new();
    r.connect(person("kid", Sex::Female).with_mother("ghost")).unwrap();
    let kid = r.person("kid").unwrap();
    assert_eq!(kid.mother(), None);
    assert_eq!(kid.mother_id.as_deref(), Some("ghost"));
  }

  #[test]
  fn self_parent_is_rejected() {
    let mut r = Registry::new();
    let err = r.connect(person("x", Sex::Male).with_father("x")).unwrap_err();
    assert!(matches!(err, Error::SelfReference(_)));
    assert!(!r.contains_person("x"));
  }

  #[test]
  fn over_capacity_is_admitted_and_flagged() {
    let mut r = Registry::new();
    r.add_cemetery(Cemetery::new("01-001", "Small", Address::default(), 2))
      .unwrap();

    assert_eq!(r.connect(dead("a", "01-001")).unwrap(), Admission::Admitted);
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 1);
    assert_eq!(r.connect(dead("b", "01-001")).unwrap(), Admission::Admitted);
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 2);

    let third = r.connect(dead("c", "01-001")).unwrap();
    assert!(third.is_over_capacity());
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 3);
    assert!(r.cemetery("01-001").unwrap().is_over_capacity());
    assert!(r.person("c").is_some());
    assert_eq!(r.over_capacity().count(), 1);
  }

  #[test]
  fn occupancy_tracks_connect_and_disconnect() {
    let mut r = Registry::new();
    r.add_cemetery(Cemetery::new("01-001", "A", Address::default(), 10))
      .unwrap();
    r.add_cemetery(Cemetery::new("01-002", "B", Address::default(), 10))
      .unwrap();
    r.connect(dead("a", "01-001")).unwrap();
    r.connect(dead("b", "01-002")).unwrap();
    r.connect(dead("c", "01-001")).unwrap();
    assert!(occupancy_matches_interred(&r));

    r.disconnect("a").unwrap();
    r.take_person("a").unwrap();
    assert!(occupancy_matches_interred(&r));
    r.rewire("c", |_| {}).unwrap();
    assert!(occupancy_matches_interred(&r));
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 1);
  }

  #[test]
  fn reconnecting_a_stored_id_is_refused() {
    let mut r = Registry::new();
    r.add_cemetery(Cemetery::new("01-001", "A", Address::default(), 10))
      .unwrap();
    r.connect(dead("mom", "01-001")).unwrap();
    r.connect(person("kid", Sex::Male).with_mother("mom")).unwrap();

    let err = r.connect(dead("mom", "01-001")).unwrap_err();
    assert!(matches!(err, Error::PersonExists(_)));
    assert_eq!(r.person("mom").unwrap().child_count(), 1);
    assert_eq!(r.person("kid").unwrap().mother(), Some("mom"));
    assert_eq!(r.cemetery("01-001").unwrap().occupancy(), 1);
    assert!(occupancy_matches_interred(&r));
  }

  #[test]
  fn unknown_cemetery_fails_before_storing() {
    let mut r = Registry::new();
    let err = r.connect(dead("a", "99-999")).unwrap_err();
    assert!(matches!(err, Error::CemeteryNotFound(_)));
    assert!(!r.contains_person("a"));
  }
}

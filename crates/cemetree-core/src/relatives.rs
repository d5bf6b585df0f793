//! Relative search: bounded walks up and down the family graph.

use serde::Serialize;
use strum::Display;

use crate::{Registry, Result, person::Person};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Kinship {
  Mother,
  Father,
  Child,
}

/// One hit of a relative search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relative {
  pub person_id:  String,
  pub kinship:    Kinship,
  /// Hops from the starting person; 1 for parents and children.
  pub generation: u32,
  /// e.g. `Grand Mother (Leyla Demir's Mother)`.
  pub label:      String,
}

impl Relative {
  fn new(person: &Person, kinship: Kinship, generation: u32, via: &Person) -> Self {
    let grand = "Grand ".repeat(generation.saturating_sub(1) as usize);
    Self {
      person_id: person.id.clone(),
      kinship,
      generation,
      label: format!("{grand}{kinship} ({}'s {kinship})", via.full_name()),
    }
  }
}

impl Registry {
  /// Ancestors then descendants of `start`, each walk depth-first and at
  /// most `generations` hops deep. Mothers are visited before fathers and
  /// children in identifier order.
  ///
  /// The two walks are independent, so a person reachable both ways is
  /// listed twice. Each step spends one generation, so cycles in the data
  /// cannot keep the walk going.
  pub fn relatives(&self, generations: u32, start: &str) -> Result<Vec<Relative>> {
    let person = self.get_person(start)?;
    let mut found = Vec::new();
    self.walk_up(person, generations, 1, &mut found);
    self.walk_down(person, generations, 1, &mut found);
    Ok(found)
  }

  fn walk_up(
    &self,
    from: &Person,
    remaining: u32,
    generation: u32,
    found: &mut Vec<Relative>,
  ) {
    if remaining == 0 {
      return;
    }
    for (kinship, parent) in
      [(Kinship::Mother, from.mother()), (Kinship::Father, from.father())]
    {
      let Some(parent) = parent.and_then(|id| self.person(id)) else {
        continue;
      };
      found.push(Relative::new(parent, kinship, generation, from));
      self.walk_up(parent, remaining - 1, generation + 1, found);
    }
  }

  fn walk_down(
    &self,
    from: &Person,
    remaining: u32,
    generation: u32,
    found: &mut Vec<Relative>,
  ) {
    if remaining == 0 {
      return;
    }
    for child in from.children().filter_map(|id| self.person(id)) {
      found.push(Relative::new(child, Kinship::Child, generation, from));
      self.walk_down(child, remaining - 1, generation + 1, found);
    }
  }
}

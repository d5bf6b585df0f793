//! Cemeteries, their occupancy accounting and the per-grave visit ledger.

use std::{
  cmp::Ordering,
  collections::{BTreeMap, BTreeSet},
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Capacity given to cemeteries whose persisted form carries none.
pub const DEFAULT_CAPACITY: u32 = 20_000;

// ─── Address ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
  pub country:       String,
  pub city:          String,
  pub district:      String,
  pub neighbourhood: String,
  pub street:        String,
  pub coordinates:   Option<Coordinates>,
}

impl Address {
  /// Most significant component first; the key used when sorting by address.
  pub fn reversed(&self) -> String {
    format!(
      "{}, {}, {}/{}, {}",
      self.country, self.city, self.district, self.neighbourhood, self.street
    )
  }
}

impl std::fmt::Display for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}, {}, {}/{}, {}",
      self.neighbourhood, self.street, self.district, self.city, self.country
    )
  }
}

// ─── Visit ───────────────────────────────────────────────────────────────────

/// One visit to a grave. Orders most recent first; visits at the same minute
/// by different visitors are kept apart by visitor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub visitor_id: String,
  pub at:         NaiveDateTime,
}

impl Ord for Visit {
  fn cmp(&self, other: &Self) -> Ordering {
    other
      .at
      .cmp(&self.at)
      .then_with(|| self.visitor_id.cmp(&other.visitor_id))
  }
}

impl PartialOrd for Visit {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

// ─── Cemetery ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cemetery {
  pub id:               String,
  pub name:             String,
  pub address:          Address,
  pub capacity:         u32,
  pub(crate) occupancy: u32,
  /// Visited person id → visits to that grave, most recent first.
  pub(crate) visits:    BTreeMap<String, BTreeSet<Visit>>,
}

impl Cemetery {
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    address: Address,
    capacity: u32,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      address,
      capacity,
      occupancy: 0,
      visits: BTreeMap::new(),
    }
  }

  pub fn occupancy(&self) -> u32 { self.occupancy }

  pub fn is_full(&self) -> bool { self.occupancy >= self.capacity }

  /// True when more people are attributed here than the capacity allows.
  pub fn is_over_capacity(&self) -> bool { self.occupancy > self.capacity }

  /// Fraction of capacity in use. A zero-capacity cemetery reads as full.
  pub fn occupancy_ratio(&self) -> f64 {
    if self.capacity == 0 {
      return 1.0;
    }
    f64::from(self.occupancy) / f64::from(self.capacity)
  }

  /// Count one more occupant. Returns `false` when this pushes the cemetery
  /// past capacity; the count is raised regardless.
  pub(crate) fn admit(&mut self) -> bool {
    self.occupancy += 1;
    self.occupancy <= self.capacity
  }

  pub(crate) fn release(&mut self) {
    self.occupancy = self.occupancy.saturating_sub(1);
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  /// Returns `false` if the identical visit was already recorded.
  pub(crate) fn add_visit(&mut self, visited_id: &str, visit: Visit) -> bool {
    self
      .visits
      .entry(visited_id.to_owned())
      .or_default()
      .insert(visit)
  }

  /// Visits to `visited_id`, most recent first.
  pub fn visits_of(&self, visited_id: &str) -> impl Iterator<Item = &Visit> {
    self.visits.get(visited_id).into_iter().flatten()
  }

  /// Every ledger entry as `(visited id, visit)`, grouped by visited person.
  pub fn all_visits(&self) -> impl Iterator<Item = (&str, &Visit)> {
    self
      .visits
      .iter()
      .flat_map(|(id, set)| set.iter().map(move |v| (id.as_str(), v)))
  }

  pub fn visit_count(&self) -> usize { self.visits.values().map(BTreeSet::len).sum() }

  pub(crate) fn forget_visited(&mut self, visited_id: &str) {
    self.visits.remove(visited_id);
  }

  pub(crate) fn forget_visitor(&mut self, visitor_id: &str) {
    for set in self.visits.values_mut() {
      set.retain(|v| v.visitor_id != visitor_id);
    }
    self.visits.retain(|_, set| !set.is_empty());
  }
}

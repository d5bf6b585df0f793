//! Aggregate statistics over the registry and over single cemeteries.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Registry, Result,
  person::{Person, Sex},
};

/// Count and share of one label: a death cause or a cemetery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
  pub label:   String,
  pub count:   usize,
  /// Percentage of the population the share was taken over.
  pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
  pub population:           usize,
  pub living:               usize,
  pub deceased:             usize,
  pub average_age_living:   Option<f64>,
  pub average_age_at_death: Option<f64>,
  pub male_percent:         f64,
  pub female_percent:       f64,
  /// Most frequent first; people with no recorded cause are left out.
  pub death_causes:         Vec<Share>,
  /// Deaths per cemetery, largest first.
  pub deaths_per_cemetery:  Vec<Share>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CemeteryStatistics {
  pub cemetery_id:          String,
  pub interred:             usize,
  pub average_age_at_death: Option<f64>,
  pub male_percent:         f64,
  pub female_percent:       f64,
  pub death_causes:         Vec<Share>,
}

impl Registry {
  /// Registry-wide figures; `today` is the reference date for the living.
  pub fn statistics(&self, today: NaiveDate) -> Statistics {
    let (dead, living): (Vec<&Person>, Vec<&Person>) =
      self.people().partition(|p| p.is_dead());
    let everyone: Vec<&Person> = self.people().collect();
    let (male_percent, female_percent) = sex_split(&everyone);

    let per_cemetery = tally(dead.iter().filter_map(|p| p.cemetery_id()));

    Statistics {
      population: everyone.len(),
      living: living.len(),
      deceased: dead.len(),
      average_age_living: average_age(&living, today),
      average_age_at_death: average_age(&dead, today),
      male_percent,
      female_percent,
      death_causes: cause_shares(&dead),
      deaths_per_cemetery: shares(per_cemetery, dead.len()),
    }
  }

  /// Figures for the people interred in `cemetery_id`.
  pub fn cemetery_statistics(&self, cemetery_id: &str) -> Result<CemeteryStatistics> {
    self.get_cemetery(cemetery_id)?;
    let interred: Vec<&Person> = self
      .people()
      .filter(|p| p.cemetery_id() == Some(cemetery_id))
      .collect();
    let (male_percent, female_percent) = sex_split(&interred);

    Ok(CemeteryStatistics {
      cemetery_id: cemetery_id.to_owned(),
      interred: interred.len(),
      // The deceased carry their own reference date.
      average_age_at_death: average_age(&interred, NaiveDate::MIN),
      male_percent,
      female_percent,
      death_causes: cause_shares(&interred),
    })
  }
}

fn average_age(people: &[&Person], today: NaiveDate) -> Option<f64> {
  if people.is_empty() {
    return None;
  }
  let total: u64 = people.iter().map(|p| u64::from(p.age(today))).sum();
  Some(total as f64 / people.len() as f64)
}

fn percent(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  part as f64 / whole as f64 * 100.0
}

fn sex_split(people: &[&Person]) -> (f64, f64) {
  let male = people.iter().filter(|p| p.sex == Sex::Male).count();
  let female = people.iter().filter(|p| p.sex == Sex::Female).count();
  (percent(male, people.len()), percent(female, people.len()))
}

fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
  let mut counts = HashMap::new();
  for label in labels {
    *counts.entry(label).or_insert(0) += 1;
  }
  counts
}

fn shares(counts: HashMap<&str, usize>, whole: usize) -> Vec<Share> {
  let mut shares: Vec<Share> = counts
    .into_iter()
    .map(|(label, count)| Share {
      label: label.to_owned(),
      count,
      percent: percent(count, whole),
    })
    .collect();
  shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
  shares
}

/// Cause distribution over `dead`, as a share of the deaths with a cause.
fn cause_shares(dead: &[&Person]) -> Vec<Share> {
  let causes = tally(
    dead
      .iter()
      .filter_map(|p| p.death_cause())
      .filter(|c| !c.trim().is_empty()),
  );
  let recorded: usize = causes.values().sum();
  shares(causes, recorded)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    cemetery::{Address, Cemetery},
  };

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn registry() -> Registry {
    let mut r = Registry::new();
    r.add_cemetery(Cemetery::new("01-001", "A", Address::default(), 10))
      .unwrap();
    r.add_cemetery(Cemetery::new("01-002", "B", Address::default(), 10))
      .unwrap();
    let born = date(1900, 1, 1);
    for (id, sex, died, cause, cemetery) in [
      ("1", Sex::Male, 1960, "Cancer", "01-001"),
      ("2", Sex::Female, 1980, "Cancer", "01-001"),
      ("3", Sex::Female, 1950, "Flu", "01-002"),
      ("4", Sex::Male, 1970, "", "01-001"),
    ] {
      r.connect(
        Person::new(id, "N", "S", sex, born).with_death(date(died, 1, 1), cause, cemetery),
      )
      .unwrap();
    }
    r.connect(Person::new("5", "N", "S", Sex::Female, date(2000, 1, 1)))
      .unwrap();
    r
  }

  #[test]
  fn registry_wide_figures() {
    let stats = registry().statistics(date(2020, 1, 1));
    assert_eq!(stats.population, 5);
    assert_eq!(stats.deceased, 4);
    assert_eq!(stats.living, 1);
    assert_eq!(stats.average_age_living, Some(20.0));
    assert_eq!(stats.average_age_at_death, Some(65.0));
    assert_eq!(stats.male_percent, 40.0);
    assert_eq!(stats.female_percent, 60.0);

    assert_eq!(stats.death_causes[0].label, "Cancer");
    assert_eq!(stats.death_causes[0].count, 2);
    assert!((stats.death_causes[0].percent - 200.0 / 3.0).abs() < 1e-9);

    assert_eq!(stats.deaths_per_cemetery[0].label, "01-001");
    assert_eq!(stats.deaths_per_cemetery[0].count, 3);
    assert_eq!(stats.deaths_per_cemetery[1].percent, 25.0);
  }

  #[test]
  fn per_cemetery_figures() {
    let stats = registry().cemetery_statistics("01-001").unwrap();
    assert_eq!(stats.interred, 3);
    assert_eq!(stats.average_age_at_death, Some(70.0));
    assert!((stats.male_percent - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.death_causes.len(), 1);
    assert_eq!(stats.death_causes[0].percent, 100.0);
  }

  #[test]
  fn empty_cemetery_has_no_average() {
    let mut r = registry();
    r.add_cemetery(Cemetery::new("09-009", "Empty", Address::default(), 1))
      .unwrap();
    let stats = r.cemetery_statistics("09-009").unwrap();
    assert_eq!(stats.interred, 0);
    assert_eq!(stats.average_age_at_death, None);
    assert_eq!(stats.male_percent, 0.0);
  }

  #[test]
  fn unknown_cemetery_is_not_found() {
    assert!(matches!(
      registry().cemetery_statistics("nope"),
      Err(Error::CemeteryNotFound(_))
    ));
  }
}

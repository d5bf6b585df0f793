//! Plain-text rendering of query results.

use std::fmt::Write as _;

use cemetree_core::{
  cemetery::{Cemetery, Visit},
  person::Person,
  registry::VisitRecord,
  relatives::Relative,
  stats::{CemeteryStatistics, Share, Statistics},
};
use cemetree_store_csv::{DATE_FORMAT, TIME_FORMAT};
use chrono::NaiveDate;

pub fn person(p: &Person, today: NaiveDate) -> String {
  let mut line = format!(
    "{:<8} {:<28} {:<6} b. {}  age {}",
    p.id,
    p.full_name(),
    p.sex.as_ref(),
    p.birth_date.format(DATE_FORMAT),
    p.age(today),
  );
  if let (Some(date), Some(cemetery)) = (p.death_date(), p.cemetery_id()) {
    let _ = write!(line, "  d. {} in {cemetery}", date.format(DATE_FORMAT));
    if let Some(cause) = p.death_cause().filter(|c| !c.is_empty()) {
      let _ = write!(line, " ({cause})");
    }
  }
  line
}

pub fn cemetery(c: &Cemetery) -> String {
  format!(
    "{:<8} {:<24} {:>6}/{:<6} {}",
    c.id,
    c.name,
    c.occupancy(),
    c.capacity,
    c.address
  )
}

pub fn relative(r: &Relative, name: Option<&str>) -> String {
  format!("{:<8} {:<28} {}", r.person_id, name.unwrap_or("?"), r.label)
}

pub fn visit(v: &Visit) -> String {
  format!("{}  by {}", v.at.format(TIME_FORMAT), v.visitor_id)
}

pub fn visit_record(r: &VisitRecord<'_>) -> String {
  format!(
    "{}  {} in {}",
    r.visit.at.format(TIME_FORMAT),
    r.visited_id,
    r.cemetery_id
  )
}

fn shares(out: &mut String, title: &str, shares: &[Share]) {
  if shares.is_empty() {
    return;
  }
  let _ = writeln!(out, "{title}:");
  for s in shares {
    let _ = writeln!(out, "  {:<28} {:>5}  {:>5.1}%", s.label, s.count, s.percent);
  }
}

fn average(age: Option<f64>) -> String {
  age.map_or_else(|| "-".to_owned(), |a| format!("{a:.1}"))
}

pub fn statistics(s: &Statistics) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "population {}  living {}  deceased {}",
    s.population, s.living, s.deceased
  );
  let _ = writeln!(
    out,
    "average age: living {}, at death {}",
    average(s.average_age_living),
    average(s.average_age_at_death)
  );
  let _ = writeln!(out, "male {:.1}%  female {:.1}%", s.male_percent, s.female_percent);
  shares(&mut out, "death causes", &s.death_causes);
  shares(&mut out, "deaths per cemetery", &s.deaths_per_cemetery);
  out
}

pub fn cemetery_statistics(s: &CemeteryStatistics) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}: {} interred", s.cemetery_id, s.interred);
  let _ = writeln!(out, "average age at death {}", average(s.average_age_at_death));
  let _ = writeln!(out, "male {:.1}%  female {:.1}%", s.male_percent, s.female_percent);
  shares(&mut out, "death causes", &s.death_causes);
  out
}

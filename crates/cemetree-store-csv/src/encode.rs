//! Encoding and decoding between domain types and the text fields of a row.
//!
//! Dates are `dd/mm/yyyy`, visit times `dd/mm/yyyy HH:MM`. Absent values are
//! empty fields. Booleans are written `1`/`0`; on read only `0` is false.
//! Fields containing a comma, quote or line break are double-quoted with
//! inner quotes doubled.

use std::{borrow::Cow, path::Path};

use cemetree_core::{
  cemetery::{Address, Cemetery, Coordinates, Visit},
  person::{Person, Sex},
};
use chrono::{NaiveDate, NaiveDateTime};

use crate::{Error, Result};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

// ─── Scalars ─────────────────────────────────────────────────────────────────

fn invalid(column: &'static str, value: &str) -> Error {
  Error::InvalidField {
    column,
    value: value.to_owned(),
  }
}

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(column: &'static str, s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid(column, s))
}

pub fn encode_time(at: NaiveDateTime) -> String { at.format(TIME_FORMAT).to_string() }

pub fn decode_time(column: &'static str, s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIME_FORMAT).map_err(|_| invalid(column, s))
}

pub fn encode_bool(b: bool) -> &'static str {
  if b { "1" } else { "0" }
}

pub fn decode_bool(s: &str) -> bool { s != "0" }

pub fn decode_opt(s: &str) -> Option<String> {
  (!s.is_empty()).then(|| s.to_owned())
}

fn required(column: &'static str, s: &str) -> Result<String> {
  decode_opt(s).ok_or_else(|| invalid(column, s))
}

fn decode_coordinate(column: &'static str, s: &str) -> Result<f64> {
  s.parse().map_err(|_| invalid(column, s))
}

// ─── Row framing ─────────────────────────────────────────────────────────────

fn quote_field(s: &str) -> Cow<'_, str> {
  if s.contains([',', '"', '\n', '\r']) {
    Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(s)
  }
}

/// Join fields into one line, without the trailing newline.
pub fn join_row<S: AsRef<str>>(fields: &[S]) -> String {
  fields
    .iter()
    .map(|f| quote_field(f.as_ref()))
    .collect::<Vec<_>>()
    .join(",")
}

/// A parsed record and the 1-based line it starts on.
#[derive(Debug, PartialEq, Eq)]
pub struct Record {
  pub line:   usize,
  pub fields: Vec<String>,
}

/// Split the contents of `file` into records. Quoted fields may span lines;
/// blank lines are skipped. Tolerates CRLF line endings.
pub fn split_records(file: &Path, s: &str) -> Result<Vec<Record>> {
  let mut records = Vec::new();
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut line = 1usize;
  let mut start = 1usize;
  let mut chars = s.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push(c);
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' if field.is_empty() => in_quotes = true,
      ',' => fields.push(std::mem::take(&mut field)),
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' => {
        fields.push(std::mem::take(&mut field));
        let row = std::mem::take(&mut fields);
        if !(row.len() == 1 && row[0].is_empty()) {
          records.push(Record { line: start, fields: row });
        }
        line += 1;
        start = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote.at(file.to_owned(), start));
  }
  if !field.is_empty() || !fields.is_empty() {
    fields.push(field);
    records.push(Record { line: start, fields });
  }
  Ok(records)
}

fn expect_columns(fields: &[String], expected: usize) -> Result<()> {
  if fields.len() != expected {
    return Err(Error::ColumnCount {
      expected,
      found: fields.len(),
    });
  }
  Ok(())
}

// ─── Cemetery rows ───────────────────────────────────────────────────────────

pub fn cemetery_row(c: &Cemetery) -> Vec<String> {
  let a = &c.address;
  let (lat, lon) = a
    .coordinates
    .map(|xy| (xy.latitude.to_string(), xy.longitude.to_string()))
    .unwrap_or_default();
  vec![
    c.id.clone(),
    c.name.clone(),
    a.country.clone(),
    a.city.clone(),
    a.district.clone(),
    a.neighbourhood.clone(),
    a.street.clone(),
    lat,
    lon,
  ]
}

pub fn decode_cemetery(fields: &[String], capacity: u32) -> Result<Cemetery> {
  expect_columns(fields, 9)?;
  let coordinates = match (fields[7].as_str(), fields[8].as_str()) {
    ("", "") => None,
    (lat, lon) => Some(Coordinates {
      latitude:  decode_coordinate("latitude", lat)?,
      longitude: decode_coordinate("longitude", lon)?,
    }),
  };
  let address = Address {
    country: fields[2].clone(),
    city: fields[3].clone(),
    district: fields[4].clone(),
    neighbourhood: fields[5].clone(),
    street: fields[6].clone(),
    coordinates,
  };
  Ok(Cemetery::new(
    required("id", &fields[0])?,
    fields[1].clone(),
    address,
    capacity,
  ))
}

// ─── Person rows ─────────────────────────────────────────────────────────────

pub fn person_row(p: &Person) -> Vec<String> {
  let opt = |s: Option<&str>| s.unwrap_or_default().to_owned();
  vec![
    p.id.clone(),
    p.name.clone(),
    p.surname.clone(),
    p.sex.to_string(),
    encode_bool(p.admin).to_owned(),
    encode_bool(p.is_dead()).to_owned(),
    opt(p.death_cause()),
    opt(p.cemetery_id()),
    encode_date(p.birth_date),
    p.death_date().map(encode_date).unwrap_or_default(),
    opt(p.mother_id.as_deref()),
    opt(p.father_id.as_deref()),
    opt(p.spouse_id.as_deref()),
  ]
}

/// Decode a people row. Twelve columns (no `spouseId`) is accepted as a
/// row without a spouse. Death columns are ignored for the living.
pub fn decode_person(fields: &[String]) -> Result<Person> {
  if fields.len() != 12 {
    expect_columns(fields, 13)?;
  }

  let sex: Sex = fields[3].parse().map_err(|_| invalid("sex", &fields[3]))?;
  let mut person = Person::new(
    required("id", &fields[0])?,
    fields[1].clone(),
    fields[2].clone(),
    sex,
    decode_date("birthDate", &fields[8])?,
  );
  person.admin = decode_bool(&fields[4]);

  if decode_bool(&fields[5]) {
    person = person.with_death(
      decode_date("deathDate", &fields[9])?,
      fields[6].clone(),
      required("cemeteryId", &fields[7])?,
    );
  }

  person.mother_id = decode_opt(&fields[10]);
  person.father_id = decode_opt(&fields[11]);
  person.spouse_id = fields.get(12).and_then(|s| decode_opt(s));
  Ok(person)
}

// ─── Visit rows ──────────────────────────────────────────────────────────────

pub fn visit_row(cemetery_id: &str, visited_id: &str, visit: &Visit) -> Vec<String> {
  vec![
    cemetery_id.to_owned(),
    visited_id.to_owned(),
    visit.visitor_id.clone(),
    encode_time(visit.at),
  ]
}

/// A visit row with its identifiers still unresolved.
pub struct RawVisit {
  pub cemetery_id: String,
  pub visited_id:  String,
  pub visitor_id:  String,
  pub at:          NaiveDateTime,
}

pub fn decode_visit(fields: &[String]) -> Result<RawVisit> {
  expect_columns(fields, 4)?;
  Ok(RawVisit {
    cemetery_id: fields[0].clone(),
    visited_id:  fields[1].clone(),
    visitor_id:  fields[2].clone(),
    at:          decode_time("time", &fields[3])?,
  })
}

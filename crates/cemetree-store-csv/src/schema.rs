//! File names and header rows of the flat-file layout.
//!
//! Column order is fixed. People rows written before spouses were tracked
//! lack the final `spouseId` column; those are still accepted on load.

/// One of the three files making up a saved registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
  Cemeteries,
  People,
  Visits,
}

impl DataFile {
  pub const ALL: [Self; 3] = [Self::Cemeteries, Self::People, Self::Visits];

  pub fn file_name(self) -> &'static str {
    match self {
      Self::Cemeteries => "cemeteries.csv",
      Self::People => "people.csv",
      Self::Visits => "visits.csv",
    }
  }

  pub fn header(self) -> &'static [&'static str] {
    match self {
      Self::Cemeteries => CEMETERY_COLUMNS,
      Self::People => PERSON_COLUMNS,
      Self::Visits => VISIT_COLUMNS,
    }
  }

  /// Whether `found` is an acceptable header row for this file.
  pub fn accepts_header(self, found: &[String]) -> bool {
    let expected = self.header();
    let matches = |columns: &[&str]| {
      columns.len() == found.len()
        && columns.iter().zip(found).all(|(a, b)| a.eq_ignore_ascii_case(b.trim()))
    };
    matches(expected)
      || (self == Self::People && matches(&expected[..expected.len() - 1]))
  }
}

pub const CEMETERY_COLUMNS: &[&str] = &[
  "id",
  "name",
  "country",
  "city",
  "district",
  "neighbourhood",
  "street",
  "latitude",
  "longitude",
];

pub const PERSON_COLUMNS: &[&str] = &[
  "id",
  "name",
  "surname",
  "sex",
  "admin",
  "dead",
  "deathCause",
  "cemeteryId",
  "birthDate",
  "deathDate",
  "motherId",
  "fatherId",
  "spouseId",
];

pub const VISIT_COLUMNS: &[&str] = &["cemeteryId", "visitedId", "visitorId", "time"];

#[cfg(test)]
mod tests {
  use super::*;

  fn row(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|s| (*s).to_owned()).collect()
  }

  #[test]
  fn people_header_without_spouse_is_accepted() {
    let old = row(&PERSON_COLUMNS[..12]);
    assert!(DataFile::People.accepts_header(&old));
    assert!(DataFile::People.accepts_header(&row(PERSON_COLUMNS)));
    assert!(!DataFile::People.accepts_header(&row(&PERSON_COLUMNS[..11])));
  }

  #[test]
  fn other_headers_must_be_complete() {
    assert!(!DataFile::Visits.accepts_header(&row(&VISIT_COLUMNS[..3])));
    assert!(DataFile::Cemeteries.accepts_header(&row(CEMETERY_COLUMNS)));
  }
}

//! [`CsvStore`]: the flat-file implementation of [`RegistryStore`].

use std::{
  ffi::OsString,
  fs,
  io::Write as _,
  path::{Path, PathBuf},
};

use cemetree_core::{
  Registry, cemetery::DEFAULT_CAPACITY, person::Person, store::RegistryStore,
};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  encode::{
    Record, cemetery_row, decode_cemetery, decode_person, decode_visit, join_row,
    person_row, split_records, visit_row,
  },
  schema::DataFile,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry kept as three CSV files sharing a path prefix.
///
/// With prefix `data/` the files are `data/cemeteries.csv`, `data/people.csv`
/// and `data/visits.csv`. The prefix is prepended verbatim, so `backup-`
/// yields `backup-people.csv` next to the working directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
  prefix:           PathBuf,
  default_capacity: u32,
}

impl CsvStore {
  pub fn new(prefix: impl Into<PathBuf>) -> Self {
    Self {
      prefix:           prefix.into(),
      default_capacity: DEFAULT_CAPACITY,
    }
  }

  /// Capacity given to every loaded cemetery, since the files carry none.
  pub fn with_default_capacity(mut self, capacity: u32) -> Self {
    self.default_capacity = capacity;
    self
  }

  pub fn default_capacity(&self) -> u32 { self.default_capacity }

  pub fn path(&self, file: DataFile) -> PathBuf {
    let mut path = OsString::from(self.prefix.as_os_str());
    path.push(file.file_name());
    PathBuf::from(path)
  }

  /// Read a file and split it into data records, checking the header.
  fn read(&self, file: DataFile) -> Result<(PathBuf, Vec<Record>)> {
    let path = self.path(file);
    let text = fs::read_to_string(&path)?;
    let mut records = split_records(&path, &text)?.into_iter();

    let header = records.next().map(|r| r.fields).unwrap_or_default();
    if !file.accepts_header(&header) {
      return Err(Error::Header {
        file:  path,
        found: header.join(","),
      });
    }
    Ok((path, records.collect()))
  }

  fn load_cemeteries(&self, registry: &mut Registry) -> Result<()> {
    let (path, records) = self.read(DataFile::Cemeteries)?;
    for Record { line, fields } in records {
      let cemetery = decode_cemetery(&fields, self.default_capacity)
        .map_err(|e| e.at(path.clone(), line))?;
      if let Some(previous) = registry.put_cemetery(cemetery) {
        warn!(cemetery = %previous.id, line, "duplicate cemetery row replaces earlier one");
      }
    }
    Ok(())
  }

  /// People are stored first and wired afterwards, so rows may refer to
  /// relatives that appear later in the file.
  fn load_people(&self, registry: &mut Registry) -> Result<()> {
    let (path, records) = self.read(DataFile::People)?;
    let mut ids = Vec::with_capacity(records.len());

    for Record { line, fields } in records {
      let person = decode_person(&fields).map_err(|e| e.at(path.clone(), line))?;
      if let Some(cemetery) = person.cemetery_id()
        && !registry.contains_cemetery(cemetery)
      {
        return Err(
          Error::DanglingCemetery {
            person:   person.id.clone(),
            cemetery: cemetery.to_owned(),
          }
          .at(path, line),
        );
      }
      let id = person.id.clone();
      if registry.put_person(person).is_some() {
        warn!(person = %id, line, "duplicate person row replaces earlier one");
      } else {
        ids.push((line, id));
      }
    }

    let mut over = 0usize;
    for (line, id) in ids {
      let admission = registry
        .connect_stored(&id)
        .map_err(|e| Error::from(e).at(path.clone(), line))?;
      if admission.is_over_capacity() {
        over += 1;
      }
    }
    if over > 0 {
      warn!(count = over, "people admitted beyond cemetery capacity");
    }
    Ok(())
  }

  /// Visits that no longer resolve are dropped rather than failing the load.
  fn load_visits(&self, registry: &mut Registry) -> Result<()> {
    let (path, records) = self.read(DataFile::Visits)?;
    let mut skipped = 0usize;

    for Record { line, fields } in records {
      let visit = decode_visit(&fields).map_err(|e| e.at(path.clone(), line))?;
      if let Err(e) = registry.record_visit(
        &visit.cemetery_id,
        &visit.visited_id,
        &visit.visitor_id,
        visit.at,
      ) {
        debug!(line, error = %e, "skipping visit");
        skipped += 1;
      }
    }
    if skipped > 0 {
      warn!(count = skipped, file = %path.display(), "skipped unresolvable visits");
    }
    Ok(())
  }
}

impl RegistryStore for CsvStore {
  type Error = Error;

  fn load(&self) -> Result<Registry> {
    for file in DataFile::ALL {
      let path = self.path(file);
      if !path.is_file() {
        return Err(Error::MissingFile(path));
      }
    }

    let mut registry = Registry::new();
    self.load_cemeteries(&mut registry)?;
    self.load_people(&mut registry)?;
    self.load_visits(&mut registry)?;

    info!(
      cemeteries = registry.cemetery_count(),
      people = registry.people_count(),
      prefix = %self.prefix.display(),
      "registry loaded"
    );
    Ok(registry)
  }

  fn save(&self, registry: &Registry) -> Result<()> {
    let cemeteries = registry.cemeteries().map(cemetery_row);

    let mut people: Vec<&Person> = registry.people().collect();
    people.sort_by(|a, b| a.birth_date.cmp(&b.birth_date).then_with(|| a.id.cmp(&b.id)));
    let people = people.into_iter().map(person_row);

    let visits = registry.cemeteries().flat_map(|c| {
      c.all_visits()
        .map(move |(visited_id, visit)| visit_row(&c.id, visited_id, visit))
    });

    write_atomic(&self.path(DataFile::Cemeteries), DataFile::Cemeteries, cemeteries)?;
    write_atomic(&self.path(DataFile::People), DataFile::People, people)?;
    write_atomic(&self.path(DataFile::Visits), DataFile::Visits, visits)?;

    info!(
      cemeteries = registry.cemetery_count(),
      people = registry.people_count(),
      prefix = %self.prefix.display(),
      "registry saved"
    );
    Ok(())
  }
}

// ─── Writing ─────────────────────────────────────────────────────────────────

/// Write the header and `rows` to a sibling temporary file, then rename it
/// over `path`.
fn write_atomic(
  path: &Path,
  file: DataFile,
  rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)?;
  }

  let mut tmp = OsString::from(path.as_os_str());
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);

  let written = write_rows(&tmp, file, rows).and_then(|()| fs::rename(&tmp, path));
  if let Err(e) = written {
    let _ = fs::remove_file(&tmp);
    return Err(e.into());
  }
  debug!(file = %path.display(), "wrote data file");
  Ok(())
}

fn write_rows(
  tmp: &Path,
  file: DataFile,
  rows: impl Iterator<Item = Vec<String>>,
) -> std::io::Result<()> {
  let mut out = std::io::BufWriter::new(fs::File::create(tmp)?);
  writeln!(out, "{}", join_row(file.header()))?;
  for row in rows {
    writeln!(out, "{}", join_row(&row))?;
  }
  out.into_inner().map_err(|e| e.into_error())?.sync_all()
}

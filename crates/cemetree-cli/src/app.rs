//! Command dispatch: load the registry, run one operation, print the result,
//! and save when the operation changed anything.

use anyhow::{Context as _, Result, bail};
use cemetree_core::{
  Registry,
  cemetery::{Address, Cemetery, Coordinates},
  lifecycle::PersonEdit,
  person::{Person, Sex},
  query::{
    CemeteryFilter, CemeterySort, DateField, PersonFilter, PersonSort,
    narrow_by_date, sort_cemeteries, sort_people,
  },
  registry::CemeteryEdit,
  store::RegistryStore,
};
use cemetree_store_csv::CsvStore;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::report;

// ─── Commands ─────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create empty data files if none exist yet.
  Init,
  /// Search people. Only the deceased unless `--living` is given.
  People(PeopleArgs),
  /// Search cemeteries.
  Cemeteries(CemeteryArgs),
  /// List cemeteries holding more people than their capacity.
  OverCapacity,
  /// Ancestors and descendants of a person.
  Relatives {
    id:          String,
    #[arg(short, long, default_value_t = 1)]
    generations: u32,
  },
  /// Visits to one grave, most recent first.
  Visits { cemetery: String, person: String },
  /// Every visit a person has made, most recent first.
  VisitedBy { visitor: String },
  /// Record a visit to a grave.
  Visit {
    cemetery: String,
    person:   String,
    #[arg(long)]
    visitor:  String,
    /// `dd/mm/yyyy HH:MM`; defaults to now.
    #[arg(long, value_parser = parse_time)]
    at:       Option<NaiveDateTime>,
  },
  /// Registry-wide statistics, or those of one cemetery.
  Stats {
    #[arg(long)]
    cemetery: Option<String>,
  },
  AddCemetery(AddCemeteryArgs),
  EditCemetery(EditCemeteryArgs),
  RemoveCemetery { id: String },
  AddPerson(AddPersonArgs),
  EditPerson(EditPersonArgs),
  RemovePerson { id: String },
  /// Mark a living person as dead and inter them.
  Bury {
    id:       String,
    #[arg(long, value_parser = parse_date)]
    date:     NaiveDate,
    #[arg(long)]
    cemetery: String,
    #[arg(long, default_value = "")]
    cause:    String,
  },
  /// Clear a death record.
  Revive { id: String },
}

#[derive(Args, Debug, Default)]
pub struct PeopleArgs {
  #[arg(long)]
  pub id:          Option<String>,
  #[arg(long)]
  pub name:        Option<String>,
  #[arg(long)]
  pub surname:     Option<String>,
  #[arg(long)]
  pub sex:         Option<Sex>,
  #[arg(long)]
  pub cause:       Option<String>,
  #[arg(long)]
  pub cemetery:    Option<String>,
  #[arg(long)]
  pub mother:      Option<String>,
  #[arg(long)]
  pub father:      Option<String>,
  #[arg(long)]
  pub spouse:      Option<String>,
  /// Include living people. Requires admin.
  #[arg(long)]
  pub living:      bool,
  #[arg(long, value_parser = parse_date)]
  pub born_from:   Option<NaiveDate>,
  #[arg(long, value_parser = parse_date)]
  pub born_to:     Option<NaiveDate>,
  #[arg(long, value_parser = parse_date)]
  pub died_from:   Option<NaiveDate>,
  #[arg(long, value_parser = parse_date)]
  pub died_to:     Option<NaiveDate>,
  /// id, name, surname, birth, death or age.
  #[arg(long, default_value = "id")]
  pub sort:        String,
}

#[derive(Args, Debug, Default)]
pub struct CemeteryArgs {
  #[arg(long)]
  pub id:            Option<String>,
  #[arg(long)]
  pub name:          Option<String>,
  #[arg(long)]
  pub country:       Option<String>,
  #[arg(long)]
  pub city:          Option<String>,
  #[arg(long)]
  pub district:      Option<String>,
  #[arg(long)]
  pub neighbourhood: Option<String>,
  #[arg(long)]
  pub street:        Option<String>,
  /// id, name, address or ratio.
  #[arg(long, default_value = "id")]
  pub sort:          String,
}

#[derive(Args, Debug)]
pub struct AddCemeteryArgs {
  pub id:            String,
  pub name:          String,
  #[arg(long, default_value = "")]
  pub country:       String,
  #[arg(long, default_value = "")]
  pub city:          String,
  #[arg(long, default_value = "")]
  pub district:      String,
  #[arg(long, default_value = "")]
  pub neighbourhood: String,
  #[arg(long, default_value = "")]
  pub street:        String,
  #[arg(long, requires = "longitude")]
  pub latitude:      Option<f64>,
  #[arg(long, requires = "latitude")]
  pub longitude:     Option<f64>,
}

/// Blank values keep the current field.
#[derive(Args, Debug)]
pub struct EditCemeteryArgs {
  pub id:            String,
  #[arg(long)]
  pub name:          Option<String>,
  #[arg(long)]
  pub country:       Option<String>,
  #[arg(long)]
  pub city:          Option<String>,
  #[arg(long)]
  pub district:      Option<String>,
  #[arg(long)]
  pub neighbourhood: Option<String>,
  #[arg(long)]
  pub street:        Option<String>,
}

#[derive(Args, Debug)]
pub struct AddPersonArgs {
  pub id:      String,
  pub name:    String,
  pub surname: String,
  #[arg(long)]
  pub sex:     Sex,
  #[arg(long, value_parser = parse_date)]
  pub born:    NaiveDate,
  #[arg(long)]
  pub mother:  Option<String>,
  #[arg(long)]
  pub father:  Option<String>,
  #[arg(long)]
  pub spouse:  Option<String>,
  #[arg(long)]
  pub admin:   bool,
}

/// An empty relative id clears that relationship.
#[derive(Args, Debug)]
pub struct EditPersonArgs {
  pub id:      String,
  #[arg(long)]
  pub name:    Option<String>,
  #[arg(long)]
  pub surname: Option<String>,
  #[arg(long)]
  pub sex:     Option<Sex>,
  #[arg(long, value_parser = parse_date)]
  pub born:    Option<NaiveDate>,
  #[arg(long)]
  pub cause:   Option<String>,
  #[arg(long)]
  pub mother:  Option<String>,
  #[arg(long)]
  pub father:  Option<String>,
  #[arg(long)]
  pub spouse:  Option<String>,
  #[arg(long)]
  pub admin:   Option<bool>,
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
  NaiveDate::parse_from_str(s, cemetree_store_csv::DATE_FORMAT)
    .map_err(|e| format!("expected dd/mm/yyyy: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveDateTime, String> {
  NaiveDateTime::parse_from_str(s, cemetree_store_csv::TIME_FORMAT)
    .map_err(|e| format!("expected dd/mm/yyyy HH:MM: {e}"))
}

fn relative_edit(value: Option<String>) -> Option<Option<String>> {
  value.map(|id| (!id.is_empty()).then_some(id))
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  pub store:            CsvStore,
  pub registry:         Registry,
  pub today:            NaiveDate,
  pub admin:            bool,
  pub json:             bool,
}

impl App {
  /// Load the registry behind `store`. With `create`, missing data files
  /// yield an empty registry instead of an error.
  pub fn open(
    store: CsvStore,
    create: bool,
    today: NaiveDate,
    admin: bool,
    json: bool,
  ) -> Result<Self> {
    let registry = match store.load() {
      Err(cemetree_store_csv::Error::MissingFile(path)) if create => {
        tracing::info!(missing = %path.display(), "starting an empty registry");
        Registry::new()
      }
      loaded => loaded.context("failed to load registry")?,
    };
    Ok(Self {
      store,
      registry,
      today,
      admin,
      json,
    })
  }

  /// Run `command`, writing its output to `out`. Saves afterwards if the
  /// command changed the registry.
  pub fn run(&mut self, command: Command, out: &mut String) -> Result<()> {
    if self.execute(command, out)? {
      self
        .store
        .save(&self.registry)
        .context("failed to save registry")?;
    }
    Ok(())
  }

  fn require_admin(&self, action: &str) -> Result<()> {
    if !self.admin {
      bail!("{action} requires admin rights");
    }
    Ok(())
  }

  fn emit<T: Serialize + ?Sized>(
    &self,
    out: &mut String,
    value: &T,
    text: impl FnOnce() -> String,
  ) -> Result<()> {
    let rendered = if self.json {
      serde_json::to_string_pretty(value).context("failed to serialise output")?
    } else {
      text()
    };
    out.push_str(rendered.trim_end());
    out.push('\n');
    Ok(())
  }

  fn lines<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    items.iter().map(render).collect::<Vec<_>>().join("\n")
  }

  /// Returns whether the registry was modified.
  fn execute(&mut self, command: Command, out: &mut String) -> Result<bool> {
    let today = self.today;
    match command {
      Command::Init => Ok(true),
      Command::People(args) => {
        if args.living {
          self.require_admin("searching the living")?;
        }
        self.people(args, out)?;
        Ok(false)
      }
      Command::Cemeteries(args) => {
        let filter = CemeteryFilter {
          id:            args.id,
          name:          args.name,
          country:       args.country,
          city:          args.city,
          district:      args.district,
          neighbourhood: args.neighbourhood,
          street:        args.street,
        };
        let mut found = self.registry.filter_cemeteries(&filter);
        sort_cemeteries(&mut found, CemeterySort::from_key(&args.sort));
        self.emit(out, &found, || Self::lines(&found, |c| report::cemetery(c)))?;
        Ok(false)
      }
      Command::OverCapacity => {
        let found: Vec<&Cemetery> = self.registry.over_capacity().collect();
        self.emit(out, &found, || Self::lines(&found, |c| report::cemetery(c)))?;
        Ok(false)
      }
      Command::Relatives { id, generations } => {
        let found = self.registry.relatives(generations, &id)?;
        self.emit(out, &found, || {
          Self::lines(&found, |r| {
            let name = self.registry.person(&r.person_id).map(Person::full_name);
            report::relative(r, name.as_deref())
          })
        })?;
        Ok(false)
      }
      Command::Visits { cemetery, person } => {
        let found = self.registry.visits_of(&cemetery, &person)?;
        self.emit(out, &found, || Self::lines(&found, |v| report::visit(v)))?;
        Ok(false)
      }
      Command::VisitedBy { visitor } => {
        let found = self.registry.visits_by(&visitor)?;
        self.emit(out, &found, || Self::lines(&found, report::visit_record))?;
        Ok(false)
      }
      Command::Visit {
        cemetery,
        person,
        visitor,
        at,
      } => {
        let at = at.unwrap_or_else(|| chrono::Local::now().naive_local());
        let added = self.registry.record_visit(&cemetery, &person, &visitor, at)?;
        if !added {
          tracing::info!(%cemetery, %person, %visitor, "visit already recorded");
        }
        Ok(added)
      }
      Command::Stats { cemetery: None } => {
        let stats = self.registry.statistics(today);
        self.emit(out, &stats, || report::statistics(&stats))?;
        Ok(false)
      }
      Command::Stats { cemetery: Some(id) } => {
        let stats = self.registry.cemetery_statistics(&id)?;
        self.emit(out, &stats, || report::cemetery_statistics(&stats))?;
        Ok(false)
      }
      Command::AddCemetery(args) => {
        self.require_admin("adding a cemetery")?;
        let coordinates = args
          .latitude
          .zip(args.longitude)
          .map(|(latitude, longitude)| Coordinates { latitude, longitude });
        let address = Address {
          country: args.country,
          city: args.city,
          district: args.district,
          neighbourhood: args.neighbourhood,
          street: args.street,
          coordinates,
        };
        // Capacity is not persisted; every load applies the store default.
        let capacity = self.store.default_capacity();
        let cemetery = Cemetery::new(args.id, args.name, address, capacity);
        self.registry.add_cemetery(cemetery)?;
        Ok(true)
      }
      Command::EditCemetery(args) => {
        self.require_admin("editing a cemetery")?;
        let edit = CemeteryEdit {
          name:          args.name,
          country:       args.country,
          city:          args.city,
          district:      args.district,
          neighbourhood: args.neighbourhood,
          street:        args.street,
        };
        self.registry.edit_cemetery(&args.id, edit)?;
        Ok(true)
      }
      Command::RemoveCemetery { id } => {
        self.require_admin("removing a cemetery")?;
        self.registry.remove_cemetery(&id)?;
        Ok(true)
      }
      Command::AddPerson(args) => {
        self.require_admin("adding a person")?;
        let mut person = Person::new(args.id, args.name, args.surname, args.sex, args.born);
        person.mother_id = args.mother;
        person.father_id = args.father;
        person.spouse_id = args.spouse;
        person.admin = args.admin;
        self.registry.add_person(person, today)?;
        Ok(true)
      }
      Command::EditPerson(args) => {
        self.require_admin("editing a person")?;
        let edit = PersonEdit {
          name:        args.name,
          surname:     args.surname,
          sex:         args.sex,
          admin:       args.admin,
          birth_date:  args.born,
          death_cause: args.cause,
          mother_id:   relative_edit(args.mother),
          father_id:   relative_edit(args.father),
          spouse_id:   relative_edit(args.spouse),
        };
        self.registry.edit_person(&args.id, edit, today)?;
        Ok(true)
      }
      Command::RemovePerson { id } => {
        self.require_admin("removing a person")?;
        self.registry.remove_person(&id)?;
        Ok(true)
      }
      Command::Bury {
        id,
        date,
        cemetery,
        cause,
      } => {
        self.require_admin("recording a death")?;
        self.registry.mark_dead(&id, date, cause, &cemetery, today)?;
        Ok(true)
      }
      Command::Revive { id } => {
        self.require_admin("clearing a death record")?;
        self.registry.mark_alive(&id)?;
        Ok(true)
      }
    }
  }

  fn people(&self, args: PeopleArgs, out: &mut String) -> Result<()> {
    let filter = PersonFilter {
      id: args.id,
      name: args.name,
      surname: args.surname,
      sex: args.sex,
      death_cause: args.cause,
      cemetery_id: args.cemetery,
      mother_id: args.mother,
      father_id: args.father,
      spouse_id: args.spouse,
      ..Default::default()
    };
    let mut found = self.registry.filter_people(&filter, args.living);
    if args.born_from.is_some() || args.born_to.is_some() {
      found = narrow_by_date(found, DateField::Birth, args.born_from, args.born_to);
    }
    if args.died_from.is_some() || args.died_to.is_some() {
      found = narrow_by_date(found, DateField::Death, args.died_from, args.died_to);
    }
    sort_people(&mut found, PersonSort::from_key(&args.sort), self.today);

    self.emit(out, &found, || {
      Self::lines(&found, |p| report::person(p, self.today))
    })
  }
}

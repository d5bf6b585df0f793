//! `cemetree` — command-line access to a cemetery and family registry.
//!
//! # Usage
//!
//! ```
//! cemetree init
//! cemetree people --surname Kaya --sort birth
//! cemetree --admin people --living --born-from 01/01/1950
//! cemetree relatives 42 --generations 3
//! cemetree --admin bury 42 --date 03/06/2024 --cemetery 35-001 --cause "Old age"
//! cemetree --config ~/cemetree.toml --json stats
//! ```
//!
//! Settings come from the TOML file named by `--config` (default
//! `cemetree.toml`, optional) and `CEMETREE_*` environment variables;
//! command-line flags win over both.

mod app;
mod report;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use app::{App, Command};
use cemetree_store_csv::CsvStore;
use chrono::NaiveDate;
use clap::Parser;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cemetree", version, about = "Cemetery and family registry")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cemetree.toml")]
  config: PathBuf,

  /// Path prefix of the data files (overrides `data_prefix`).
  #[arg(long, value_name = "PREFIX")]
  data: Option<PathBuf>,

  /// Act with admin rights.
  #[arg(long)]
  admin: bool,

  /// Print results as JSON.
  #[arg(long)]
  json: bool,

  /// Reference date for ages and death-date checks (dd/mm/yyyy).
  #[arg(long, value_parser = app::parse_date)]
  today: Option<NaiveDate>,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let prefix = cli.data.unwrap_or(settings.data_prefix);
  let store = CsvStore::new(prefix).with_default_capacity(settings.default_capacity);
  let today = cli
    .today
    .unwrap_or_else(|| chrono::Local::now().date_naive());
  let create = matches!(cli.command, Command::Init);

  let mut app = App::open(
    store,
    create,
    today,
    cli.admin || settings.admin,
    cli.json,
  )?;

  let mut out = String::new();
  app.run(cli.command, &mut out)?;
  print!("{out}");
  Ok(())
}

//! Versioned store bootstrap from a configuration file.
//!
//! Writes a YAML configuration, opens the store three times and shows the
//! action taken each time: creation, a plain reopen, and a version change.
//! A version change drops and recreates every table, so the rows inserted
//! before it are gone afterwards.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p lightrow-demos --example bootstrap
//! ```

use lightrow_core::{ID_COLUMN, Record, RecordDef, field};
use lightrow_sqlite::{Bootstrap, Result, StoreConfig, TableSet};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Note {
    id: Option<i64>,
    text: String,
    pinned: bool,
}

impl Record for Note {
    fn define() -> RecordDef<Self> {
        RecordDef::new()
            .table("notes")
            .field(field!(Note, id).column(ID_COLUMN))
            .field(field!(Note, text))
            .field(field!(Note, pinned).index())
    }

    fn blank() -> Self {
        Self::default()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("store.yml");
    StoreConfig::new(dir.path().join("notes.db"), 1).save(&config_path)?;
    println!("Config:\n{}", std::fs::read_to_string(&config_path)?);

    let tables = TableSet::new().with::<Note>()?;

    // First open creates the tables
    let config = StoreConfig::load(&config_path)?;
    let (store, report) = Bootstrap::open(&config, &tables)?;
    println!("open #1: {:?} {:?}", report.action, report.tables);
    store.insert_record(&mut Note {
        id: None,
        text: "buy milk".into(),
        pinned: true,
    })?;
    drop(store);

    // Same version: data is kept
    let (store, report) = Bootstrap::open(&config, &tables)?;
    println!(
        "open #2: {:?}, {} note(s)",
        report.action,
        store.select::<Note>()?.count()?
    );
    drop(store);

    // New version: every table is recreated empty
    let mut config = config;
    config.version = 2;
    config.save(&config_path)?;
    let (store, report) = Bootstrap::open(&StoreConfig::load(&config_path)?, &tables)?;
    println!(
        "open #3: {:?}, {} note(s)",
        report.action,
        store.select::<Note>()?.count()?
    );

    Ok(())
}

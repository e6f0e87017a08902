use clap::Parser;
use posliq_sqlite::{Db, config::SqliteConfig};
use std::path::PathBuf;

mod io;
pub use io::*;

mod commands;
pub use commands::*;

// The top-level arguments: which database to operate on, and which
// subcommand to execute.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    /// The database file (created on first use)
    #[arg(short, long, default_value = "posliq.db")]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub fn evaluate(self) -> anyhow::Result<()> {
        let db = Db::open(&SqliteConfig {
            database_path: Some(self.database),
            ..SqliteConfig::default()
        })?;
        self.command.run(&db)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("no store with idpos {0:?}")]
    UnknownStore(String),
    #[error("no active movement {0}")]
    UnknownMovement(String),
}

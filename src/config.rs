//! Runtime configuration shared by every subcommand.

use anyhow::Result;
use std::path::PathBuf;

use crate::db::Database;
use crate::reconcile::ValidationPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub validation: ValidationPolicy,
}

impl Config {
    /// Build from command-line values, defaulting the database path to the
    /// user's config directory.
    pub fn load(db_path: Option<PathBuf>, validation: ValidationPolicy) -> Result<Self> {
        let db_path = match db_path {
            Some(path) => path,
            None => Database::default_path()?,
        };
        Ok(Self {
            db_path,
            validation,
        })
    }

    pub fn open_database(&self) -> Result<Database> {
        Database::open_at(&self.db_path)
    }
}

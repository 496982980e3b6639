//! Init command for creating the database.

use anyhow::{Context, Result};

use pc_db::Database;

use crate::Config;

/// Runs the init command.
pub fn run(config: &Config) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path).context("failed to open database")?;

    println!("Database ready at {}", config.database_path.display());
    Ok(())
}

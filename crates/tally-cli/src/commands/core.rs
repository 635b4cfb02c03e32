//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `load_config` - Shared setup for every command
//! - `parse_account` / `parse_date_arg` - Argument parsing helpers
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::{config::Config, db::Database, models::AccountType};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

pub fn parse_account(value: &str) -> Result<AccountType> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

pub fn cmd_init(db_path: &Path, config: &Config) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    let keywords = db
        .seed_rules(&config.rules)
        .context("Failed to seed categorization rules")?;
    if keywords > 0 {
        println!(
            "   Seeded {} categories with {} keywords",
            config.rules.len(),
            keywords
        );
    } else {
        println!("   Rule store already populated, leaving it untouched");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import a statement: tally import --file statement.csv --account perso");
    println!("  2. Review leftovers:   tally transactions list --uncategorized");

    Ok(())
}

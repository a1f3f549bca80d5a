//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `Session` - The service, acting user and output mode for one invocation
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database and provision the user

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tally_core::{Config, Database, Envelope, Service};

/// Everything a command needs
pub struct Session {
    pub service: Service<Database>,
    pub user_id: String,
    /// Print raw envelopes instead of formatted output
    pub json: bool,
}

impl Session {
    pub fn new(service: Service<Database>, user_id: impl Into<String>, json: bool) -> Self {
        Self {
            service,
            user_id: user_id.into(),
            json,
        }
    }

    /// Open the configured database
    pub fn open(config: &Config, json: bool) -> Result<Self> {
        let db = open_db(&config.database_path)?;
        Ok(Self::new(
            Service::with_import_config(db, config.import.clone()),
            config.user_id.clone(),
            json,
        ))
    }

    pub fn user(&self) -> &str {
        &self.user_id
    }

    /// Print an envelope in JSON mode and hand back the payload to format
    /// otherwise. A failure envelope becomes an error.
    pub fn emit<T: Serialize>(&self, envelope: Envelope<T>) -> Result<Option<T>> {
        self.check(&envelope)?;
        Ok(if self.json { None } else { envelope.into_data() })
    }

    /// The payload, whatever the output mode
    pub fn expect_data<T: Serialize>(&self, envelope: Envelope<T>) -> Result<T> {
        self.check(&envelope)?;
        envelope
            .into_data()
            .ok_or_else(|| anyhow!("response carried no data"))
    }

    fn check<T: Serialize>(&self, envelope: &Envelope<T>) -> Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(envelope).context("Failed to encode response")?
            );
        }
        if envelope.is_success() {
            return Ok(());
        }
        Err(anyhow!(
            "{} (status {})",
            envelope.message().unwrap_or("request failed"),
            envelope.status_code
        ))
    }
}

/// Open (creating if needed) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(config: &Config, session: &Session) -> Result<()> {
    if !session.json {
        println!("🔧 Initializing database at {}...", config.database_path.display());
    }

    if !config.seed_new_users {
        if !session.json {
            println!("   Skipped default data (seed_new_users = false)");
        }
        return Ok(());
    }

    let Some(summary) = session.emit(session.service.provision_user(session.user()))? else {
        return Ok(());
    };
    if summary.total() == 0 {
        println!("   Default data already present for '{}'", session.user());
    } else {
        println!(
            "   Seeded {} categories, {} subcategories, {} merchants, {} mappings",
            summary.categories, summary.subcategories, summary.merchants, summary.mappings
        );
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. See the stock mappings: tally mappings");
    println!("  2. Import transactions: tally import --file statement.csv --mapping <name>");
    println!("  3. Review unmatched descriptions: tally unassigned");

    Ok(())
}

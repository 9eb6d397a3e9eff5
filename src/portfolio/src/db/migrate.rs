//! Embedded schema migrations for the local ledger.

use anyhow::anyhow;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::db::connection::connect_sqlite;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Brings the ledger at `database_url` up to date.
pub fn run_sqlite(database_url: &str) -> anyhow::Result<()> {
    let mut conn = connect_sqlite(database_url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;
    Ok(())
}

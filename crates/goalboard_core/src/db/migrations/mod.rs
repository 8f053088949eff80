//! Schema migrations for the local goal service.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - Pending migrations apply in one transaction; a failure leaves the
//!   previous version in place.

use crate::db::{StoreError, StoreResult};
use log::info;
use rusqlite::{Connection, Transaction};

struct GoalMigration {
    version: u32,
    sql: &'static str,
}

const GOAL_MIGRATIONS: &[GoalMigration] = &[GoalMigration {
    version: 1,
    sql: include_str!("0001_goals.sql"),
}];

/// Returns the newest schema version this build can write.
pub fn latest_version() -> u32 {
    GOAL_MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the goal store up to `latest_version()`.
///
/// # Errors
/// - `SchemaTooNew` when the store is ahead of this build.
/// - `Migration` naming the first script that failed.
pub fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(StoreError::SchemaTooNew { found, supported });
    }

    let pending = GOAL_MIGRATIONS
        .iter()
        .filter(|migration| migration.version > found)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        run_migration(&tx, migration).map_err(|source| StoreError::Migration {
            version: migration.version,
            source,
        })?;
        info!(
            "event=db_migrate module=db status=ok version={} from={}",
            migration.version, found
        );
    }
    tx.commit()?;
    Ok(())
}

fn run_migration(tx: &Transaction<'_>, migration: &GoalMigration) -> rusqlite::Result<()> {
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)
}

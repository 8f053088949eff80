//! SQLite bootstrap for the in-process goal service.
//!
//! # Responsibility
//! - Open SQLite connections backing `SqliteGoalRemote`.
//! - Apply schema migrations before any goal row is touched.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A store written by a newer binary is never opened.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while opening or migrating the goal store.
#[derive(Debug)]
pub enum StoreError {
    /// Connection, pragma or transaction failure.
    Storage(rusqlite::Error),
    /// One migration script failed; the whole batch was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was migrated by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
}

impl StoreError {
    /// Short code for log lines.
    pub fn code(&self) -> String {
        match self {
            Self::Storage(_) => "storage".to_string(),
            Self::Migration { version, .. } => format!("migration_{version:04}"),
            Self::SchemaTooNew { .. } => "schema_too_new".to_string(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "goal store error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "goal store migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "goal store schema {found} is newer than this build supports ({supported})"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value)
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;

    #[test]
    fn codes_name_the_failing_migration() {
        let err = StoreError::Migration {
            version: 1,
            source: rusqlite::Error::InvalidQuery,
        };
        assert_eq!(err.code(), "migration_0001");
        assert!(err.to_string().contains("migration 1"));
        assert_eq!(
            StoreError::SchemaTooNew {
                found: 9,
                supported: 1
            }
            .code(),
            "schema_too_new"
        );
    }
}

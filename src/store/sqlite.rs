//! SQLite-backed MatchStore.

use std::sync::{Mutex, MutexGuard};

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::matches::{Match, MatchId, Phase};
use crate::store::models::MatchRow;
use crate::store::{MatchStore, StoreError, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Match store persisted in a SQLite database.
///
/// Holds a single connection; the engine already serializes writes per
/// match, and SQLite serializes the rest. Calls block on the connection
/// mutex, so the engine runs them on tokio's blocking pool.
pub struct SqliteMatchStore {
    db_path: String,
    conn: Mutex<SqliteConnection>,
}

impl std::fmt::Debug for SqliteMatchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMatchStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteMatchStore {
    /// Opens (or creates) the database at `db_path` and applies pending
    /// migrations.
    ///
    /// Use `":memory:"` for a throwaway database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    #[instrument]
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let db_path = db_path.to_string();
        info!(path = %db_path, "Opening match database");
        let mut conn = SqliteConnection::establish(&db_path)
            .map_err(|e| StoreError::new(format!("Failed to connect to '{}': {}", db_path, e)))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migrations failed: {}", e)))?;
        debug!(count = applied.len(), "Migrations applied");

        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, SqliteConnection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::new("Database connection lock poisoned"))
    }
}

impl MatchStore for SqliteMatchStore {
    #[instrument(skip(self, record), fields(match_id = %match_id))]
    fn put(&self, match_id: &MatchId, record: &Match) -> Result<(), StoreError> {
        if record.match_id() != match_id {
            return Err(StoreError::new(format!(
                "Record {} stored under key {}",
                record.match_id(),
                match_id
            )));
        }
        let row = MatchRow::from_match(record)?;
        let mut conn = self.connection()?;

        diesel::replace_into(schema::matches::table)
            .values(&row)
            .execute(&mut *conn)?;

        debug!(version = record.version(), "Match stored");
        Ok(())
    }

    #[instrument(skip(self), fields(match_id = %match_id))]
    fn get(&self, match_id: &MatchId) -> Result<Option<Match>, StoreError> {
        let mut conn = self.connection()?;

        let row = schema::matches::table
            .find(match_id.as_str())
            .select(MatchRow::as_select())
            .first::<MatchRow>(&mut *conn)
            .optional()?;

        row.map(MatchRow::into_match).transpose()
    }

    #[instrument(skip(self))]
    fn list_in_phase(&self, phase: Phase) -> Result<Vec<MatchId>, StoreError> {
        let mut conn = self.connection()?;

        let ids = schema::matches::table
            .filter(schema::matches::phase.eq(phase.to_string()))
            .order(schema::matches::match_id.asc())
            .select(schema::matches::match_id)
            .load::<String>(&mut *conn)?;

        debug!(count = ids.len(), %phase, "Listed matches");
        Ok(ids.into_iter().map(MatchId::from).collect())
    }
}

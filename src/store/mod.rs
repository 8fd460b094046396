//! Match record persistence.
//!
//! The engine only talks to [`MatchStore`]. Two backends ship with the
//! crate: an in-memory map for tests and local runs, and SQLite via diesel.

mod error;
mod memory;
mod models;
mod schema;
mod sqlite;

pub use error::{StoreError, StoreErrorKind};
pub use memory::InMemoryMatchStore;
pub use sqlite::SqliteMatchStore;

use crate::matches::{Match, MatchId, Phase};

/// Durable keyed storage of match state.
///
/// Methods are synchronous and may block. The engine calls them through
/// `tokio::task::spawn_blocking`.
pub trait MatchStore: Send + Sync {
    /// Inserts or replaces the record for `match_id`.
    fn put(&self, match_id: &MatchId, record: &Match) -> Result<(), StoreError>;

    /// Loads the record for `match_id`, `None` if unknown.
    fn get(&self, match_id: &MatchId) -> Result<Option<Match>, StoreError>;

    /// Lists the ids of all matches currently in `phase`.
    fn list_in_phase(&self, phase: Phase) -> Result<Vec<MatchId>, StoreError>;
}

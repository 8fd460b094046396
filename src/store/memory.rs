//! In-memory MatchStore implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, instrument};

use crate::matches::{Match, MatchId, Phase};
use crate::store::{MatchStore, StoreError};

/// In-memory implementation of [`MatchStore`].
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    records: RwLock<HashMap<MatchId, Match>>,
}

impl InMemoryMatchStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for InMemoryMatchStore {
    #[instrument(skip(self, record), fields(match_id = %match_id))]
    fn put(&self, match_id: &MatchId, record: &Match) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::new("Match store lock poisoned"))?;
        records.insert(match_id.clone(), record.clone());
        debug!(version = record.version(), "Match stored");
        Ok(())
    }

    #[instrument(skip(self), fields(match_id = %match_id))]
    fn get(&self, match_id: &MatchId) -> Result<Option<Match>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::new("Match store lock poisoned"))?;
        Ok(records.get(match_id).cloned())
    }

    #[instrument(skip(self))]
    fn list_in_phase(&self, phase: Phase) -> Result<Vec<MatchId>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::new("Match store lock poisoned"))?;
        let mut ids: Vec<MatchId> = records
            .values()
            .filter(|m| *m.phase() == phase)
            .map(|m| m.match_id().clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

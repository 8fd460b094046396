//! Database row model for match records.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use tracing::instrument;

use crate::games::tictactoe::{Board, Mark};
use crate::matches::{Match, MatchId, Opponent, Outcome, Phase};
use crate::store::{StoreError, schema};

/// One row of the `matches` table.
///
/// The board is stored as a JSON array of nine `"X" | "O" | ""` strings.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::matches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MatchRow {
    match_id: String,
    participant_a: String,
    opponent_kind: String,
    opponent_label: Option<String>,
    board: String,
    turn: String,
    phase: String,
    outcome: Option<String>,
    version: i64,
    updated_at: NaiveDateTime,
}

impl MatchRow {
    /// Flattens a match into a row.
    #[instrument(skip(record), fields(match_id = %record.match_id))]
    pub fn from_match(record: &Match) -> Result<Self, StoreError> {
        let (opponent_kind, opponent_label) = match &record.participant_b {
            Opponent::Empty => ("empty", None),
            Opponent::Human { label } => ("human", Some(label.clone())),
            Opponent::Automated => ("automated", None),
        };
        let outcome = record
            .outcome
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let version = i64::try_from(record.version)
            .map_err(|_| StoreError::corrupt(format!("Version {} out of range", record.version)))?;

        Ok(Self {
            match_id: record.match_id.as_str().to_string(),
            participant_a: record.participant_a.clone(),
            opponent_kind: opponent_kind.to_string(),
            opponent_label,
            board: serde_json::to_string(&record.board)?,
            turn: record.turn.to_string(),
            phase: record.phase.to_string(),
            outcome,
            version,
            updated_at: chrono::Utc::now().naive_utc(),
        })
    }

    /// Rebuilds the match, rejecting rows that do not describe one.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn into_match(self) -> Result<Match, StoreError> {
        let participant_b = match (self.opponent_kind.as_str(), self.opponent_label) {
            ("empty", _) => Opponent::Empty,
            ("automated", _) => Opponent::Automated,
            ("human", Some(label)) => Opponent::Human { label },
            (kind, label) => {
                return Err(StoreError::corrupt(format!(
                    "Invalid opponent '{}' (label {:?})",
                    kind, label
                )));
            }
        };
        let turn = match self.turn.as_str() {
            "X" => Mark::X,
            "O" => Mark::O,
            other => return Err(StoreError::corrupt(format!("Invalid turn: '{}'", other))),
        };
        let phase: Phase = self
            .phase
            .parse()
            .map_err(|_| StoreError::corrupt(format!("Invalid phase: '{}'", self.phase)))?;
        let board: Board = serde_json::from_str(&self.board)?;
        let outcome: Option<Outcome> = self
            .outcome
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let version = u64::try_from(self.version)
            .map_err(|_| StoreError::corrupt(format!("Invalid version: {}", self.version)))?;

        Ok(Match {
            match_id: MatchId::from(self.match_id),
            participant_a: self.participant_a,
            participant_b,
            board,
            turn,
            phase,
            outcome,
            version,
        })
    }
}

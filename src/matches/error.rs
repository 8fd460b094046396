//! Errors reported by match operations.

use crate::matches::{MatchId, Phase};
use crate::store::StoreError;

/// Error returned to the caller of a match operation.
///
/// Every variant except [`MatchError::Storage`] is caller-fixable.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MatchError {
    /// Malformed input.
    #[display("Invalid request: {}", _0)]
    Validation(String),

    /// Unknown match identifier.
    #[display("Match {} not found", _0)]
    NotFound(MatchId),

    /// Seat or square already occupied.
    #[display("{}", _0)]
    Conflict(String),

    /// The acting participant does not hold the turn.
    #[display("Not your turn ({}): waiting for {}", actor, expected)]
    Turn {
        /// Label of the participant holding the turn.
        expected: String,
        /// Label of the participant who tried to move.
        actor: String,
    },

    /// Operation not valid in the current phase.
    #[display("Match is not in progress. Current status: {}", phase)]
    State {
        /// Phase the match was in.
        phase: Phase,
    },

    /// Persistence unavailable.
    #[display("{}", _0)]
    Storage(StoreError),
}

impl MatchError {
    /// Short machine-readable kind, used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation",
            MatchError::NotFound(_) => "not_found",
            MatchError::Conflict(_) => "conflict",
            MatchError::Turn { .. } => "turn",
            MatchError::State { .. } => "state",
            MatchError::Storage(_) => "storage",
        }
    }
}

impl std::error::Error for MatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatchError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        MatchError::Storage(err)
    }
}

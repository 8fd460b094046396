//! Event payloads and channel names.

use serde::{Deserialize, Serialize};

use crate::matches::{Match, MatchId};

/// A notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Lobby-wide announcements.
    Lobby,
    /// Everything that happens in one match.
    Match(MatchId),
}

/// Event pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum MatchEvent {
    /// A match was created (lobby channel).
    MatchCreated {
        /// New match.
        match_id: MatchId,
        /// Label of the creator.
        initiator: String,
        /// Whether the second seat is the automated opponent.
        automated_opponent: bool,
    },
    /// A participant took the second seat.
    ParticipantJoined {
        /// Match joined.
        match_id: MatchId,
        /// Label of the new participant.
        label: String,
    },
    /// Full match state after an accepted join or move.
    MatchUpdated {
        /// Match changed.
        match_id: MatchId,
        /// State after the change.
        #[serde(rename = "match")]
        state: Match,
    },
}

impl MatchEvent {
    /// Builds a `match-updated` event carrying `state`.
    pub fn updated(state: &Match) -> Self {
        MatchEvent::MatchUpdated {
            match_id: state.match_id().clone(),
            state: state.clone(),
        }
    }

    /// Match the event belongs to.
    pub fn match_id(&self) -> &MatchId {
        match self {
            MatchEvent::MatchCreated { match_id, .. }
            | MatchEvent::ParticipantJoined { match_id, .. }
            | MatchEvent::MatchUpdated { match_id, .. } => match_id,
        }
    }
}

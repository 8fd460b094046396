//! Match state and its transitions.

use crate::games::tictactoe::{Board, Mark, find_winner, is_draw};
use crate::matches::MatchError;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Display label of the automated opponent. Reserved: humans may not use it.
pub const AUTOMATED_LABEL: &str = "AI";

/// Opaque, immutable match identifier.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MatchId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Occupant of the second seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opponent {
    /// Seat is open, waiting for someone to join.
    Empty,
    /// A human participant.
    Human {
        /// Caller-supplied label.
        label: String,
    },
    /// The engine-driven automated opponent.
    Automated,
}

impl Opponent {
    /// Label of the occupant, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Opponent::Empty => None,
            Opponent::Human { label } => Some(label),
            Opponent::Automated => Some(AUTOMATED_LABEL),
        }
    }
}

/// Lifecycle phase of a match. Transitions only move forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Created, second seat open.
    AwaitingOpponent,
    /// Both seats filled, moves accepted.
    Active,
    /// Won or drawn. Terminal.
    Concluded,
}

/// Final result of a concluded match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// A participant completed a triple.
    Won {
        /// The winning mark.
        mark: Mark,
        /// Label of the participant owning that mark.
        label: String,
    },
    /// Full board, no triple.
    Draw,
}

/// Who is submitting a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor<'a> {
    /// An external caller identified by its label.
    Participant(&'a str),
    /// The engine acting for the automated seat.
    Automated,
}

impl Actor<'_> {
    fn describe(&self) -> String {
        match self {
            Actor::Participant(label) => (*label).to_string(),
            Actor::Automated => AUTOMATED_LABEL.to_string(),
        }
    }
}

/// One complete instance of play between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Match {
    /// Identifier assigned at creation.
    pub(crate) match_id: MatchId,
    /// Initiator; always plays `X`.
    pub(crate) participant_a: String,
    /// Second seat; always plays `O`.
    pub(crate) participant_b: Opponent,
    /// The board.
    pub(crate) board: Board,
    /// Mark whose owner moves next.
    pub(crate) turn: Mark,
    /// Lifecycle phase.
    pub(crate) phase: Phase,
    /// Set iff the phase is concluded.
    pub(crate) outcome: Option<Outcome>,
    /// Revision counter, bumped on every accepted join or move.
    pub(crate) version: u64,
}

impl Match {
    /// Creates a match for `initiator`.
    ///
    /// With an automated opponent the second seat is pre-filled and the
    /// match starts active; otherwise it waits for a second participant.
    #[instrument(skip(match_id), fields(match_id = %match_id))]
    pub fn new(match_id: MatchId, initiator: String, automated_opponent: bool) -> Self {
        let (participant_b, phase) = if automated_opponent {
            (Opponent::Automated, Phase::Active)
        } else {
            (Opponent::Empty, Phase::AwaitingOpponent)
        };
        info!(%phase, "Creating match");
        Self {
            match_id,
            participant_a: initiator,
            participant_b,
            board: Board::new(),
            turn: Mark::X,
            phase,
            outcome: None,
            version: 0,
        }
    }

    /// Label of the participant playing `mark`.
    pub fn label_for(&self, mark: Mark) -> Option<&str> {
        match mark {
            Mark::X => Some(&self.participant_a),
            Mark::O => self.participant_b.label(),
        }
    }

    /// Label of the participant who may move next.
    pub fn turn_holder(&self) -> Option<&str> {
        self.label_for(self.turn)
    }

    /// Number of accepted moves so far.
    pub fn ply(&self) -> usize {
        self.board.occupied()
    }

    /// True when the automated seat owes the next move.
    pub fn awaits_automated_move(&self) -> bool {
        self.phase == Phase::Active
            && self.turn == Mark::O
            && self.participant_b == Opponent::Automated
    }

    /// Seats `label` in the second slot.
    ///
    /// An open slot becomes active. An automated slot is taken over by the
    /// human and the match stays active. A human slot is a conflict.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn seat_opponent(&mut self, label: &str) -> Result<(), MatchError> {
        if self.phase == Phase::Concluded {
            warn!("Join attempted on concluded match");
            return Err(MatchError::State { phase: self.phase });
        }
        if let Opponent::Human { label: existing } = &self.participant_b {
            warn!(existing = %existing, "Second seat already taken");
            return Err(MatchError::Conflict(format!(
                "Match {} is already full",
                self.match_id
            )));
        }
        if label == self.participant_a {
            warn!("Joining participant reused the initiator's label");
            return Err(MatchError::Conflict(format!(
                "Label '{}' is already playing in match {}",
                label, self.match_id
            )));
        }

        if self.participant_b == Opponent::Automated {
            info!("Human takes over the automated seat");
        }
        self.participant_b = Opponent::Human {
            label: label.to_string(),
        };
        if self.phase == Phase::AwaitingOpponent {
            self.phase = Phase::Active;
        }
        self.version += 1;
        info!(phase = %self.phase, version = self.version, "Opponent seated");
        Ok(())
    }

    /// Applies a move for `actor` at `position`.
    ///
    /// Checks, in order: position range, phase, turn ownership, empty
    /// square. On success marks the square, then concludes the match or
    /// hands the turn to the other seat.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn apply_move(&mut self, actor: Actor<'_>, position: usize) -> Result<(), MatchError> {
        if position >= Board::CELLS {
            return Err(MatchError::Validation(format!(
                "Invalid position {} (must be 0-8)",
                position
            )));
        }

        if self.phase != Phase::Active {
            return Err(MatchError::State { phase: self.phase });
        }

        if !self.holds_turn(actor) {
            let expected = self.turn_holder().unwrap_or_default().to_string();
            warn!(actor = %actor.describe(), expected = %expected, "Move out of turn");
            return Err(MatchError::Turn {
                expected,
                actor: actor.describe(),
            });
        }

        let mark = self.turn;
        self.board.place(position, mark).map_err(|_| {
            MatchError::Conflict(format!("Position {} is already taken", position))
        })?;
        self.version += 1;

        if let Some(winner) = find_winner(&self.board) {
            let label = self.label_for(winner).unwrap_or_default().to_string();
            info!(%winner, label = %label, "Match won");
            self.phase = Phase::Concluded;
            self.outcome = Some(Outcome::Won {
                mark: winner,
                label,
            });
        } else if is_draw(&self.board) {
            info!("Match drawn");
            self.phase = Phase::Concluded;
            self.outcome = Some(Outcome::Draw);
        } else {
            self.turn = mark.opponent();
            debug!(turn = %self.turn, "Turn passed");
        }

        Ok(())
    }

    fn holds_turn(&self, actor: Actor<'_>) -> bool {
        match (self.turn, actor) {
            (Mark::X, Actor::Participant(label)) => label == self.participant_a,
            (Mark::O, Actor::Participant(label)) => {
                matches!(&self.participant_b, Opponent::Human { label: l } if l == label)
            }
            (Mark::O, Actor::Automated) => self.participant_b == Opponent::Automated,
            (Mark::X, Actor::Automated) => false,
        }
    }
}

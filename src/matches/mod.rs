//! Match state machine.
//!
//! [`Match`] holds the rules for seating and moving; [`MatchEngine`]
//! serializes access per match, persists through the store and publishes
//! every accepted change once the caller has its result.

mod engine;
mod error;
mod locks;
mod model;

pub use engine::{Committed, DEFAULT_AUTOMATED_DELAY, MatchEngine};
pub use error::MatchError;
pub use locks::MatchLocks;
pub use model::{AUTOMATED_LABEL, Actor, Match, MatchId, Opponent, Outcome, Phase};

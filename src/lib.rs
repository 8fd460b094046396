//! Strictly Matches library - two-player tic-tac-toe matches over HTTP
//!
//! Participants create and join matches, submit moves through REST
//! commands, and follow matches in realtime over a websocket. A match can
//! instead be played against an automated opponent.
//!
//! # Architecture
//!
//! - **Games**: board evaluation and the automated opponent's policy
//! - **Matches**: the match state machine, serialized per match
//! - **Store**: match record persistence (in-memory or SQLite)
//! - **Fanout**: per-match and lobby event channels
//! - **Server**: axum router exposing the engine
//! - **Client**: typed REST client and version-based state reconciliation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_matches::{Fanout, InMemoryMatchStore, MatchEngine, DEFAULT_AUTOMATED_DELAY};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = MatchEngine::new(
//!     Arc::new(InMemoryMatchStore::new()),
//!     Fanout::new(),
//!     DEFAULT_AUTOMATED_DELAY,
//! );
//! let record = engine.create("Ana", true).await?.publish();
//! engine.make_move(record.match_id(), "Ana", 0).await?.publish();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod fanout;
pub mod games;
pub mod matches;
pub mod server;
pub mod store;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Game rules
pub use games::tictactoe::{
    Board, Mark, Square, choose_move, find_immediate_win, find_winner, is_draw, is_full,
};

// Crate-level exports - Matches
pub use matches::{
    AUTOMATED_LABEL, Actor, Committed, DEFAULT_AUTOMATED_DELAY, Match, MatchEngine, MatchError, MatchId,
    MatchLocks, Opponent, Outcome, Phase,
};

// Crate-level exports - Storage
pub use store::{InMemoryMatchStore, MatchStore, SqliteMatchStore, StoreError, StoreErrorKind};

// Crate-level exports - Realtime fanout
pub use fanout::{Channel, Fanout, MatchEvent, Outbox, Publication, Recipient, SubscriberId};

// Crate-level exports - HTTP surface
pub use server::{
    AppState, ClientMessage, CreateMatchRequest, ErrorBody, JoinMatchRequest, MoveRequest,
    OpenMatchesResponse, router,
};

// Crate-level exports - Client
pub use client::{ClientError, MatchView, RestMatchClient};

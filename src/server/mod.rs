//! HTTP surface: REST commands and the websocket event stream.

mod error;
mod routes;
mod ws;

pub use error::ErrorBody;
pub use routes::{
    CreateMatchRequest, JoinMatchRequest, MoveRequest, OpenMatchesResponse, router,
};
pub use ws::ClientMessage;

use crate::matches::MatchEngine;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    engine: MatchEngine,
}

impl AppState {
    /// Wraps an engine for the router.
    pub fn new(engine: MatchEngine) -> Self {
        Self { engine }
    }

    /// The engine behind the handlers.
    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }
}

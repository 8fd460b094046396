//! Errors raised by match record backends.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong with a match record operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// The backend could not be reached or refused the operation.
    #[display("unavailable")]
    Unavailable,
    /// A stored record does not describe a valid match.
    #[display("corrupt record")]
    Corrupt,
}

/// Failure of a [`MatchStore`](super::MatchStore) call, tagged with the
/// call site that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Match store {}: {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Failure category.
    pub kind: StoreErrorKind,
    /// Backend message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// The backend failed; the operation may succeed later.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(StoreErrorKind::Unavailable, message)
    }

    /// A record was read or written that is not a valid match.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::with_kind(StoreErrorKind::Corrupt, message)
    }

    #[track_caller]
    fn with_kind(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("query failed: {}", err))
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("cannot open database: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::corrupt(format!("board or outcome column: {}", err))
    }
}

//! Mapping of match errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::matches::MatchError;

/// JSON body returned for failed commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub kind: String,
    /// Human-readable message.
    pub error: String,
}

fn status_for(err: &MatchError) -> StatusCode {
    match err {
        MatchError::Validation(_) => StatusCode::BAD_REQUEST,
        MatchError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchError::Conflict(_) | MatchError::State { .. } => StatusCode::CONFLICT,
        MatchError::Turn { .. } => StatusCode::FORBIDDEN,
        MatchError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(error = %self, "Command failed");
        } else {
            warn!(error = %self, %status, "Command rejected");
        }
        let body = ErrorBody {
            kind: self.kind().to_string(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

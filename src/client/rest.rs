//! Typed HTTP client for the REST command surface.

use derive_more::{Display, Error};
use tracing::{debug, info, instrument};

use crate::matches::{Match, MatchId};
use crate::server::{
    CreateMatchRequest, ErrorBody, JoinMatchRequest, MoveRequest, OpenMatchesResponse,
};

/// Client error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Client error: {} at {}:{}", message, file, line)]
pub struct ClientError {
    /// Error message.
    pub message: String,
    /// Error kind reported by the server, if the server answered.
    pub kind: Option<String>,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ClientError {
    /// Creates a new client error.
    #[track_caller]
    pub fn new(message: impl Into<String>, kind: Option<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP error: {}", err), None)
    }
}

/// HTTP client issuing match commands.
#[derive(Debug, Clone)]
pub struct RestMatchClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestMatchClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Creates a match.
    #[instrument(skip(self))]
    pub async fn create(&self, player: &str, automated_opponent: bool) -> Result<Match, ClientError> {
        info!("Creating match");
        let response = self
            .client
            .post(format!("{}/api/games", self.base_url))
            .json(&CreateMatchRequest::new(player.to_string(), automated_opponent))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Joins a match as its second participant.
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn join(&self, match_id: &MatchId, player: &str) -> Result<Match, ClientError> {
        info!("Joining match");
        let response = self
            .client
            .post(format!("{}/api/games/join", self.base_url))
            .json(&JoinMatchRequest::new(match_id.clone(), player.to_string()))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetches the current state of a match.
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn state(&self, match_id: &MatchId) -> Result<Match, ClientError> {
        debug!("Fetching match state");
        let response = self
            .client
            .get(format!("{}/api/games/state/{}", self.base_url, match_id))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Submits a move.
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn make_move(
        &self,
        match_id: &MatchId,
        player: &str,
        position: i64,
    ) -> Result<Match, ClientError> {
        info!("Submitting move");
        let response = self
            .client
            .post(format!("{}/api/games/move", self.base_url))
            .json(&MoveRequest::new(match_id.clone(), player.to_string(), position))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Lists matches waiting for a second participant.
    #[instrument(skip(self))]
    pub async fn list_open(&self) -> Result<Vec<MatchId>, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/games", self.base_url))
            .send()
            .await?;
        let open: OpenMatchesResponse = Self::decode(response).await?;
        Ok(open.matches)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        match response.json::<ErrorBody>().await {
            Ok(body) => Err(ClientError::new(body.error, Some(body.kind))),
            Err(_) => Err(ClientError::new(format!("Server returned {}", status), None)),
        }
    }
}

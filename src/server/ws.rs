//! Websocket endpoint pushing fanout events to clients.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::AppState;
use crate::fanout::{Channel, SubscriberId};
use crate::matches::MatchId;

/// Message sent by a websocket client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Follow a match; the current state is pushed right away.
    Subscribe {
        /// Match to follow.
        match_id: MatchId,
    },
    /// Stop following a match.
    Unsubscribe {
        /// Match to leave.
        match_id: MatchId,
    },
    /// Receive `match-created` announcements.
    SubscribeLobby,
    /// Stop receiving lobby announcements.
    UnsubscribeLobby,
}

pub(super) async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[instrument(skip_all)]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let fanout = state.engine().fanout().clone();
    let (subscriber, mut events) = fanout.connect();
    info!(subscriber = %subscriber, "Websocket connected");

    let (mut sink, mut stream) = socket.split();

    let forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => handle_client_message(&state, subscriber, text.as_str()).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    fanout.disconnect(subscriber);
    forward.abort();
    info!(subscriber = %subscriber, "Websocket disconnected");
}

#[instrument(skip(state, raw))]
async fn handle_client_message(state: &AppState, subscriber: SubscriberId, raw: &str) {
    let message: ClientMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed client message");
            return;
        }
    };
    debug!(?message, "Client message");

    let fanout = state.engine().fanout();
    match message {
        ClientMessage::Subscribe { match_id } => {
            if let Err(e) = state.engine().subscribe(subscriber, &match_id).await {
                warn!(match_id = %match_id, error = %e, "Subscription refused");
            }
        }
        ClientMessage::Unsubscribe { match_id } => {
            fanout.unsubscribe(subscriber, Channel::Match(match_id));
        }
        ClientMessage::SubscribeLobby => {
            fanout.subscribe(subscriber, Channel::Lobby);
        }
        ClientMessage::UnsubscribeLobby => {
            fanout.unsubscribe(subscriber, Channel::Lobby);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::{Fanout, MatchEvent};
    use crate::matches::MatchEngine;
    use crate::store::InMemoryMatchStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(MatchEngine::new(
            Arc::new(InMemoryMatchStore::new()),
            Fanout::new(),
            Duration::from_secs(60),
        ))
    }

    #[test]
    fn test_client_message_wire_format() {
        let cases = [
            (
                json!({"action": "subscribe", "match_id": "m1"}),
                ClientMessage::Subscribe {
                    match_id: MatchId::from("m1"),
                },
            ),
            (
                json!({"action": "unsubscribe", "match_id": "m1"}),
                ClientMessage::Unsubscribe {
                    match_id: MatchId::from("m1"),
                },
            ),
            (json!({"action": "subscribe-lobby"}), ClientMessage::SubscribeLobby),
            (
                json!({"action": "unsubscribe-lobby"}),
                ClientMessage::UnsubscribeLobby,
            ),
        ];
        for (wire, message) in cases {
            assert_eq!(serde_json::to_value(&message).unwrap(), wire);
            assert_eq!(serde_json::from_value::<ClientMessage>(wire).unwrap(), message);
        }
    }

    #[test]
    fn test_malformed_client_messages_are_rejected() {
        for raw in [
            "not json",
            r#"{"action": "subscribe"}"#,
            r#"{"action": "shout", "match_id": "m1"}"#,
            r#"{"match_id": "m1"}"#,
        ] {
            assert!(serde_json::from_str::<ClientMessage>(raw).is_err(), "{}", raw);
        }
    }

    #[tokio::test]
    async fn test_client_messages_route_to_engine_and_fanout() {
        let state = state();
        let record = state.engine().create("ana", false).await.unwrap().publish();
        let match_id = record.match_id().clone();
        let channel = Channel::Match(match_id.clone());
        let fanout = state.engine().fanout().clone();
        let (subscriber, mut rx) = fanout.connect();

        handle_client_message(&state, subscriber, "not json").await;
        assert!(rx.try_recv().is_err());

        let subscribe = json!({"action": "subscribe", "match_id": match_id}).to_string();
        handle_client_message(&state, subscriber, &subscribe).await;
        assert!(fanout.is_subscribed(subscriber, &channel));
        assert_eq!(rx.try_recv().unwrap(), MatchEvent::updated(&record));

        let unsubscribe = json!({"action": "unsubscribe", "match_id": match_id}).to_string();
        handle_client_message(&state, subscriber, &unsubscribe).await;
        assert!(!fanout.is_subscribed(subscriber, &channel));

        handle_client_message(&state, subscriber, r#"{"action":"subscribe-lobby"}"#).await;
        assert!(fanout.is_subscribed(subscriber, &Channel::Lobby));
        handle_client_message(&state, subscriber, r#"{"action":"unsubscribe-lobby"}"#).await;
        assert!(!fanout.is_subscribed(subscriber, &Channel::Lobby));
    }

    #[tokio::test]
    async fn test_subscribe_to_unknown_match_is_refused() {
        let state = state();
        let fanout = state.engine().fanout().clone();
        let (subscriber, mut rx) = fanout.connect();

        handle_client_message(&state, subscriber, r#"{"action":"subscribe","match_id":"missing"}"#)
            .await;

        assert!(!fanout.is_subscribed(subscriber, &Channel::Match(MatchId::from("missing"))));
        assert!(rx.try_recv().is_err());
    }
}

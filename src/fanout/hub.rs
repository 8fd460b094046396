//! Subscriber registry and publishing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

use super::{Channel, MatchEvent};

/// Identifies one connected subscriber.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub struct SubscriberId(u64);

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    queues: HashMap<SubscriberId, mpsc::UnboundedSender<MatchEvent>>,
    channels: HashMap<Channel, HashSet<SubscriberId>>,
}

impl Registry {
    fn drop_subscriber(&mut self, subscriber: SubscriberId) {
        self.queues.remove(&subscriber);
        self.channels.retain(|_, members| {
            members.remove(&subscriber);
            !members.is_empty()
        });
    }
}

/// Channel-based event hub.
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct Fanout {
    registry: Arc<Mutex<Registry>>,
}

impl Fanout {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // The registry is left consistent by every critical section.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new subscriber and returns its event queue.
    #[instrument(skip(self))]
    pub fn connect(&self) -> (SubscriberId, mpsc::UnboundedReceiver<MatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry();
        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        registry.queues.insert(id, tx);
        debug!(subscriber = %id, "Subscriber connected");
        (id, rx)
    }

    /// Removes a subscriber from every channel.
    #[instrument(skip(self))]
    pub fn disconnect(&self, subscriber: SubscriberId) {
        self.registry().drop_subscriber(subscriber);
        debug!(subscriber = %subscriber, "Subscriber disconnected");
    }

    /// Adds `subscriber` to `channel`.
    ///
    /// Idempotent: returns `false` if it was already a member or is not
    /// connected.
    #[instrument(skip(self))]
    pub fn subscribe(&self, subscriber: SubscriberId, channel: Channel) -> bool {
        let mut registry = self.registry();
        if !registry.queues.contains_key(&subscriber) {
            return false;
        }
        registry.channels.entry(channel).or_default().insert(subscriber)
    }

    /// Removes `subscriber` from `channel`. Idempotent.
    #[instrument(skip(self))]
    pub fn unsubscribe(&self, subscriber: SubscriberId, channel: Channel) -> bool {
        let mut registry = self.registry();
        let Some(members) = registry.channels.get_mut(&channel) else {
            return false;
        };
        let removed = members.remove(&subscriber);
        if members.is_empty() {
            registry.channels.remove(&channel);
        }
        removed
    }

    /// Whether `subscriber` currently receives events of `channel`.
    pub fn is_subscribed(&self, subscriber: SubscriberId, channel: &Channel) -> bool {
        self.registry()
            .channels
            .get(channel)
            .is_some_and(|members| members.contains(&subscriber))
    }

    /// Sends `event` to every member of `channel`.
    ///
    /// Subscribers whose queue is closed are dropped. Returns the number of
    /// queues the event was delivered to.
    #[instrument(skip(self, event), fields(event = event_name(&event)))]
    pub fn publish(&self, channel: &Channel, event: MatchEvent) -> usize {
        let mut registry = self.registry();
        let Some(members) = registry.channels.get(channel) else {
            trace!("No subscribers for channel");
            return 0;
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for id in members {
            match registry.queues.get(id) {
                Some(tx) if tx.send(event.clone()).is_ok() => delivered += 1,
                _ => closed.push(*id),
            }
        }
        for id in closed {
            debug!(subscriber = %id, "Dropping closed subscriber");
            registry.drop_subscriber(id);
        }

        trace!(delivered, "Event published");
        delivered
    }

    /// Sends `event` to a single subscriber.
    #[instrument(skip(self, event), fields(event = event_name(&event)))]
    pub fn send_to(&self, subscriber: SubscriberId, event: MatchEvent) -> bool {
        let mut registry = self.registry();
        let sent = registry
            .queues
            .get(&subscriber)
            .is_some_and(|tx| tx.send(event).is_ok());
        if !sent {
            registry.drop_subscriber(subscriber);
        }
        sent
    }
}

fn event_name(event: &MatchEvent) -> &'static str {
    match event {
        MatchEvent::MatchCreated { .. } => "match-created",
        MatchEvent::ParticipantJoined { .. } => "participant-joined",
        MatchEvent::MatchUpdated { .. } => "match-updated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{Match, MatchId};

    fn joined(id: &str, label: &str) -> MatchEvent {
        MatchEvent::ParticipantJoined {
            match_id: MatchId::from(id),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let hub = Fanout::new();
        let (sub, mut rx) = hub.connect();
        let channel = Channel::Match(MatchId::from("m1"));

        assert!(hub.subscribe(sub, channel.clone()));
        assert!(!hub.subscribe(sub, channel.clone()));

        assert_eq!(hub.publish(&channel, joined("m1", "ben")), 1);
        assert_eq!(rx.try_recv().unwrap(), joined("m1", "ben"));
        assert!(rx.try_recv().is_err(), "event delivered twice");

        assert!(hub.unsubscribe(sub, channel.clone()));
        assert!(!hub.unsubscribe(sub, channel.clone()));
        assert_eq!(hub.publish(&channel, joined("m1", "cat")), 0);
    }

    #[test]
    fn test_channels_are_isolated() {
        let hub = Fanout::new();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        hub.subscribe(a, Channel::Match(MatchId::from("m1")));
        hub.subscribe(b, Channel::Match(MatchId::from("m2")));

        hub.publish(&Channel::Match(MatchId::from("m1")), joined("m1", "ben"));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_publish_preserves_order() {
        let hub = Fanout::new();
        let (sub, mut rx) = hub.connect();
        let channel = Channel::Match(MatchId::from("m1"));
        hub.subscribe(sub, channel.clone());

        let mut state = Match::new(MatchId::from("m1"), "ana".to_string(), true);
        let mut sent = Vec::new();
        for pos in [0, 1, 2] {
            state.version += 1;
            state.board.place(pos, crate::games::tictactoe::Mark::X).unwrap();
            let event = MatchEvent::updated(&state);
            hub.publish(&channel, event.clone());
            sent.push(event);
        }

        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(received, sent);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let hub = Fanout::new();
        let (sub, rx) = hub.connect();
        let channel = Channel::Lobby;
        hub.subscribe(sub, channel.clone());
        drop(rx);

        assert_eq!(hub.publish(&channel, joined("m1", "ben")), 0);
        assert!(!hub.is_subscribed(sub, &channel));
    }

    #[test]
    fn test_disconnected_subscriber_cannot_subscribe() {
        let hub = Fanout::new();
        let (sub, _rx) = hub.connect();
        hub.disconnect(sub);
        assert!(!hub.subscribe(sub, Channel::Lobby));
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(joined("m1", "ben")).unwrap();
        assert_eq!(json["event"], "participant-joined");
        assert_eq!(json["match_id"], "m1");
        assert_eq!(json["label"], "ben");
    }
}

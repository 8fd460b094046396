//! Deferred, ordered publishing of committed events.
//!
//! A command stages its events while it still holds the match lock, which
//! fixes their position in the match's sequence. Nothing reaches
//! subscribers until the command's [`Publication`] is released, and a
//! batch is only delivered once every earlier batch of the same match has
//! been delivered.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{instrument, trace};

use super::{Channel, Fanout, MatchEvent, SubscriberId};
use crate::matches::MatchId;

/// Where a staged event goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of a channel.
    Channel(Channel),
    /// One subscriber only.
    Subscriber(SubscriberId),
}

#[derive(Debug)]
struct Batch {
    seq: u64,
    released: bool,
    deliveries: Vec<(Recipient, MatchEvent)>,
}

#[derive(Debug, Default)]
struct MatchQueue {
    next_seq: u64,
    batches: VecDeque<Batch>,
}

/// Per-match queues of staged event batches.
#[derive(Debug, Clone)]
pub struct Outbox {
    fanout: Fanout,
    queues: Arc<Mutex<HashMap<MatchId, MatchQueue>>>,
}

impl Outbox {
    /// Creates an outbox delivering through `fanout`.
    pub fn new(fanout: Fanout) -> Self {
        Self {
            fanout,
            queues: Arc::default(),
        }
    }

    /// The hub batches are delivered to.
    pub fn fanout(&self) -> &Fanout {
        &self.fanout
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<MatchId, MatchQueue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a batch to the queue of `match_id`.
    ///
    /// Callers stage under the match lock so batches queue in commit order.
    #[instrument(skip(self, deliveries), fields(match_id = %match_id, count = deliveries.len()))]
    pub fn stage(
        &self,
        match_id: &MatchId,
        deliveries: Vec<(Recipient, MatchEvent)>,
    ) -> Publication {
        let mut queues = self.queues();
        let queue = queues.entry(match_id.clone()).or_default();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.batches.push_back(Batch {
            seq,
            released: false,
            deliveries,
        });
        trace!(seq, "Batch staged");
        Publication {
            outbox: Some(self.clone()),
            match_id: match_id.clone(),
            seq,
        }
    }

    /// Number of staged batches not yet delivered for `match_id`.
    pub fn pending(&self, match_id: &MatchId) -> usize {
        self.queues()
            .get(match_id)
            .map_or(0, |queue| queue.batches.len())
    }

    fn release(&self, match_id: &MatchId, seq: u64) {
        let mut queues = self.queues();
        let Some(queue) = queues.get_mut(match_id) else {
            return;
        };
        if let Some(batch) = queue.batches.iter_mut().find(|batch| batch.seq == seq) {
            batch.released = true;
        }

        // Delivering under the queue mutex keeps concurrent releases from
        // interleaving batches.
        while queue.batches.front().is_some_and(|batch| batch.released) {
            let Some(batch) = queue.batches.pop_front() else {
                break;
            };
            trace!(seq = batch.seq, "Delivering batch");
            for (recipient, event) in batch.deliveries {
                match recipient {
                    Recipient::Channel(channel) => {
                        self.fanout.publish(&channel, event);
                    }
                    Recipient::Subscriber(subscriber) => {
                        self.fanout.send_to(subscriber, event);
                    }
                }
            }
        }

        if queue.batches.is_empty() {
            queues.remove(match_id);
        }
    }
}

/// Handle to one staged batch.
///
/// Releasing (or dropping) it lets the batch go out once all earlier
/// batches of the match have.
#[derive(Debug)]
#[must_use = "a staged batch is held back until its publication is released"]
pub struct Publication {
    outbox: Option<Outbox>,
    match_id: MatchId,
    seq: u64,
}

impl Publication {
    /// Releases the batch.
    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(outbox) = self.outbox.take() {
            outbox.release(&self.match_id, self.seq);
        }
    }
}

impl Drop for Publication {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(id: &str, label: &str) -> MatchEvent {
        MatchEvent::ParticipantJoined {
            match_id: MatchId::from(id),
            label: label.to_string(),
        }
    }

    fn setup() -> (Outbox, tokio::sync::mpsc::UnboundedReceiver<MatchEvent>, Channel) {
        let outbox = Outbox::new(Fanout::new());
        let (sub, rx) = outbox.fanout().connect();
        let channel = Channel::Match(MatchId::from("m1"));
        outbox.fanout().subscribe(sub, channel.clone());
        (outbox, rx, channel)
    }

    #[test]
    fn test_nothing_delivered_before_release() {
        let (outbox, mut rx, channel) = setup();
        let publication = outbox.stage(
            &MatchId::from("m1"),
            vec![(Recipient::Channel(channel), joined("m1", "ben"))],
        );

        assert!(rx.try_recv().is_err());
        publication.release();
        assert_eq!(rx.try_recv().unwrap(), joined("m1", "ben"));
        assert_eq!(outbox.pending(&MatchId::from("m1")), 0);
    }

    #[test]
    fn test_later_batch_waits_for_earlier() {
        let (outbox, mut rx, channel) = setup();
        let id = MatchId::from("m1");
        let first = outbox.stage(
            &id,
            vec![(Recipient::Channel(channel.clone()), joined("m1", "ben"))],
        );
        let second = outbox.stage(
            &id,
            vec![(Recipient::Channel(channel), joined("m1", "cat"))],
        );

        second.release();
        assert!(rx.try_recv().is_err(), "second batch overtook the first");
        assert_eq!(outbox.pending(&id), 2);

        first.release();
        assert_eq!(rx.try_recv().unwrap(), joined("m1", "ben"));
        assert_eq!(rx.try_recv().unwrap(), joined("m1", "cat"));
        assert_eq!(outbox.pending(&id), 0);
    }

    #[test]
    fn test_dropped_publication_releases() {
        let (outbox, mut rx, channel) = setup();
        {
            let _publication = outbox.stage(
                &MatchId::from("m1"),
                vec![(Recipient::Channel(channel), joined("m1", "ben"))],
            );
        }
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_matches_do_not_block_each_other() {
        let (outbox, mut rx, channel) = setup();
        let _held = outbox.stage(&MatchId::from("m2"), Vec::new());
        outbox
            .stage(
                &MatchId::from("m1"),
                vec![(Recipient::Channel(channel), joined("m1", "ben"))],
            )
            .release();
        assert!(rx.try_recv().is_ok());
    }
}

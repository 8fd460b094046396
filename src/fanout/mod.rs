//! Realtime fanout of match events to subscribed clients.
//!
//! Subscribers connect once, then join and leave channels: the lobby, or
//! the channel of one match. Each subscriber owns a FIFO queue, so events
//! published in order for a match are received in that order. The
//! [`Outbox`] holds committed events back until the command that produced
//! them has handed its result to the caller.

mod events;
mod hub;
mod outbox;

pub use events::{Channel, MatchEvent};
pub use hub::{Fanout, SubscriberId};
pub use outbox::{Outbox, Publication, Recipient};

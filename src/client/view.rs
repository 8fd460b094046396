//! Local view of one match, fed by REST polls and pushed events.

use tracing::{debug, instrument, trace};

use crate::fanout::MatchEvent;
use crate::matches::{Match, MatchId};

/// Latest known state of a match.
///
/// Snapshots arrive from two sources with no ordering between them: REST
/// responses and fanout events. A snapshot replaces the view only when
/// its version is newer, so a late REST response can never roll back a
/// pushed move and vice versa.
#[derive(Debug, Clone)]
pub struct MatchView {
    match_id: MatchId,
    current: Option<Match>,
}

impl MatchView {
    /// Creates an empty view of `match_id`.
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            current: None,
        }
    }

    /// Match this view follows.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Latest accepted snapshot.
    pub fn current(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    /// Offers a snapshot. Returns `true` if the view changed.
    #[instrument(skip(self, snapshot), fields(match_id = %self.match_id, version = snapshot.version()))]
    pub fn reconcile(&mut self, snapshot: Match) -> bool {
        if snapshot.match_id() != &self.match_id {
            trace!(other = %snapshot.match_id(), "Snapshot for another match ignored");
            return false;
        }
        let newer = self
            .current
            .as_ref()
            .is_none_or(|current| snapshot.version() > current.version());
        if newer {
            debug!("View updated");
            self.current = Some(snapshot);
        }
        newer
    }

    /// Offers a pushed event. Returns `true` if the view changed.
    pub fn apply_event(&mut self, event: MatchEvent) -> bool {
        match event {
            MatchEvent::MatchUpdated { state, .. } => self.reconcile(state),
            MatchEvent::ParticipantJoined { .. } | MatchEvent::MatchCreated { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Actor;

    fn progressed(moves: &[usize]) -> Match {
        let mut m = Match::new(MatchId::from("m1"), "ana".to_string(), false);
        m.seat_opponent("ben").unwrap();
        let labels = ["ana", "ben"];
        for (n, &pos) in moves.iter().enumerate() {
            m.apply_move(Actor::Participant(labels[n % 2]), pos).unwrap();
        }
        m
    }

    #[test]
    fn test_stale_poll_does_not_roll_back() {
        let mut view = MatchView::new(MatchId::from("m1"));
        let pushed = progressed(&[0, 4]);
        let polled = progressed(&[0]);

        assert!(view.apply_event(MatchEvent::updated(&pushed)));
        assert!(!view.reconcile(polled));
        assert_eq!(view.current(), Some(&pushed));
    }

    #[test]
    fn test_duplicate_delivery_is_ignored() {
        let mut view = MatchView::new(MatchId::from("m1"));
        let state = progressed(&[0]);
        assert!(view.reconcile(state.clone()));
        assert!(!view.apply_event(MatchEvent::updated(&state)));
    }

    #[test]
    fn test_other_match_ignored() {
        let mut view = MatchView::new(MatchId::from("m2"));
        assert!(!view.reconcile(progressed(&[])));
        assert!(view.current().is_none());
    }
}

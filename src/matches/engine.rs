//! Match engine: the single entry point for creating, joining and playing
//! matches.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::fanout::{Channel, Fanout, MatchEvent, Outbox, Publication, Recipient, SubscriberId};
use crate::games::tictactoe::{Mark, choose_move};
use crate::matches::{AUTOMATED_LABEL, Actor, Match, MatchError, MatchId, MatchLocks, Phase};
use crate::store::{MatchStore, StoreError};

/// Pause before the automated opponent answers.
pub const DEFAULT_AUTOMATED_DELAY: Duration = Duration::from_millis(500);

/// Result of an accepted command, with its events held back.
///
/// The events go out once [`Committed::publish`] is called or the value is
/// dropped, and never ahead of events from earlier commands on the same
/// match. Callers answer their own client first, then publish.
#[derive(Debug)]
pub struct Committed<T> {
    value: T,
    publication: Publication,
}

impl<T> Committed<T> {
    fn new(value: T, publication: Publication) -> Self {
        Self { value, publication }
    }

    /// The command's result.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Splits off the result, leaving the events to the returned handle.
    pub fn into_parts(self) -> (T, Publication) {
        (self.value, self.publication)
    }

    /// Publishes the events and returns the result.
    pub fn publish(self) -> T {
        let (value, publication) = self.into_parts();
        publication.release();
        value
    }
}

struct EngineInner {
    store: Arc<dyn MatchStore>,
    outbox: Outbox,
    locks: MatchLocks,
    automated_delay: Duration,
}

/// Owns the match state machine.
///
/// Every mutation of a match runs under that match's lock: load from the
/// store, validate, mutate, persist, stage events. Cheap to clone.
#[derive(Clone)]
pub struct MatchEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("automated_delay", &self.inner.automated_delay)
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    /// Creates an engine over `store`, publishing through `fanout`.
    #[instrument(skip(store, fanout))]
    pub fn new(store: Arc<dyn MatchStore>, fanout: Fanout, automated_delay: Duration) -> Self {
        info!("Creating match engine");
        Self {
            inner: Arc::new(EngineInner {
                store,
                outbox: Outbox::new(fanout),
                locks: MatchLocks::new(),
                automated_delay,
            }),
        }
    }

    /// The hub events are published on.
    pub fn fanout(&self) -> &Fanout {
        self.inner.outbox.fanout()
    }

    /// Creates a match for `initiator`.
    ///
    /// # Errors
    ///
    /// [`MatchError::Validation`] for a blank or reserved label,
    /// [`MatchError::Storage`] if the record cannot be saved.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        initiator: &str,
        automated_opponent: bool,
    ) -> Result<Committed<Match>, MatchError> {
        let initiator = validate_label(initiator)?;
        let record = Match::new(MatchId::generate(), initiator.to_string(), automated_opponent);

        self.save(&record).await?;
        info!(match_id = %record.match_id(), initiator, automated_opponent, "Match created");

        let publication = self.inner.outbox.stage(
            record.match_id(),
            vec![(
                Recipient::Channel(Channel::Lobby),
                MatchEvent::MatchCreated {
                    match_id: record.match_id().clone(),
                    initiator: initiator.to_string(),
                    automated_opponent,
                },
            )],
        );
        Ok(Committed::new(record, publication))
    }

    /// Seats `label` as the second participant.
    ///
    /// # Errors
    ///
    /// [`MatchError::NotFound`], [`MatchError::Validation`] for a bad label,
    /// [`MatchError::Conflict`] if a human already holds the seat,
    /// [`MatchError::State`] if the match is over.
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn join(
        &self,
        match_id: &MatchId,
        label: &str,
    ) -> Result<Committed<Match>, MatchError> {
        let _guard = self.inner.locks.acquire(match_id).await;
        let mut record = self.load(match_id).await?;
        let label = validate_label(label)?;

        record.seat_opponent(label)?;
        self.save(&record).await?;
        info!(player = label, phase = %record.phase(), "Participant joined");

        let channel = Channel::Match(match_id.clone());
        let publication = self.inner.outbox.stage(
            match_id,
            vec![
                (
                    Recipient::Channel(channel.clone()),
                    MatchEvent::ParticipantJoined {
                        match_id: match_id.clone(),
                        label: label.to_string(),
                    },
                ),
                (Recipient::Channel(channel), MatchEvent::updated(&record)),
            ],
        );
        Ok(Committed::new(record, publication))
    }

    /// Submits a move for `player` at `position`.
    ///
    /// When the move hands the turn to the automated opponent, its reply is
    /// scheduled and applied later through the same pipeline.
    ///
    /// # Errors
    ///
    /// In order of checking: [`MatchError::NotFound`],
    /// [`MatchError::Validation`], [`MatchError::State`],
    /// [`MatchError::Turn`], [`MatchError::Conflict`]; then
    /// [`MatchError::Storage`] if the result cannot be saved.
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn make_move(
        &self,
        match_id: &MatchId,
        player: &str,
        position: usize,
    ) -> Result<Committed<Match>, MatchError> {
        let _guard = self.inner.locks.acquire(match_id).await;
        let record = self.load(match_id).await?;
        let (record, publication) = self
            .commit_move(record, Actor::Participant(player), position)
            .await?;
        if record.awaits_automated_move() {
            self.schedule_automated_move(match_id.clone());
        }
        Ok(Committed::new(record, publication))
    }

    /// Returns the current state of a match without changing it.
    ///
    /// # Errors
    ///
    /// [`MatchError::NotFound`] or [`MatchError::Storage`].
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn get_state(&self, match_id: &MatchId) -> Result<Match, MatchError> {
        let _guard = self.inner.locks.acquire(match_id).await;
        self.load(match_id).await
    }

    /// Lists matches waiting for a second participant.
    #[instrument(skip(self))]
    pub async fn list_open(&self) -> Result<Vec<MatchId>, MatchError> {
        let store = Arc::clone(&self.inner.store);
        let ids = tokio::task::spawn_blocking(move || store.list_in_phase(Phase::AwaitingOpponent))
            .await
            .map_err(store_task_failed)??;
        Ok(ids)
    }

    /// Subscribes `subscriber` to a match and sends it the current state.
    ///
    /// The snapshot queues behind events still held back for the match, so
    /// the versions a subscriber sees never go backwards.
    #[instrument(skip(self), fields(match_id = %match_id))]
    pub async fn subscribe(
        &self,
        subscriber: SubscriberId,
        match_id: &MatchId,
    ) -> Result<Match, MatchError> {
        let _guard = self.inner.locks.acquire(match_id).await;
        let record = self.load(match_id).await?;
        self.fanout()
            .subscribe(subscriber, Channel::Match(match_id.clone()));
        self.inner
            .outbox
            .stage(
                match_id,
                vec![(
                    Recipient::Subscriber(subscriber),
                    MatchEvent::updated(&record),
                )],
            )
            .release();
        debug!(subscriber = %subscriber, version = record.version(), "Snapshot queued");
        Ok(record)
    }

    async fn load(&self, match_id: &MatchId) -> Result<Match, MatchError> {
        let store = Arc::clone(&self.inner.store);
        let id = match_id.clone();
        tokio::task::spawn_blocking(move || store.get(&id))
            .await
            .map_err(store_task_failed)??
            .ok_or_else(|| MatchError::NotFound(match_id.clone()))
    }

    async fn save(&self, record: &Match) -> Result<(), MatchError> {
        let store = Arc::clone(&self.inner.store);
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.put(record.match_id(), &record))
            .await
            .map_err(store_task_failed)??;
        Ok(())
    }

    /// Applies one move to `record`, persists it and stages its event.
    ///
    /// Callers hold the match lock and loaded `record` under it.
    async fn commit_move(
        &self,
        mut record: Match,
        actor: Actor<'_>,
        position: usize,
    ) -> Result<(Match, Publication), MatchError> {
        record.apply_move(actor, position)?;
        self.save(&record).await?;
        info!(
            ?actor,
            position,
            phase = %record.phase(),
            version = record.version(),
            "Move accepted"
        );

        let publication = self.inner.outbox.stage(
            record.match_id(),
            vec![(
                Recipient::Channel(Channel::Match(record.match_id().clone())),
                MatchEvent::updated(&record),
            )],
        );
        Ok((record, publication))
    }

    fn schedule_automated_move(&self, match_id: MatchId) {
        let engine = self.clone();
        debug!(match_id = %match_id, delay = ?self.inner.automated_delay, "Scheduling automated move");
        tokio::spawn(async move {
            tokio::time::sleep(engine.inner.automated_delay).await;
            if let Err(e) = engine.play_automated_move(&match_id).await {
                error!(match_id = %match_id, error = %e, "Automated move aborted");
            }
        });
    }

    /// Plays the automated opponent's move against the latest stored state.
    ///
    /// A no-op when the state no longer awaits it, e.g. a human took over
    /// the seat meanwhile.
    #[instrument(skip(self), fields(match_id = %match_id))]
    async fn play_automated_move(&self, match_id: &MatchId) -> Result<(), MatchError> {
        let _guard = self.inner.locks.acquire(match_id).await;
        let record = self.load(match_id).await?;
        if !record.awaits_automated_move() {
            debug!(phase = %record.phase(), "Automated move no longer due");
            return Ok(());
        }
        let Some(position) = choose_move(record.board(), Mark::O, Mark::X) else {
            warn!("No empty square for automated move");
            return Ok(());
        };

        let (_, publication) = self
            .commit_move(record, Actor::Automated, position)
            .await?;
        publication.release();
        info!(player = AUTOMATED_LABEL, position, "Automated move played");
        Ok(())
    }
}

fn store_task_failed(err: tokio::task::JoinError) -> StoreError {
    StoreError::new(format!("Store task failed: {}", err))
}

/// Checks a caller-supplied label. Accepted labels are kept as given.
fn validate_label(label: &str) -> Result<&str, MatchError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(MatchError::Validation("Player label must not be blank".to_string()));
    }
    if trimmed == AUTOMATED_LABEL {
        return Err(MatchError::Validation(format!(
            "Player label '{}' is reserved for the automated opponent",
            AUTOMATED_LABEL
        )));
    }
    Ok(label)
}

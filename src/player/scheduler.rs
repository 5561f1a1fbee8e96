//! Track scheduler - keeps a session's queue topped up with generated tracks.
//!
//! The scheduler owns the session's [`QueueState`]. Whenever fewer than
//! `prefetch_threshold` tracks are queued after the current one it
//! generates the difference, one at a time, through the session's
//! [`CompositionGate`]. Each result is appended as soon as it completes,
//! so tracks land in request order. A failed generation becomes a
//! `Failed` placeholder and the batch carries on.
//!
//! # Concurrency
//!
//! Only one batch runs at a time (the `generating` flag); a second
//! [`ensure_prefetched`](TrackScheduler::ensure_prefetched) call while a
//! batch is running returns immediately. The running batch re-checks the
//! deficit after every round, and once more after clearing the flag, so a
//! cursor move that lands while a batch winds down is never dropped. The
//! queue lives behind a mutex that is never held across an await.
//!
//! After [`close`](TrackScheduler::close) no new batch starts, queued
//! gate waiters are refused, and a composition that was already in
//! flight is discarded when it completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::queue::{Advance, QueueState};
use crate::composer::{
    ComposeError, Composer, CompositionGate, DEFAULT_TRACK_DURATION_MS, GateClosed, plan_for_station,
};
use crate::db::{NewTrack, Repository};
use crate::model::{Track, new_track_id};
use crate::storage::{AudioStore, StorageError};

/// Tracks kept queued after the current one.
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 2;

const EVENT_CAPACITY: usize = 64;

/// Scheduler tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub prefetch_threshold: usize,
    pub track_duration_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            track_duration_ms: DEFAULT_TRACK_DURATION_MS,
        }
    }
}

/// Something observable happened to a session's queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// A generated (or failed) track was appended at `index`
    TrackAppended { index: usize, track: Track },
    /// The cursor moved to `index`
    CursorMoved { index: usize },
    /// Playback stepped over a failed track
    TryingNext { skipped: String },
    PlaybackChanged { playing: bool },
    Closed,
}

/// Why one generation attempt did not produce a track.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Station not found: {0}")]
    StationNotFound(String),

    #[error(transparent)]
    GateClosed(#[from] GateClosed),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] crate::error::Error),
}

/// Per-session track scheduler.
pub struct TrackScheduler {
    station_id: String,
    queue: Mutex<QueueState>,
    generating: AtomicBool,
    closed: AtomicBool,
    gate: CompositionGate,
    composer: Arc<dyn Composer>,
    store: Arc<dyn AudioStore>,
    repo: Arc<dyn Repository>,
    settings: SchedulerSettings,
    events: broadcast::Sender<QueueEvent>,
}

impl TrackScheduler {
    pub fn new(
        station_id: impl Into<String>,
        composer: Arc<dyn Composer>,
        store: Arc<dyn AudioStore>,
        repo: Arc<dyn Repository>,
        settings: SchedulerSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            station_id: station_id.into(),
            queue: Mutex::new(QueueState::new()),
            generating: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            gate: CompositionGate::new(),
            composer,
            store,
            repo,
            settings,
            events,
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn gate(&self) -> &CompositionGate {
        &self.gate
    }

    /// Receive queue events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Copy of the current queue.
    pub fn snapshot(&self) -> QueueState {
        self.queue.lock().clone()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.queue.lock().current().cloned()
    }

    pub fn is_playing(&self) -> bool {
        self.queue.lock().is_playing()
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Tracks missing to reach the prefetch threshold.
    pub fn prefetch_deficit(&self) -> usize {
        self.queue
            .lock()
            .prefetch_deficit(self.settings.prefetch_threshold)
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Queue mutations (each re-triggers prefetching)
    // ========================================================================

    /// Replace the queue's tracks, e.g. with a station's persisted tracks.
    pub fn seed(self: &Arc<Self>, tracks: Vec<Track>) {
        let index = {
            let mut queue = self.queue.lock();
            queue.replace_tracks(tracks);
            queue.current_index()
        };
        self.emit(QueueEvent::CursorMoved { index });
        self.kick();
    }

    /// Step forward, skipping failed tracks.
    pub fn advance(self: &Arc<Self>) -> Advance {
        let result = self.queue.lock().advance_skipping_failed();
        self.after_move(&result);
        result
    }

    /// Step back one track.
    pub fn retreat(self: &Arc<Self>) -> bool {
        let (moved, index) = {
            let mut queue = self.queue.lock();
            let moved = queue.retreat();
            (moved, queue.current_index())
        };
        if moved {
            self.emit(QueueEvent::CursorMoved { index });
        }
        self.kick();
        moved
    }

    /// Move off a failed current track if a later track exists.
    pub fn leave_failed(self: &Arc<Self>) -> Advance {
        let result = self.queue.lock().leave_failed();
        self.after_move(&result);
        result
    }

    fn after_move(self: &Arc<Self>, result: &Advance) {
        for skipped in &result.skipped {
            tracing::info!(track_id = %skipped, "Skipping failed track, trying next");
            self.emit(QueueEvent::TryingNext {
                skipped: skipped.clone(),
            });
        }
        if result.moved {
            let index = self.queue.lock().current_index();
            self.emit(QueueEvent::CursorMoved { index });
        }
        self.kick();
    }

    /// Record whether the session is playing.
    pub fn set_playing(&self, playing: bool) {
        let changed = {
            let mut queue = self.queue.lock();
            let changed = queue.is_playing() != playing;
            queue.set_playing(playing);
            changed
        };
        if changed {
            self.emit(QueueEvent::PlaybackChanged { playing });
        }
    }

    /// Append a finished track unless the session has closed.
    ///
    /// Returns the new index, or `None` if the track was discarded.
    fn append(&self, track: Track) -> Option<usize> {
        if self.is_closed() {
            tracing::debug!(track_id = %track.id, "Discarding track generated after close");
            return None;
        }
        let index = self.queue.lock().push(track.clone());
        self.emit(QueueEvent::TrackAppended { index, track });
        Some(index)
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Run [`ensure_prefetched`](Self::ensure_prefetched) in the background.
    pub fn kick(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.ensure_prefetched().await;
        });
    }

    /// Generate tracks until the prefetch threshold is met.
    ///
    /// Returns how many tracks were appended (failed placeholders
    /// included). A no-op returning 0 when nothing is missing, a batch is
    /// already running, or the scheduler is closed.
    pub async fn ensure_prefetched(&self) -> usize {
        let mut appended = 0;
        // Checked again after the flag clears: a kick refused while the
        // last round was finishing relies on this pass
        while !self.is_closed() && self.prefetch_deficit() > 0 {
            if self
                .generating
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                break;
            }
            let _generating = GeneratingGuard(&self.generating);
            appended += self.run_batch().await;
        }
        appended
    }

    /// Generate until the deficit is met, re-evaluating after each round
    /// since the cursor may have moved meanwhile.
    async fn run_batch(&self) -> usize {
        let mut appended = 0;
        loop {
            let deficit = self.prefetch_deficit();
            if deficit == 0 || self.is_closed() {
                return appended;
            }
            tracing::debug!(station_id = %self.station_id, deficit, "Prefetching tracks");

            for n in 1..=deficit {
                tracing::info!(
                    station_id = %self.station_id,
                    track = n,
                    of = deficit,
                    "Generating track"
                );
                let track = self.generate_one().await;
                if self.append(track).is_none() {
                    return appended;
                }
                appended += 1;
            }
        }
    }

    /// Generate one track. Never fails: problems yield a `Failed` track.
    pub async fn generate_one(&self) -> Track {
        match self.try_generate().await {
            Ok(track) => {
                tracing::info!(
                    station_id = %self.station_id,
                    track_id = %track.id,
                    title = %track.display_title(),
                    "Track ready"
                );
                track
            }
            Err(e) => {
                tracing::warn!(station_id = %self.station_id, error = %e, "Track generation failed");
                Track::failed(&self.station_id)
            }
        }
    }

    /// One generation attempt, holding the gate throughout.
    pub async fn try_generate(&self) -> Result<Track, GenerationError> {
        if self.gate.is_held() {
            tracing::debug!(
                station_id = %self.station_id,
                waiting = self.gate.waiting(),
                "Composition gate busy, queuing"
            );
        }
        let _pass = self.gate.acquire().await?;

        let profile = self
            .repo
            .find_station(&self.station_id)
            .await?
            .ok_or_else(|| GenerationError::StationNotFound(self.station_id.clone()))?;

        let plan = plan_for_station(&profile, self.settings.track_duration_ms);
        let audio = self.composer.compose(&plan).await?;

        let track_id = new_track_id();
        let url = self.store.store(audio, &format!("{}.mp3", track_id)).await?;

        // Read-then-write; concurrent sessions on one station may collide
        let order_index = self.repo.next_order_index(&self.station_id).await?;
        let new_track = NewTrack {
            id: track_id,
            title: format!("Track {}", order_index + 1),
            duration_ms: Some(plan.total_duration_ms()),
            url,
            genre: profile.genre_label(),
            styles: profile.selected_styles.clone(),
            composition_plan: Some(plan),
            generated_at: Utc::now(),
        };

        let track = self
            .repo
            .create_track(&self.station_id, &new_track, order_index)
            .await?;
        Ok(track)
    }

    /// Stop scheduling. In-flight work finishes but is not appended.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.gate.close();
        self.emit(QueueEvent::Closed);
        tracing::debug!(station_id = %self.station_id, "Scheduler closed");
    }
}

/// Clears the generating flag on every exit path.
struct GeneratingGuard<'a>(&'a AtomicBool);

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::traits::mocks::MockComposer;
    use crate::db::TrackRepository;
    use crate::db::repository::mocks::MemoryRepository;
    use crate::model::TrackState;
    use crate::storage::mocks::MemoryStore;
    use crate::test_utils::{mock_ready_track, mock_station};
    use std::time::Duration;

    struct Harness {
        scheduler: Arc<TrackScheduler>,
        composer: Arc<MockComposer>,
        store: Arc<MemoryStore>,
        repo: Arc<MemoryRepository>,
    }

    fn harness(composer: MockComposer) -> Harness {
        harness_with(composer, MemoryStore::new())
    }

    fn harness_with(composer: MockComposer, store: MemoryStore) -> Harness {
        let station = mock_station();
        let composer = Arc::new(composer);
        let store = Arc::new(store);
        let repo = Arc::new(MemoryRepository::with_station(station.clone()));
        let scheduler = Arc::new(TrackScheduler::new(
            station.id,
            composer.clone(),
            store.clone(),
            repo.clone(),
            SchedulerSettings {
                prefetch_threshold: 2,
                track_duration_ms: 60_000,
            },
        ));
        Harness {
            scheduler,
            composer,
            store,
            repo,
        }
    }

    #[tokio::test]
    async fn test_empty_queue_generates_three() {
        let h = harness(MockComposer::succeeding());
        assert_eq!(h.scheduler.prefetch_deficit(), 3);

        assert_eq!(h.scheduler.ensure_prefetched().await, 3);
        let queue = h.scheduler.snapshot();
        assert_eq!(queue.len(), 3);
        assert!(queue.tracks().iter().all(|t| t.state == TrackState::Ready));
        assert_eq!(h.composer.calls(), 3);
        assert_eq!(h.store.len(), 3);
        assert!(!h.scheduler.is_generating());
    }

    #[tokio::test]
    async fn test_deficit_math() {
        let h = harness(MockComposer::succeeding());
        h.scheduler.queue.lock().push(mock_ready_track("s", 0));
        assert_eq!(h.scheduler.prefetch_deficit(), 1);

        h.scheduler.queue.lock().push(mock_ready_track("s", 1));
        h.scheduler.queue.lock().push(mock_ready_track("s", 2));
        assert_eq!(h.scheduler.prefetch_deficit(), 0);
        assert_eq!(h.scheduler.ensure_prefetched().await, 0);
        assert_eq!(h.composer.calls(), 0);
    }

    #[tokio::test]
    async fn test_generated_track_is_persisted_with_metadata() {
        let h = harness(MockComposer::succeeding());
        let track = h.scheduler.generate_one().await;

        assert_eq!(track.state, TrackState::Ready);
        assert_eq!(track.order_index, Some(0));
        assert_eq!(track.metadata.title.as_deref(), Some("Track 1"));
        assert_eq!(track.metadata.genre, "lofi, jazz");
        assert_eq!(track.duration_ms, Some(60_000));
        assert_eq!(track.url, Some(format!("memory://{}.mp3", track.id)));
        assert!(h.store.get(&format!("{}.mp3", track.id)).is_some());

        let second = h.scheduler.generate_one().await;
        assert_eq!(second.order_index, Some(1));
        assert_eq!(second.metadata.title.as_deref(), Some("Track 2"));
        assert_eq!(h.repo.track_count(), 2);

        let plans = h.composer.plans();
        assert_eq!(plans[0].total_duration_ms(), 60_000);
    }

    #[tokio::test]
    async fn test_failure_continues_batch() {
        let h = harness(MockComposer::scripted(vec![
            Ok(b"audio".to_vec()),
            Err(ComposeError::RateLimited),
            Ok(b"audio".to_vec()),
        ]));

        assert_eq!(h.scheduler.ensure_prefetched().await, 3);
        let states: Vec<_> = h.scheduler.snapshot().tracks().iter().map(|t| t.state).collect();
        assert_eq!(
            states,
            vec![TrackState::Ready, TrackState::Failed, TrackState::Ready]
        );
        // Failed tracks are not persisted and do not consume an order index
        let persisted = h.repo.tracks_for_station(h.scheduler.station_id()).await.unwrap();
        let indexes: Vec<_> = persisted.iter().filter_map(|t| t.order_index).collect();
        assert_eq!(indexes, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_every_failure_mode_yields_failed_track() {
        let failing_compose = harness(MockComposer::failing(ComposeError::Unauthorized));
        assert_eq!(failing_compose.scheduler.generate_one().await.state, TrackState::Failed);

        let failing_store = harness_with(MockComposer::succeeding(), MemoryStore::failing());
        assert_eq!(failing_store.scheduler.generate_one().await.state, TrackState::Failed);

        let failing_repo = harness(MockComposer::succeeding());
        failing_repo.repo.fail_track_writes(true);
        assert_eq!(failing_repo.scheduler.generate_one().await.state, TrackState::Failed);

        // Gate is free again after every failure
        assert!(!failing_repo.scheduler.gate().is_held());
    }

    #[tokio::test]
    async fn test_missing_station_fails_without_composing() {
        let composer = Arc::new(MockComposer::succeeding());
        let scheduler = TrackScheduler::new(
            "station_missing",
            composer.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryRepository::new()),
            SchedulerSettings::default(),
        );

        let result = scheduler.try_generate().await;
        assert!(matches!(result, Err(GenerationError::StationNotFound(_))));
        assert_eq!(scheduler.generate_one().await.state, TrackState::Failed);
        assert_eq!(composer.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_ids_are_unique() {
        let h = harness(MockComposer::failing(ComposeError::RateLimited));
        h.scheduler.ensure_prefetched().await;
        let queue = h.scheduler.snapshot();
        let ids: std::collections::HashSet<_> = queue.tracks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_calls_run_one_batch() {
        let h = harness(MockComposer::succeeding().with_delay(Duration::from_millis(10)));
        let (a, b) = tokio::join!(h.scheduler.ensure_prefetched(), h.scheduler.ensure_prefetched());

        assert_eq!(a + b, 3);
        assert!(a == 0 || b == 0);
        assert_eq!(h.scheduler.snapshot().len(), 3);
        assert_eq!(h.composer.peak_in_flight(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_direct_generations_are_serialized() {
        let h = harness(MockComposer::succeeding().with_delay(Duration::from_millis(5)));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let scheduler = Arc::clone(&h.scheduler);
                tokio::spawn(async move { scheduler.generate_one().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().state, TrackState::Ready);
        }
        assert_eq!(h.composer.peak_in_flight(), 1);

        // Serialized read-then-write keeps order indexes distinct
        let mut indexes: Vec<_> = h
            .repo
            .tracks_for_station(h.scheduler.station_id())
            .await
            .unwrap()
            .iter()
            .filter_map(|t| t.order_index)
            .collect();
        indexes.sort();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_batch_rechecks_after_cursor_moves() {
        let h = harness(MockComposer::succeeding().with_delay(Duration::from_millis(5)));
        let mut events = h.scheduler.subscribe();

        let scheduler = Arc::clone(&h.scheduler);
        let batch = tokio::spawn(async move { scheduler.ensure_prefetched().await });

        // Move the cursor forward once the second track lands
        loop {
            if let Ok(QueueEvent::TrackAppended { index: 1, .. }) = events.recv().await {
                break;
            }
        }
        h.scheduler.queue.lock().advance_skipping_failed();

        let appended = batch.await.unwrap();
        let queue = h.scheduler.snapshot();
        assert_eq!(queue.prefetch_deficit(2), 0);
        assert_eq!(queue.current_index(), 1);
        assert_eq!(appended, 4);
        assert_eq!(queue.len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_move_while_batch_finishes_still_tops_up() {
        for _ in 0..50 {
            let h = harness(MockComposer::succeeding());
            let mut events = h.scheduler.subscribe();
            let scheduler = Arc::clone(&h.scheduler);
            let batch = tokio::spawn(async move { scheduler.ensure_prefetched().await });

            // Advance the moment the last track of the batch lands
            loop {
                if let Ok(QueueEvent::TrackAppended { index: 2, .. }) = events.recv().await {
                    break;
                }
            }
            h.scheduler.advance();
            batch.await.unwrap();

            tokio::time::timeout(Duration::from_secs(2), async {
                while h.scheduler.prefetch_deficit() > 0 || h.scheduler.is_generating() {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
            .await
            .expect("queue was not topped up after the cursor moved");

            let queue = h.scheduler.snapshot();
            assert_eq!(queue.current_index(), 1);
            assert_eq!(queue.len(), 4);
            h.scheduler.close();
        }
    }

    #[tokio::test]
    async fn test_close_discards_in_flight_result() {
        let h = harness(MockComposer::succeeding().with_delay(Duration::from_millis(30)));
        let scheduler = Arc::clone(&h.scheduler);
        let batch = tokio::spawn(async move { scheduler.ensure_prefetched().await });

        tokio::time::sleep(Duration::from_millis(5)).await;
        h.scheduler.close();

        assert_eq!(batch.await.unwrap(), 0);
        assert!(h.scheduler.snapshot().is_empty());
        assert_eq!(h.composer.calls(), 1);
        assert_eq!(h.scheduler.ensure_prefetched().await, 0);
    }

    #[tokio::test]
    async fn test_events_report_appends_in_order() {
        let h = harness(MockComposer::succeeding());
        let mut events = h.scheduler.subscribe();
        h.scheduler.ensure_prefetched().await;

        let mut indexes = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let QueueEvent::TrackAppended { index, .. } = event {
                indexes.push(index);
            }
        }
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_advance_reports_skipped_tracks() {
        let h = harness(MockComposer::scripted(vec![
            Ok(b"audio".to_vec()),
            Err(ComposeError::RateLimited),
            Ok(b"audio".to_vec()),
        ]));
        h.scheduler.ensure_prefetched().await;
        let mut events = h.scheduler.subscribe();

        let advance = h.scheduler.advance();
        assert!(advance.moved);
        assert_eq!(advance.skipped.len(), 1);
        assert_eq!(h.scheduler.snapshot().current_index(), 2);
        assert!(matches!(events.try_recv(), Ok(QueueEvent::TryingNext { .. })));
        assert!(matches!(events.try_recv(), Ok(QueueEvent::CursorMoved { index: 2 })));
        h.scheduler.close();
    }
}

//! Playback session - drives an output from a scheduler's queue.
//!
//! A session seeds the scheduler with the station's persisted tracks,
//! keeps the output loaded with the current playable track, and reacts
//! to new tracks in the background: if playback is parked on a failed
//! track when a later one arrives, it moves on.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::output::{PlaybackOutput, PlayerError};
use super::queue::QueueState;
use super::scheduler::{QueueEvent, TrackScheduler};
use crate::model::Track;

/// One listener's playback of one station.
pub struct PlaybackSession {
    inner: Arc<SessionInner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

struct SessionInner {
    scheduler: Arc<TrackScheduler>,
    output: Arc<dyn PlaybackOutput>,
    /// Id of the track currently loaded into the output
    loaded: Mutex<Option<String>>,
}

impl PlaybackSession {
    /// Start a session over `tracks` (usually the station's persisted ones).
    ///
    /// Must be called inside a tokio runtime. Prefetching starts at once.
    pub fn start(
        scheduler: Arc<TrackScheduler>,
        output: Arc<dyn PlaybackOutput>,
        tracks: Vec<Track>,
    ) -> Self {
        let inner = Arc::new(SessionInner {
            scheduler: Arc::clone(&scheduler),
            output,
            loaded: Mutex::new(None),
        });

        let events = scheduler.subscribe();
        let listener = tokio::spawn(listen(Arc::downgrade(&inner), events));

        tracing::info!(
            station_id = %scheduler.station_id(),
            tracks = tracks.len(),
            "Starting playback session"
        );
        scheduler.seed(tracks);
        inner.sync_output_logged();

        Self {
            inner,
            listener: Mutex::new(Some(listener)),
        }
    }

    pub fn scheduler(&self) -> &Arc<TrackScheduler> {
        &self.inner.scheduler
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.scheduler.current_track()
    }

    pub fn queue(&self) -> QueueState {
        self.inner.scheduler.snapshot()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.scheduler.is_playing()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.scheduler.subscribe()
    }

    /// Start or resume playback.
    ///
    /// With nothing playable yet, playback starts as soon as a track arrives.
    pub fn play(&self) -> Result<(), PlayerError> {
        self.ensure_open()?;
        self.inner.scheduler.set_playing(true);
        let loaded_now = self.inner.sync_output()?;
        if !loaded_now && self.inner.loaded.lock().is_some() {
            self.inner.output.play()?;
        }
        Ok(())
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        self.ensure_open()?;
        self.inner.output.pause()?;
        self.inner.scheduler.set_playing(false);
        Ok(())
    }

    /// Skip forward, stepping over failed tracks. Returns whether the cursor moved.
    pub fn next(&self) -> Result<bool, PlayerError> {
        self.ensure_open()?;
        let advance = self.inner.scheduler.advance();
        self.inner.sync_output()?;
        Ok(advance.moved)
    }

    /// Go back one track. Returns whether the cursor moved.
    pub fn previous(&self) -> Result<bool, PlayerError> {
        self.ensure_open()?;
        let moved = self.inner.scheduler.retreat();
        self.inner.sync_output()?;
        Ok(moved)
    }

    /// The current track finished playing.
    pub fn on_track_ended(&self) -> Result<bool, PlayerError> {
        self.next()
    }

    /// Tear the session down: no new generations, output paused.
    pub fn close(&self) {
        let scheduler = &self.inner.scheduler;
        if scheduler.is_closed() {
            return;
        }
        scheduler.close();
        if let Err(e) = self.inner.output.pause() {
            tracing::warn!(error = %e, "Failed to pause output on close");
        }
        scheduler.set_playing(false);
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        tracing::info!(station_id = %scheduler.station_id(), "Playback session closed");
    }

    fn ensure_open(&self) -> Result<(), PlayerError> {
        if self.inner.scheduler.is_closed() {
            return Err(PlayerError::Closed);
        }
        Ok(())
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl SessionInner {
    /// Load the current track into the output if it isn't already.
    ///
    /// Returns whether a new track was loaded (and started, when playing).
    /// The `loaded` lock covers reading the cursor and loading its track,
    /// so concurrent callers always leave the output on the newest cursor.
    fn sync_output(&self) -> Result<bool, PlayerError> {
        let mut loaded = self.loaded.lock();
        let Some(track) = self.scheduler.current_track() else {
            return Ok(false);
        };
        if !track.is_playable() {
            return Ok(false);
        }
        if loaded.as_deref() == Some(track.id.as_str()) {
            return Ok(false);
        }
        self.output.load(&track)?;
        *loaded = Some(track.id.clone());
        drop(loaded);

        if self.scheduler.is_playing() {
            self.output.play()?;
        }
        Ok(true)
    }

    fn sync_output_logged(&self) {
        if let Err(e) = self.sync_output() {
            tracing::warn!(error = %e, "Failed to load current track");
        }
    }

    /// A track landed: leave a failed current track and load whatever is current.
    fn on_track_appended(&self) {
        self.scheduler.leave_failed();
        self.sync_output_logged();
    }
}

async fn listen(session: Weak<SessionInner>, mut events: broadcast::Receiver<QueueEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "Session listener lagged, resyncing");
                if let Some(inner) = session.upgrade() {
                    inner.on_track_appended();
                }
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let Some(inner) = session.upgrade() else {
            break;
        };
        match event {
            QueueEvent::TrackAppended { .. } => inner.on_track_appended(),
            QueueEvent::Closed => break,
            _ => {}
        }
    }
}

//! Playback output - whatever actually renders the audio.
//!
//! The session only needs three verbs from it. The CLI uses
//! [`LogOutput`], which reports what would be playing.

use parking_lot::Mutex;

use crate::model::Track;

/// Player errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlayerError {
    #[error("Track {0} has no playable audio")]
    NotPlayable(String),

    #[error("Audio output failed: {0}")]
    Output(String),

    #[error("Playback session is closed")]
    Closed,
}

/// Audio sink driven by a playback session.
pub trait PlaybackOutput: Send + Sync {
    /// Load a track, replacing whatever was loaded.
    fn load(&self, track: &Track) -> Result<(), PlayerError>;

    /// Start or resume the loaded track.
    fn play(&self) -> Result<(), PlayerError>;

    fn pause(&self) -> Result<(), PlayerError>;
}

/// Output that only logs.
#[derive(Debug, Default)]
pub struct LogOutput {
    loaded: Mutex<Option<String>>,
}

impl LogOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title of the loaded track.
    pub fn loaded(&self) -> Option<String> {
        self.loaded.lock().clone()
    }
}

impl PlaybackOutput for LogOutput {
    fn load(&self, track: &Track) -> Result<(), PlayerError> {
        let url = track
            .url
            .as_deref()
            .ok_or_else(|| PlayerError::NotPlayable(track.id.clone()))?;
        tracing::info!(
            target: "radio_roulette::tune",
            title = %track.display_title(),
            url = %url,
            "Loaded"
        );
        *self.loaded.lock() = Some(track.display_title());
        Ok(())
    }

    fn play(&self) -> Result<(), PlayerError> {
        if let Some(title) = self.loaded.lock().as_deref() {
            tracing::info!(target: "radio_roulette::tune", title = %title, "Playing");
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        if let Some(title) = self.loaded.lock().as_deref() {
            tracing::info!(target: "radio_roulette::tune", title = %title, "Paused");
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Track;
    use crate::test_utils::mock_ready_track;

    #[test]
    fn test_log_output_tracks_loaded_title() {
        let output = LogOutput::new();
        assert!(output.loaded().is_none());
        assert!(output.play().is_ok());

        let track = mock_ready_track("station_1", 0);
        output.load(&track).unwrap();
        assert_eq!(output.loaded(), Some(track.display_title()));
    }

    #[test]
    fn test_log_output_rejects_failed_track() {
        let output = LogOutput::new();
        let failed = Track::failed("station_1");
        assert!(matches!(output.load(&failed), Err(PlayerError::NotPlayable(_))));
    }
}

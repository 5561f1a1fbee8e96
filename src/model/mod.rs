//! Core data models for stations and their generated tracks.
//!
//! Defines the primary entities: [`StationProfile`] and [`Track`].
//! Database rows live in [`crate::db`] and are converted into these
//! types at the repository boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Artist name attached to every generated track.
pub const GENERATED_ARTIST: &str = "AI Generated";

/// Genre reported by tracks whose generation failed.
pub const UNKNOWN_GENRE: &str = "unknown";

/// Reproducibility key for a roulette spin.
///
/// Callers may hand in either text or a number; both are rendered to the
/// same string form before hashing, so `Seed::Number(42)` and
/// `Seed::Text("42")` select the same styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(i64),
    Text(String),
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Number(n) => write!(f, "{}", n),
            Seed::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Text(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed::Text(value)
    }
}

impl From<i64> for Seed {
    fn from(value: i64) -> Self {
        Seed::Number(value)
    }
}

/// A station: the genres it must cover and the styles the roulette picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationProfile {
    /// Station ID (`station_<uuid>`)
    pub id: String,
    /// Optional display name
    pub name: Option<String>,
    /// Genres in the order the user chose them (never empty)
    pub required_genres: Vec<String>,
    /// Styles drawn by the roulette, grouped by genre in genre order
    pub selected_styles: Vec<String>,
    /// Seed that reproduces `selected_styles`
    pub seed: Option<Seed>,
    /// Previously generated tracks, in playback order
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl StationProfile {
    /// Create a profile with a fresh station ID and no tracks.
    pub fn new(required_genres: Vec<String>, selected_styles: Vec<String>, seed: Option<Seed>) -> Self {
        Self {
            id: new_station_id(),
            name: None,
            required_genres,
            selected_styles,
            seed,
            tracks: Vec::new(),
        }
    }

    /// Genre label used for generated tracks ("lofi, jazz").
    pub fn genre_label(&self) -> String {
        self.required_genres.join(", ")
    }

    /// Display name, falling back to the genre label.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.genre_label())
    }
}

/// Lifecycle of a track.
///
/// `Pending → Generating → Ready | Failed`. A `Ready` track may be marked
/// `Playing` while the playback layer has it active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    #[default]
    Pending,
    Generating,
    Ready,
    Playing,
    Failed,
}

impl TrackState {
    /// Whether the track has audio that can be handed to the output.
    pub fn is_playable(self) -> bool {
        matches!(self, TrackState::Ready | TrackState::Playing)
    }
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrackState::Pending => "pending",
            TrackState::Generating => "generating",
            TrackState::Ready => "ready",
            TrackState::Playing => "playing",
            TrackState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Descriptive metadata for a generated track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: String,
    pub styles: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// One generated audio unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    /// Playable URL (only for ready tracks)
    pub url: Option<String>,
    pub metadata: TrackMetadata,
    /// Duration in milliseconds
    pub duration_ms: Option<u64>,
    pub state: TrackState,
    pub station_id: String,
    /// Position among the station's persisted tracks
    pub order_index: Option<i64>,
}

impl Track {
    /// Placeholder produced when generation fails.
    ///
    /// Carries a unique synthetic id and empty styles so the queue keeps
    /// its shape; playback skips it.
    pub fn failed(station_id: impl Into<String>) -> Self {
        Self {
            id: new_failed_track_id(),
            url: None,
            metadata: TrackMetadata {
                title: None,
                artist: None,
                genre: UNKNOWN_GENRE.to_string(),
                styles: Vec::new(),
                generated_at: Utc::now(),
            },
            duration_ms: None,
            state: TrackState::Failed,
            station_id: station_id.into(),
            order_index: None,
        }
    }

    /// Title for display, falling back to the id.
    pub fn display_title(&self) -> String {
        self.metadata
            .title
            .clone()
            .unwrap_or_else(|| self.id.clone())
    }

    pub fn is_playable(&self) -> bool {
        self.state.is_playable() && self.url.is_some()
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Generate a new station ID.
pub fn new_station_id() -> String {
    format!("station_{}", uuid::Uuid::new_v4().simple())
}

/// Generate a new track ID.
pub fn new_track_id() -> String {
    format!("track_{}", uuid::Uuid::new_v4().simple())
}

/// Generate an ID for a failed placeholder track.
pub fn new_failed_track_id() -> String {
    format!("failed_{}", uuid::Uuid::new_v4().simple())
}

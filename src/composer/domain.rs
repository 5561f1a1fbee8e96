//! Domain types for music composition.
//!
//! [`CompositionPlan`] is what we send to the composition service. Its
//! field names are already in the wire format (snake_case), so the same
//! type is serialized into requests and stored alongside each track.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// A chunk of encoded audio (MP3) coming back from the composer.
pub type AudioChunk = Result<Vec<u8>, ComposeError>;

/// Audio byte stream produced by a composition call.
pub type AudioStream = BoxStream<'static, AudioChunk>;

/// Sectioned, styled description of one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionPlan {
    pub positive_global_styles: Vec<String>,
    pub negative_global_styles: Vec<String>,
    pub sections: Vec<PlanSection>,
}

impl CompositionPlan {
    /// Total duration across all sections.
    pub fn total_duration_ms(&self) -> u64 {
        self.sections.iter().map(|s| s.duration_ms).sum()
    }
}

/// One section of a plan (intro, main, outro).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSection {
    pub section_name: String,
    pub positive_local_styles: Vec<String>,
    pub negative_local_styles: Vec<String>,
    pub duration_ms: u64,
    /// Lyric lines; generated stations are instrumental
    pub lines: Vec<String>,
}

/// Errors that can occur while composing
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComposeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed with HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Composer rejected the API key")]
    Unauthorized,

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("No API key configured for the composer")]
    MissingApiKey,
}

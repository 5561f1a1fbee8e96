//! Audio storage - where generated tracks end up.
//!
//! The scheduler hands a composed byte stream and a suggested file name
//! to an [`AudioStore`] and gets back a URL the playback side can load.
//! [`LocalStore`] keeps files in a cache directory.

pub mod local;

use async_trait::async_trait;

use crate::composer::{AudioStream, ComposeError};
pub use local::LocalStore;

/// Errors that can occur while storing audio
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Composer returned no audio for {0}")]
    EmptyAudio(String),

    #[error("Audio stream failed: {0}")]
    Source(#[from] ComposeError),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// Persists audio and makes it retrievable by URL.
#[async_trait]
pub trait AudioStore: Send + Sync {
    /// Drain `audio` into storage under `name` and return its URL.
    async fn store(&self, audio: AudioStream, name: &str) -> Result<String, StorageError>;
}

//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`ComposeError`], [`StorageError`], [`GenerationError`]), while the
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: persistence and lookup errors, shared by the db layer
//!   and the CLI
//! - sqlx and JSON column errors convert into it with `?`
//! - "Not found" is an explicit variant so the CLI can report it cleanly
//!   instead of treating it as a crash
//!
//! [`ComposeError`]: crate::composer::ComposeError
//! [`StorageError`]: crate::storage::StorageError
//! [`GenerationError`]: crate::player::GenerationError
//!
//! # Example
//!
//! ```ignore
//! use radio_roulette::error::{Error, Result};
//!
//! async fn load(pool: &SqlitePool, id: &str) -> Result<StationProfile> {
//!     let record = db::get_station(pool, id).await?; // sqlx errors auto-convert
//!     record.ok_or_else(|| Error::not_found("station", id))?.into_profile()
//! }
//! ```

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Persistence and lookup error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested station or track does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Caller supplied something unusable (empty genre list, bad seed, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a not found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

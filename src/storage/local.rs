//! Local audio cache.
//!
//! Writes composed audio into a cache directory. Each file is streamed
//! into `<name>.part` and renamed into place once complete, so readers
//! never see a half-written track.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::{AudioStore, StorageError};
use crate::composer::AudioStream;

/// Directory-backed audio store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    cache_dir: PathBuf,
    public_base_url: Option<String>,
}

impl LocalStore {
    /// Create a store in the specified directory.
    ///
    /// The directory is created on first write.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            public_base_url: None,
        }
    }

    /// Create a store in the default location (user cache directory).
    pub fn default_location() -> Self {
        Self::new(default_cache_dir())
    }

    /// Serve stored files under `base_url` instead of `file://` URLs.
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.public_base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path a file with this name is (or would be) stored at.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.cache_dir.join(name))
    }

    /// Find a previously stored file.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = self.path_for(name).ok()?;
        path.is_file().then_some(path)
    }

    fn url_for(&self, name: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, urlencoding::encode(name)),
            None => format!("file://{}", path.display()),
        }
    }
}

/// `<user cache dir>/radio-roulette/tracks`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("radio-roulette")
        .join("tracks")
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl AudioStore for LocalStore {
    async fn store(&self, mut audio: AudioStream, name: &str) -> Result<String, StorageError> {
        let final_path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let part_path = self.cache_dir.join(format!("{}.part", name));
        let mut file = tokio::fs::File::create(&part_path).await?;
        let mut written = 0usize;

        let copied: Result<(), StorageError> = async {
            while let Some(chunk) = audio.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;
            Ok(())
        }
        .await;
        drop(file);

        if let Err(e) = copied {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }

        if written == 0 {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(StorageError::EmptyAudio(name.to_string()));
        }

        tokio::fs::rename(&part_path, &final_path).await?;
        let final_path = tokio::fs::canonicalize(&final_path).await?;

        tracing::debug!(path = %final_path.display(), bytes = written, "Stored track audio");
        Ok(self.url_for(name, &final_path))
    }
}

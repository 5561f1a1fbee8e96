//! Repository traits over station and track persistence.
//!
//! The scheduler and CLI talk to these traits instead of the free
//! functions in [`crate::db`], so the generation pipeline can run against
//! an in-memory repository in tests. Absence is always `Ok(None)` (or an
//! empty list), never an error.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{NewTrack, StationUpdate};
use crate::error::Result;
use crate::model::{StationProfile, Track};

/// Station persistence.
#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn find_station(&self, id: &str) -> Result<Option<StationProfile>>;

    async fn create_station(&self, profile: &StationProfile) -> Result<StationProfile>;

    /// Merge `update` into the stored station.
    async fn update_station(&self, id: &str, update: &StationUpdate) -> Result<Option<StationProfile>>;

    async fn delete_station(&self, id: &str) -> Result<bool>;

    /// Stations in creation order.
    async fn list_stations(&self, limit: i64, offset: i64) -> Result<Vec<StationProfile>>;
}

/// Track persistence.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    async fn create_track(&self, station_id: &str, track: &NewTrack, order_index: i64) -> Result<Track>;

    async fn find_track(&self, id: &str) -> Result<Option<Track>>;

    /// Tracks ordered by order index, then creation time.
    async fn tracks_for_station(&self, station_id: &str) -> Result<Vec<Track>>;

    async fn next_order_index(&self, station_id: &str) -> Result<i64>;

    async fn delete_track(&self, id: &str) -> Result<bool>;

    async fn delete_tracks_for_station(&self, station_id: &str) -> Result<u64>;
}

/// Both halves of persistence, as the scheduler needs them.
pub trait Repository: StationRepository + TrackRepository {}

impl<T: StationRepository + TrackRepository> Repository for T {}

/// Load a station together with its persisted tracks.
pub async fn load_station_with_tracks<R>(repo: &R, id: &str) -> Result<Option<StationProfile>>
where
    R: Repository + ?Sized,
{
    let Some(mut profile) = repo.find_station(id).await? else {
        return Ok(None);
    };
    profile.tracks = repo.tracks_for_station(id).await?;
    Ok(Some(profile))
}

/// Delete a station and all of its tracks.
///
/// Returns `false` when the station did not exist.
pub async fn delete_station_cascade<R>(repo: &R, id: &str) -> Result<bool>
where
    R: Repository + ?Sized,
{
    let tracks = repo.delete_tracks_for_station(id).await?;
    let deleted = repo.delete_station(id).await?;
    if deleted {
        tracing::info!(station_id = %id, tracks, "Deleted station");
    }
    Ok(deleted)
}

/// SQLite-backed repository.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StationRepository for SqliteRepository {
    async fn find_station(&self, id: &str) -> Result<Option<StationProfile>> {
        super::get_station(&self.pool, id)
            .await?
            .map(|record| record.into_profile())
            .transpose()
    }

    async fn create_station(&self, profile: &StationProfile) -> Result<StationProfile> {
        super::insert_station(&self.pool, profile).await?.into_profile()
    }

    async fn update_station(&self, id: &str, update: &StationUpdate) -> Result<Option<StationProfile>> {
        super::update_station(&self.pool, id, update)
            .await?
            .map(|record| record.into_profile())
            .transpose()
    }

    async fn delete_station(&self, id: &str) -> Result<bool> {
        Ok(super::delete_station(&self.pool, id).await?)
    }

    async fn list_stations(&self, limit: i64, offset: i64) -> Result<Vec<StationProfile>> {
        super::list_stations(&self.pool, limit, offset)
            .await?
            .into_iter()
            .map(|record| record.into_profile())
            .collect()
    }
}

#[async_trait]
impl TrackRepository for SqliteRepository {
    async fn create_track(&self, station_id: &str, track: &NewTrack, order_index: i64) -> Result<Track> {
        super::insert_track(&self.pool, station_id, track, order_index)
            .await?
            .into_track()
    }

    async fn find_track(&self, id: &str) -> Result<Option<Track>> {
        super::get_track(&self.pool, id)
            .await?
            .map(|record| record.into_track())
            .transpose()
    }

    async fn tracks_for_station(&self, station_id: &str) -> Result<Vec<Track>> {
        super::tracks_for_station(&self.pool, station_id)
            .await?
            .into_iter()
            .map(|record| record.into_track())
            .collect()
    }

    async fn next_order_index(&self, station_id: &str) -> Result<i64> {
        Ok(super::next_order_index(&self.pool, station_id).await?)
    }

    async fn delete_track(&self, id: &str) -> Result<bool> {
        Ok(super::delete_track(&self.pool, id).await?)
    }

    async fn delete_tracks_for_station(&self, station_id: &str) -> Result<u64> {
        Ok(super::delete_tracks_for_station(&self.pool, station_id).await?)
    }
}

//! Database module for station and track persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Station CRUD and paging
//! - Track creation, lookup by station and order index allocation
//!
//! List-valued columns (genres, styles, composition plan) and the seed
//! are stored as JSON text. Timestamps are RFC 3339 UTC strings with
//! microsecond precision, so they sort lexically in time order.
//!
//! # Example
//!
//! ```ignore
//! use radio_roulette::db::{init_db, list_stations};
//!
//! let pool = init_db("sqlite:radio_roulette.db").await?;
//! let stations = list_stations(&pool, 50, 0).await?;
//! ```

pub mod repository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::composer::CompositionPlan;
use crate::error::{Error, Result};
use crate::model::{GENERATED_ARTIST, Seed, StationProfile, Track, TrackMetadata, TrackState};

pub use repository::{Repository, SqliteRepository, StationRepository, TrackRepository};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "radio_roulette.db";

/// Default page size for station listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;

    Ok(pool)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::invalid_input(format!("bad timestamp '{}': {}", value, e)))
}

// ============================================================================
// Stations
// ============================================================================

/// Station row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StationRecord {
    pub id: String,
    pub name: Option<String>,
    /// JSON array of genres
    pub required_genres: String,
    /// JSON array of styles
    pub selected_styles: String,
    /// JSON string or number
    pub seed: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl StationRecord {
    /// Decode the JSON columns into a profile (without tracks).
    pub fn into_profile(self) -> Result<StationProfile> {
        let seed = self.seed.as_deref().map(serde_json::from_str::<Seed>).transpose()?;
        Ok(StationProfile {
            id: self.id,
            name: self.name,
            required_genres: serde_json::from_str(&self.required_genres)?,
            selected_styles: serde_json::from_str(&self.selected_styles)?,
            seed,
            tracks: Vec::new(),
        })
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Partial station update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationUpdate {
    pub name: Option<String>,
    pub required_genres: Option<Vec<String>>,
    pub selected_styles: Option<Vec<String>>,
    pub seed: Option<Seed>,
}

impl StationUpdate {
    /// Merge this update into `profile`.
    pub fn apply_to(&self, profile: &mut StationProfile) {
        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(genres) = &self.required_genres {
            profile.required_genres = genres.clone();
        }
        if let Some(styles) = &self.selected_styles {
            profile.selected_styles = styles.clone();
        }
        if let Some(seed) = &self.seed {
            profile.seed = Some(seed.clone());
        }
    }
}

const STATION_COLUMNS: &str =
    "id, name, required_genres, selected_styles, seed, created_at, updated_at";

/// Insert a new station.
pub async fn insert_station(pool: &SqlitePool, profile: &StationProfile) -> Result<StationRecord> {
    let now = timestamp(Utc::now());
    let seed = profile.seed.as_ref().map(serde_json::to_string).transpose()?;

    let record = sqlx::query_as::<_, StationRecord>(&format!(
        r#"
        INSERT INTO stations (id, name, required_genres, selected_styles, seed, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        STATION_COLUMNS
    ))
    .bind(&profile.id)
    .bind(&profile.name)
    .bind(serde_json::to_string(&profile.required_genres)?)
    .bind(serde_json::to_string(&profile.selected_styles)?)
    .bind(seed)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get a station by ID.
pub async fn get_station(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<StationRecord>> {
    sqlx::query_as::<_, StationRecord>(&format!(
        "SELECT {} FROM stations WHERE id = ?",
        STATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Merge `update` into a stored station and refresh `updated_at`.
///
/// Returns `None` if the station does not exist.
pub async fn update_station(
    pool: &SqlitePool,
    id: &str,
    update: &StationUpdate,
) -> Result<Option<StationRecord>> {
    let Some(existing) = get_station(pool, id).await? else {
        return Ok(None);
    };

    let mut profile = existing.into_profile()?;
    update.apply_to(&mut profile);
    let seed = profile.seed.as_ref().map(serde_json::to_string).transpose()?;

    let record = sqlx::query_as::<_, StationRecord>(&format!(
        r#"
        UPDATE stations
        SET name = ?, required_genres = ?, selected_styles = ?, seed = ?, updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        STATION_COLUMNS
    ))
    .bind(&profile.name)
    .bind(serde_json::to_string(&profile.required_genres)?)
    .bind(serde_json::to_string(&profile.selected_styles)?)
    .bind(seed)
    .bind(timestamp(Utc::now()))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Delete a station row. Returns whether anything was deleted.
pub async fn delete_station(pool: &SqlitePool, id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM stations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// List stations, oldest first.
pub async fn list_stations(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<StationRecord>> {
    sqlx::query_as::<_, StationRecord>(&format!(
        "SELECT {} FROM stations ORDER BY created_at, id LIMIT ? OFFSET ?",
        STATION_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Tracks
// ============================================================================

/// A successfully generated track, ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub id: String,
    pub title: String,
    pub duration_ms: Option<u64>,
    pub url: String,
    pub composition_plan: Option<CompositionPlan>,
    pub genre: String,
    pub styles: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Track row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackRecord {
    pub id: String,
    pub station_id: String,
    pub title: String,
    pub duration_ms: Option<i64>,
    pub url: String,
    /// JSON composition plan
    pub composition_plan: Option<String>,
    pub genre: String,
    /// JSON array of styles
    pub styles: String,
    pub order_index: i64,
    pub generated_at: String,
    pub created_at: String,
}

impl TrackRecord {
    /// Convert to a playable track. Persisted tracks are always `Ready`.
    pub fn into_track(self) -> Result<Track> {
        Ok(Track {
            metadata: TrackMetadata {
                title: Some(self.title),
                artist: Some(GENERATED_ARTIST.to_string()),
                genre: self.genre,
                styles: serde_json::from_str(&self.styles)?,
                generated_at: parse_timestamp(&self.generated_at)?,
            },
            id: self.id,
            url: Some(self.url),
            duration_ms: self.duration_ms.map(|d| d.max(0) as u64),
            state: TrackState::Ready,
            station_id: self.station_id,
            order_index: Some(self.order_index),
        })
    }

    /// Decode the stored composition plan, if any.
    pub fn plan(&self) -> Result<Option<CompositionPlan>> {
        Ok(self
            .composition_plan
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?)
    }
}

const TRACK_COLUMNS: &str = "id, station_id, title, duration_ms, url, composition_plan, \
                             genre, styles, order_index, generated_at, created_at";

/// Insert a track for a station at `order_index`.
pub async fn insert_track(
    pool: &SqlitePool,
    station_id: &str,
    track: &NewTrack,
    order_index: i64,
) -> Result<TrackRecord> {
    let plan = track
        .composition_plan
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let record = sqlx::query_as::<_, TrackRecord>(&format!(
        r#"
        INSERT INTO tracks (id, station_id, title, duration_ms, url, composition_plan,
                            genre, styles, order_index, generated_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        TRACK_COLUMNS
    ))
    .bind(&track.id)
    .bind(station_id)
    .bind(&track.title)
    .bind(track.duration_ms.map(|d| d as i64))
    .bind(&track.url)
    .bind(plan)
    .bind(&track.genre)
    .bind(serde_json::to_string(&track.styles)?)
    .bind(order_index)
    .bind(timestamp(track.generated_at))
    .bind(timestamp(Utc::now()))
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get a track by ID.
pub async fn get_track(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<TrackRecord>> {
    sqlx::query_as::<_, TrackRecord>(&format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// All tracks of a station in playback order.
pub async fn tracks_for_station(
    pool: &SqlitePool,
    station_id: &str,
) -> sqlx::Result<Vec<TrackRecord>> {
    sqlx::query_as::<_, TrackRecord>(&format!(
        "SELECT {} FROM tracks WHERE station_id = ? ORDER BY order_index, created_at",
        TRACK_COLUMNS
    ))
    .bind(station_id)
    .fetch_all(pool)
    .await
}

/// One past the highest order index of a station, or 0 without tracks.
///
/// This is a plain read; two writers racing on the same station can be
/// handed the same index.
pub async fn next_order_index(pool: &SqlitePool, station_id: &str) -> sqlx::Result<i64> {
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT MAX(order_index) FROM tracks WHERE station_id = ?")
            .bind(station_id)
            .fetch_one(pool)
            .await?;
    Ok(row.0.map_or(0, |max| max + 1))
}

/// Delete a single track. Returns whether anything was deleted.
pub async fn delete_track(pool: &SqlitePool, id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every track of a station. Returns the number deleted.
pub async fn delete_tracks_for_station(pool: &SqlitePool, station_id: &str) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM tracks WHERE station_id = ?")
        .bind(station_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

//! Test utilities and fixtures for radio-roulette tests.
//!
//! This module provides common test helpers, mock factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{temp_db, mock_station};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let station = mock_station();
//!     // ... test logic
//! }
//! ```

use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::composer::plan_for_station;
use crate::db::NewTrack;
use crate::model::{GENERATED_ARTIST, Seed, StationProfile, Track, TrackMetadata, TrackState, new_track_id};

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");

    let pool = crate::db::init_db(&crate::db::db_url(Some(&db_path)))
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a mock station with a fresh ID.
///
/// Genres `lofi, jazz`, seed `"abc"` and the styles that seed selects
/// with two styles per genre. Customize with struct update syntax:
///
/// ```ignore
/// let station = StationProfile {
///     name: None,
///     ..mock_station()
/// };
/// ```
pub fn mock_station() -> StationProfile {
    let mut station = StationProfile::new(
        vec!["lofi".to_string(), "jazz".to_string()],
        vec![
            "instrumental lofi".to_string(),
            "lofi hip-hop".to_string(),
            "cool jazz".to_string(),
            "fusion jazz".to_string(),
        ],
        Some(Seed::from("abc")),
    );
    station.name = Some("Test Station".to_string());
    station
}

/// Creates a generated track ready to be persisted.
///
/// Each call gets a unique ID. The timestamp is fixed at whole seconds so
/// it survives a database round trip unchanged.
pub fn mock_new_track() -> NewTrack {
    let station = mock_station();
    let plan = plan_for_station(&station, 30_000);
    NewTrack {
        id: new_track_id(),
        title: "Track 1".to_string(),
        duration_ms: Some(plan.total_duration_ms()),
        url: "memory://test.mp3".to_string(),
        genre: station.genre_label(),
        styles: station.selected_styles,
        composition_plan: Some(plan),
        generated_at: Utc
            .with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

/// Creates a ready, playable track at `order_index` of `station_id`.
pub fn mock_ready_track(station_id: &str, order_index: i64) -> Track {
    let id = new_track_id();
    Track {
        url: Some(format!("memory://{}.mp3", id)),
        id,
        metadata: TrackMetadata {
            title: Some(format!("Track {}", order_index + 1)),
            artist: Some(GENERATED_ARTIST.to_string()),
            genre: "lofi".to_string(),
            styles: vec!["lofi hip-hop".to_string()],
            generated_at: Utc::now(),
        },
        duration_ms: Some(30_000),
        state: TrackState::Ready,
        station_id: station_id.to_string(),
        order_index: Some(order_index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roulette::StyleRoulette;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        let stations = crate::db::list_stations(&pool, 10, 0).await.unwrap();
        assert!(stations.is_empty());
    }

    #[test]
    fn test_mock_station_matches_its_seed() {
        let station = mock_station();
        let spin = StyleRoulette::new().select(&station.required_genres, 2, station.seed.as_ref());
        assert_eq!(spin.selected_styles, station.selected_styles);
        assert!(station.id.starts_with("station_"));
        assert_ne!(station.id, mock_station().id);
    }

    #[test]
    fn test_mock_new_track_defaults() {
        let track = mock_new_track();
        assert_eq!(track.genre, "lofi, jazz");
        assert_eq!(track.duration_ms, Some(30_000));
        assert_ne!(track.id, mock_new_track().id);
    }

    #[test]
    fn test_mock_ready_track_is_playable() {
        let track = mock_ready_track("station_1", 4);
        assert!(track.is_playable());
        assert_eq!(track.display_title(), "Track 5");
        assert_eq!(track.order_index, Some(4));
    }
}

//! Track generation and headless playback commands.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use super::Context;
use crate::composer::ElevenLabsClient;
use crate::db::repository::load_station_with_tracks;
use crate::db::{SqliteRepository, StationRepository};
use crate::error::Error;
use crate::player::{LogOutput, PlaybackSession, QueueEvent, TrackScheduler};

/// Give up on a station after this many failed generations in a row.
const MAX_CONSECUTIVE_FAILURES: usize = 5;

/// Scheduler wired to the real composer, the configured store and `repo`.
fn build_scheduler(
    ctx: &Context,
    repo: Arc<SqliteRepository>,
    station_id: &str,
    api_key: Option<&str>,
) -> anyhow::Result<Arc<TrackScheduler>> {
    let api_key = ctx.config.api_key(api_key);
    let composer = ElevenLabsClient::from_config(&ctx.config.composer, api_key.as_deref())?;
    Ok(Arc::new(TrackScheduler::new(
        station_id,
        Arc::new(composer),
        Arc::new(ctx.config.audio_store()),
        repo,
        ctx.config.scheduler_settings(),
    )))
}

/// Generate a single track for a station
pub fn cmd_compose(
    rt: &Runtime,
    ctx: &Context,
    station_id: &str,
    api_key: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let repo = Arc::new(ctx.open_repo().await?);
        let Some(station) = repo.find_station(station_id).await? else {
            return Err(Error::not_found("Station", station_id).into());
        };

        let scheduler = build_scheduler(ctx, repo, station_id, api_key)?;
        println!(
            "Composing a track for {} [{}]...",
            station.display_name(),
            station.genre_label()
        );

        let track = scheduler.try_generate().await?;
        info!(target: "radio_roulette::compose", track_id = %track.id, "Track composed");
        println!(
            "{} ({}s) {}",
            track.display_title(),
            track.duration_ms.unwrap_or_default() / 1000,
            track.url.as_deref().unwrap_or("-")
        );
        Ok(())
    })
}

/// Play a station headlessly
pub fn cmd_tune(
    rt: &Runtime,
    ctx: &Context,
    station_id: &str,
    tracks: usize,
    time_scale: f64,
    api_key: Option<&str>,
) -> anyhow::Result<()> {
    if !time_scale.is_finite() || time_scale <= 0.0 {
        return Err(Error::invalid_input("--time-scale must be a positive number").into());
    }

    rt.block_on(async {
        let repo = Arc::new(ctx.open_repo().await?);
        let Some(station) = load_station_with_tracks(repo.as_ref(), station_id).await? else {
            return Err(Error::not_found("Station", station_id).into());
        };

        let scheduler = build_scheduler(ctx, repo, station_id, api_key)?;
        println!(
            "Tuning in to {} ({} saved tracks)",
            station.display_name(),
            station.tracks.len()
        );

        let session = PlaybackSession::start(scheduler, Arc::new(LogOutput::new()), station.tracks);
        let result = play_through(
            &session,
            tracks,
            time_scale,
            ctx.config.queue.track_duration_ms,
        )
        .await;
        session.close();

        let played = result?;
        println!("Played {} track(s)", played);
        Ok(())
    })
}

enum Wake {
    /// The queue changed; `failed` is set when a failed track was appended
    Changed { failed: bool },
    Stop,
}

async fn wait_for_queue(events: &mut broadcast::Receiver<QueueEvent>) -> Wake {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(QueueEvent::TrackAppended { track, .. }) => {
                    return Wake::Changed { failed: !track.is_playable() };
                }
                Ok(QueueEvent::CursorMoved { .. }) | Err(RecvError::Lagged(_)) => {
                    return Wake::Changed { failed: false };
                }
                Ok(QueueEvent::Closed) | Err(RecvError::Closed) => return Wake::Stop,
                Ok(_) => continue,
            },
            _ = tokio::signal::ctrl_c() => return Wake::Stop,
        }
    }
}

/// Play up to `limit` tracks, waiting for generation whenever the queue
/// runs dry. Returns how many tracks played.
async fn play_through(
    session: &PlaybackSession,
    limit: usize,
    time_scale: f64,
    fallback_duration_ms: u64,
) -> anyhow::Result<usize> {
    let mut events = session.subscribe();
    let mut played = 0;
    let mut failures = 0;
    let mut last_played: Option<String> = None;

    session.play()?;

    while played < limit {
        let current = session.current_track().filter(|t| t.is_playable());
        let finished = current.as_ref().map(|t| &t.id) == last_played.as_ref();

        let Some(track) = current.filter(|_| !finished) else {
            // Nothing new to play yet
            match wait_for_queue(&mut events).await {
                Wake::Stop => break,
                Wake::Changed { failed: true } => {
                    failures += 1;
                    warn!(target: "radio_roulette::tune", failures, "Generation failed, trying next");
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        anyhow::bail!("Giving up after {} failed generations in a row", failures);
                    }
                }
                Wake::Changed { failed: false } => {}
            }
            if finished {
                session.next()?;
            }
            continue;
        };

        failures = 0;
        let duration_ms = track.duration_ms.unwrap_or(fallback_duration_ms);
        let wait = Duration::from_secs_f64(duration_ms as f64 / 1000.0 * time_scale);
        println!(
            "Now playing: {} [{}] ({}s)",
            track.display_title(),
            track.metadata.genre,
            duration_ms / 1000
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!(target: "radio_roulette::tune", "Interrupted");
                break;
            }
        }

        played += 1;
        last_played = Some(track.id);
        if played < limit {
            session.on_track_ended()?;
        }
    }

    Ok(played)
}

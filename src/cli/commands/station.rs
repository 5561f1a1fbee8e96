//! Roulette spins and station management commands.

use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::Context;
use crate::db::repository::{delete_station_cascade, load_station_with_tracks};
use crate::db::{StationRepository, StationUpdate};
use crate::error::Error;
use crate::model::{Seed, StationProfile};
use crate::roulette::{self, StyleRoulette};

/// Canonical integers are stored as numbers; anything else (`007`, `+5`,
/// `-0`) stays text so the spin hashes exactly what the user typed.
fn parse_seed(raw: &str) -> Seed {
    match raw.parse::<i64>() {
        Ok(n) if n.to_string() == raw => Seed::Number(n),
        _ => Seed::Text(raw.to_string()),
    }
}

fn print_styles(styles: &[String]) {
    if styles.is_empty() {
        println!("  (no styles selected)");
    }
    for style in styles {
        println!("  - {}", style);
    }
}

/// List the genres known to the roulette
pub fn cmd_genres() -> anyhow::Result<()> {
    for genre in roulette::all_genres() {
        println!("{:<12} {}", genre, roulette::styles_for_genre(genre).len());
    }
    Ok(())
}

/// Spin the roulette, optionally saving the result as a station
pub fn cmd_spin(
    rt: &Runtime,
    ctx: &Context,
    genres: &[String],
    styles_per_genre: Option<usize>,
    seed: Option<&str>,
    save: bool,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let per_genre = styles_per_genre.unwrap_or(ctx.config.roulette.styles_per_genre);
    let seed = seed.map(parse_seed);

    for genre in genres {
        if roulette::styles_for_genre(genre).is_empty() {
            warn!(target: "radio_roulette::spin", genre = %genre, "Unknown genre, skipping");
            eprintln!("Unknown genre: {} (skipped)", genre);
        }
    }

    let outcome = StyleRoulette::new().select(genres, per_genre, seed.as_ref());
    println!("Seed: {}", outcome.seed);
    print_styles(&outcome.selected_styles);

    if !save {
        return Ok(());
    }

    let mut profile = StationProfile::new(
        genres.to_vec(),
        outcome.selected_styles,
        Some(seed.unwrap_or(Seed::Text(outcome.seed))),
    );
    profile.name = name.map(str::to_string);

    rt.block_on(async {
        let repo = ctx.open_repo().await?;
        let saved = repo.create_station(&profile).await?;
        info!(target: "radio_roulette::spin", station_id = %saved.id, "Station saved");
        println!("Saved station {} ({})", saved.id, saved.display_name());
        Ok(())
    })
}

/// Re-spin a saved station with a fresh seed
pub fn cmd_respin(rt: &Runtime, ctx: &Context, station_id: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let repo = ctx.open_repo().await?;
        let Some(station) = repo.find_station(station_id).await? else {
            return Err(Error::not_found("Station", station_id).into());
        };

        let outcome = StyleRoulette::new()
            .regenerate(&station.required_genres, ctx.config.roulette.styles_per_genre);
        let update = StationUpdate {
            selected_styles: Some(outcome.selected_styles),
            seed: Some(Seed::Text(outcome.seed)),
            ..StationUpdate::default()
        };
        let updated = repo
            .update_station(station_id, &update)
            .await?
            .ok_or_else(|| Error::not_found("Station", station_id))?;

        info!(target: "radio_roulette::spin", station_id = %updated.id, "Station re-spun");
        println!(
            "{} - seed {}",
            updated.display_name(),
            updated.seed.as_ref().map(Seed::to_string).unwrap_or_default()
        );
        print_styles(&updated.selected_styles);
        Ok(())
    })
}

/// List saved stations
pub fn cmd_stations(rt: &Runtime, ctx: &Context, limit: i64, offset: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let repo = ctx.open_repo().await?;
        let stations = repo.list_stations(limit, offset).await?;
        if stations.is_empty() {
            println!("No stations yet. Try: radio-roulette spin --genre lofi --save");
            return Ok(());
        }
        for station in stations {
            println!(
                "{}  {:<24} [{}] {} styles",
                station.id,
                station.display_name(),
                station.genre_label(),
                station.selected_styles.len()
            );
        }
        Ok(())
    })
}

/// Show a station with its generated tracks
pub fn cmd_show(rt: &Runtime, ctx: &Context, station_id: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let repo = ctx.open_repo().await?;
        let Some(station) = load_station_with_tracks(&repo, station_id).await? else {
            return Err(Error::not_found("Station", station_id).into());
        };

        println!("Station: {}", station.display_name());
        println!("ID:      {}", station.id);
        println!("Genres:  {}", station.genre_label());
        if let Some(seed) = &station.seed {
            println!("Seed:    {}", seed);
        }
        println!("Styles:");
        print_styles(&station.selected_styles);

        println!("Tracks:  {}", station.tracks.len());
        for track in &station.tracks {
            println!(
                "  {:>3}. {} ({}s) {}",
                track.order_index.unwrap_or_default(),
                track.display_title(),
                track.duration_ms.unwrap_or_default() / 1000,
                track.url.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    })
}

/// Delete a station and its tracks
pub fn cmd_delete(rt: &Runtime, ctx: &Context, station_id: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let repo = ctx.open_repo().await?;
        if !delete_station_cascade(&repo, station_id).await? {
            return Err(Error::not_found("Station", station_id).into());
        }
        info!(target: "radio_roulette::station", station_id, "Station deleted");
        println!("Deleted station {}", station_id);
        Ok(())
    })
}

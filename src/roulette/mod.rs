//! Style roulette - deterministic, seeded style selection for stations.
//!
//! Given an ordered list of genres, the roulette shuffles each genre's
//! style catalogue with a seeded generator and keeps the first few
//! entries. The same genres, count and seed always produce the same
//! styles, which is what lets a station be "re-rolled" to an identical
//! result later.
//!
//! # Algorithm
//!
//! 1. Render the seed to a string (wall-clock millis when absent).
//! 2. Hash it: `hash = hash * 31 + code_unit` over UTF-16 code units with
//!    signed 32-bit wraparound, then take the absolute value.
//! 3. Drive a linear congruential generator from the hash:
//!    `state = (state * 9301 + 49297) % 233280`, draw = `state / 233280`.
//! 4. For each genre in order, Fisher-Yates shuffle a copy of its styles
//!    and append the first `min(n, len)` of them.
//!
//! Unknown genres are skipped and consume no draws.
//!
//! # Example
//!
//! ```ignore
//! let roulette = StyleRoulette::new();
//! let spin = roulette.select(&["lofi".to_string()], 3, Some(&Seed::from("abc")));
//! assert_eq!(spin.seed, "abc");
//! ```

pub mod presets;

use std::sync::atomic::{AtomicI64, Ordering};

use crate::model::Seed;
pub use presets::{GenrePresets, all_genres, styles_for_genre};

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233_280;

/// Source of styles per genre.
///
/// The built-in implementation is [`GenrePresets`]; tests substitute
/// small catalogues.
pub trait StyleCatalogue: Send + Sync {
    /// Ordered styles for a genre, empty when the genre is unknown.
    fn styles_for(&self, genre: &str) -> Vec<String>;
}

/// Result of a spin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouletteOutcome {
    /// Selected styles, grouped by genre in genre order
    pub selected_styles: Vec<String>,
    /// The seed actually used (echoes the caller's seed when given)
    pub seed: String,
}

/// Seeded style selector.
#[derive(Debug, Clone, Default)]
pub struct StyleRoulette<C = GenrePresets> {
    catalogue: C,
}

impl StyleRoulette<GenrePresets> {
    /// Roulette over the built-in genre presets.
    pub fn new() -> Self {
        Self {
            catalogue: GenrePresets,
        }
    }
}

impl<C: StyleCatalogue> StyleRoulette<C> {
    /// Roulette over a custom catalogue.
    pub fn with_catalogue(catalogue: C) -> Self {
        Self { catalogue }
    }

    /// Select up to `styles_per_genre` styles for each genre.
    ///
    /// With `seed = None` a fresh time-derived seed is used and returned
    /// in the outcome so the spin can be reproduced later.
    pub fn select(
        &self,
        required_genres: &[String],
        styles_per_genre: usize,
        seed: Option<&Seed>,
    ) -> RouletteOutcome {
        let used_seed = seed.map(Seed::to_string).unwrap_or_else(fresh_seed);
        let mut rng = SeededRng::new(&used_seed);
        let mut selected_styles = Vec::new();

        for genre in required_genres {
            let mut styles = self.catalogue.styles_for(genre);
            if styles.is_empty() {
                tracing::debug!(genre = %genre, "Skipping genre with no styles");
                continue;
            }

            fisher_yates(&mut styles, &mut rng);
            styles.truncate(styles_per_genre.min(styles.len()));
            selected_styles.extend(styles);
        }

        RouletteOutcome {
            selected_styles,
            seed: used_seed,
        }
    }

    /// Spin again with a fresh seed, ignoring any previous one.
    pub fn regenerate(&self, required_genres: &[String], styles_per_genre: usize) -> RouletteOutcome {
        let seed = Seed::Text(fresh_seed());
        self.select(required_genres, styles_per_genre, Some(&seed))
    }
}

// ============================================================================
// Seeded randomness
// ============================================================================

/// Hash a seed string to the LCG starting state.
pub fn hash_seed(seed: &str) -> u64 {
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    // i32::MIN has no i32 absolute value; widen first.
    (hash as i64).unsigned_abs()
}

/// Linear congruential generator yielding floats in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: &str) -> Self {
        Self {
            state: hash_seed(seed),
        }
    }

    /// Next draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// In-place Fisher-Yates shuffle, walking from the last index down to 1.
pub fn fisher_yates<T>(items: &mut [T], rng: &mut SeededRng) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
        items.swap(i, j);
    }
}

static LAST_SEED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Time-derived seed: current Unix millis, strictly increasing per process.
pub fn fresh_seed() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_SEED_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_SEED_MILLIS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(current) => last = current,
        }
    }
}

//! Composition plan builder.
//!
//! Splits a requested duration into an intro, at most one main section
//! and an outro, each with its own style hints. The station's selected
//! styles lead the global positive styles and feed the main section.

use super::domain::{CompositionPlan, PlanSection};
use crate::model::StationProfile;

/// Default length of a generated track (2 minutes).
pub const DEFAULT_TRACK_DURATION_MS: u64 = 120_000;

/// Roughly how long one section should run before another is added.
const SECTION_TARGET_MS: u64 = 30_000;
const MIN_SECTIONS: u64 = 2;
const MAX_SECTIONS: u64 = 3;

const INTRO_POSITIVE: &[&str] = &["soft ambient pads", "vinyl crackle", "gentle entry"];
const INTRO_NEGATIVE: &[&str] = &["heavy drums", "loud bass", "aggressive"];
const MAIN_EXTRA_POSITIVE: &[&str] = &["warm reverb", "smooth progression"];
const MAIN_NEGATIVE: &[&str] = &["jarring transitions", "dissonant", "chaotic"];
const OUTRO_POSITIVE: &[&str] = &["smooth fade", "gentle resolution", "ambient textures"];
const OUTRO_NEGATIVE: &[&str] = &["abrupt cuts", "heavy percussion", "sudden changes"];
const GLOBAL_EXTRA_POSITIVE: &[&str] = &["warm reverb", "vinyl crackle", "70-80 bpm", "smooth transitions"];
const GLOBAL_NEGATIVE: &[&str] = &["aggressive", "loud", "fast-paced", "distorted", "harsh", "dissonant"];

/// Build the plan for one track of `profile` lasting exactly `duration_ms`.
///
/// Section durations always sum to `duration_ms`; the integer-division
/// remainder goes to the last section.
pub fn plan_for_station(profile: &StationProfile, duration_ms: u64) -> CompositionPlan {
    let section_count = (duration_ms / SECTION_TARGET_MS).clamp(MIN_SECTIONS, MAX_SECTIONS);
    let base_duration = duration_ms / section_count;

    let sections = (0..section_count)
        .map(|i| {
            let duration = if i == section_count - 1 {
                duration_ms - base_duration * (section_count - 1)
            } else {
                base_duration
            };
            build_section(profile, i as usize, i == section_count - 1, duration)
        })
        .collect();

    let mut positive_global_styles = profile.selected_styles.clone();
    positive_global_styles.extend(owned(GLOBAL_EXTRA_POSITIVE));

    CompositionPlan {
        positive_global_styles,
        negative_global_styles: owned(GLOBAL_NEGATIVE),
        sections,
    }
}

fn build_section(profile: &StationProfile, index: usize, is_last: bool, duration_ms: u64) -> PlanSection {
    let (section_name, positive_local_styles, negative_local_styles) = if index == 0 {
        ("Intro".to_string(), owned(INTRO_POSITIVE), owned(INTRO_NEGATIVE))
    } else if is_last {
        ("Outro".to_string(), owned(OUTRO_POSITIVE), owned(OUTRO_NEGATIVE))
    } else {
        // Main section i leans on the styles around position i-1
        let styles = &profile.selected_styles;
        let start = (index - 1).min(styles.len());
        let end = (index + 1).min(styles.len());
        let mut positive = styles[start..end].to_vec();
        positive.extend(owned(MAIN_EXTRA_POSITIVE));
        (format!("Main Section {}", index), positive, owned(MAIN_NEGATIVE))
    };

    PlanSection {
        section_name,
        positive_local_styles,
        negative_local_styles,
        duration_ms,
        lines: Vec::new(),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Section durations add up to the request with no rounding drift
        #[test]
        fn durations_sum_exactly(duration_ms in 0u64..10_000_000) {
            let profile = StationProfile::new(
                vec!["lofi".to_string()],
                vec!["a".to_string(), "b".to_string()],
                None,
            );
            let plan = plan_for_station(&profile, duration_ms);
            prop_assert_eq!(plan.total_duration_ms(), duration_ms);
            prop_assert!((2..=3).contains(&plan.sections.len()));
            prop_assert_eq!(plan.sections.first().map(|s| s.section_name.as_str()), Some("Intro"));
            prop_assert_eq!(plan.sections.last().map(|s| s.section_name.as_str()), Some("Outro"));
        }
    }
}

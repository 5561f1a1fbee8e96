//! Built-in genre → style catalogue.
//!
//! Each genre maps to a fixed, ordered list of styles. The roulette
//! shuffles a copy of the list, so the order here is part of the
//! reproducibility contract: reordering entries changes which styles a
//! given seed selects.

use super::StyleCatalogue;

/// A genre and the styles the roulette may draw for it.
#[derive(Debug, Clone, Copy)]
pub struct GenrePreset {
    pub genre: &'static str,
    pub styles: &'static [&'static str],
}

/// All presets, in display order.
pub const GENRE_PRESETS: &[GenrePreset] = &[
    GenrePreset {
        genre: "lofi",
        styles: &[
            "lofi hip-hop",
            "chilled piano lofi",
            "nostalgic lofi",
            "jazzy lofi",
            "instrumental lofi",
            "lofi ambient",
            "study lofi",
            "lofi with vinyl crackle",
        ],
    },
    GenrePreset {
        genre: "ambient",
        styles: &[
            "dark ambient",
            "space ambient",
            "drone ambient",
            "field recording ambient",
            "cinematic ambient",
            "nature ambient",
            "minimal ambient",
            "ethereal ambient",
        ],
    },
    GenrePreset {
        genre: "jazz",
        styles: &[
            "smooth jazz",
            "bebop jazz",
            "cool jazz",
            "fusion jazz",
            "acid jazz",
            "latin jazz",
            "contemporary jazz",
            "jazz ballads",
        ],
    },
    GenrePreset {
        genre: "electronic",
        styles: &[
            "synthwave",
            "chillwave",
            "downtempo",
            "future garage",
            "ambient techno",
            "deep house",
            "melodic dubstep",
            "IDM",
        ],
    },
    GenrePreset {
        genre: "hip-hop",
        styles: &[
            "trap",
            "drill",
            "boom bap",
            "mumble rap",
            "conscious hip-hop",
            "phonk",
            "afro trap",
            "uk drill",
        ],
    },
    GenrePreset {
        genre: "house",
        styles: &[
            "deep house",
            "tech house",
            "progressive house",
            "future house",
            "melodic house",
            "amapiano",
            "future rave",
            "tropical house",
        ],
    },
    GenrePreset {
        genre: "techno",
        styles: &[
            "melodic techno",
            "minimal techno",
            "hard techno",
            "ambient techno",
            "industrial techno",
            "detroit techno",
            "progressive techno",
            "acid techno",
        ],
    },
    GenrePreset {
        genre: "dubstep",
        styles: &[
            "melodic dubstep",
            "riddim",
            "brostep",
            "future bass",
            "hybrid trap",
            "drum-step",
            "wobble-step",
            "liquid dubstep",
        ],
    },
    GenrePreset {
        genre: "rock",
        styles: &[
            "indie rock",
            "alternative rock",
            "classic rock",
            "punk rock",
            "progressive rock",
            "psychedelic rock",
            "post-rock",
            "garage rock",
        ],
    },
    GenrePreset {
        genre: "pop",
        styles: &[
            "electropop",
            "indie pop",
            "synth pop",
            "dream pop",
            "art pop",
            "hyperpop",
            "k-pop",
            "latin pop",
        ],
    },
    GenrePreset {
        genre: "r&b",
        styles: &[
            "neo-soul",
            "alternative r&b",
            "contemporary r&b",
            "smooth r&b",
            "retro soul",
            "experimental r&b",
            "gospel-influenced r&b",
            "trap soul",
        ],
    },
    GenrePreset {
        genre: "classical",
        styles: &[
            "baroque",
            "romantic",
            "contemporary classical",
            "minimalist classical",
            "orchestral",
            "chamber music",
            "neoclassical",
            "crossover classical",
        ],
    },
    GenrePreset {
        genre: "folk",
        styles: &[
            "indie folk",
            "acoustic folk",
            "folk rock",
            "americana",
            "traditional folk",
            "contemporary folk",
            "celtic folk",
            "world folk",
        ],
    },
    GenrePreset {
        genre: "reggae",
        styles: &[
            "roots reggae",
            "dancehall",
            "dub reggae",
            "reggae fusion",
            "digital reggae",
            "lovers rock",
            "reggaeton",
            "ska reggae",
        ],
    },
    GenrePreset {
        genre: "funk",
        styles: &[
            "classic funk",
            "p-funk",
            "funk rock",
            "electro funk",
            "jazz funk",
            "nu-funk",
            "afrofunk",
            "disco funk",
        ],
    },
    GenrePreset {
        genre: "country",
        styles: &[
            "contemporary country",
            "country rock",
            "bluegrass",
            "outlaw country",
            "country pop",
            "americana country",
            "honky-tonk",
            "alt-country",
        ],
    },
    GenrePreset {
        genre: "metal",
        styles: &[
            "progressive metal",
            "melodic metal",
            "symphonic metal",
            "post-metal",
            "atmospheric metal",
            "djent",
            "metalcore",
            "doom metal",
        ],
    },
    GenrePreset {
        genre: "world",
        styles: &[
            "afrobeats",
            "bossa nova",
            "flamenco",
            "middle eastern",
            "indian classical",
            "celtic",
            "latin fusion",
            "tribal world",
        ],
    },
    GenrePreset {
        genre: "experimental",
        styles: &[
            "avant-garde",
            "noise",
            "glitch",
            "microsound",
            "acousmatic",
            "electroacoustic",
            "sound art",
            "post-genre",
        ],
    },
    GenrePreset {
        genre: "chill",
        styles: &[
            "chillout",
            "chillhop",
            "chill trap",
            "ambient chill",
            "downtempo chill",
            "chill house",
            "lo-fi chill",
            "atmospheric chill",
        ],
    },
];

/// The built-in catalogue backed by [`GENRE_PRESETS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GenrePresets;

impl StyleCatalogue for GenrePresets {
    fn styles_for(&self, genre: &str) -> Vec<String> {
        styles_for_genre(genre)
    }
}

/// Styles for a genre, or an empty list when the genre is unknown.
pub fn styles_for_genre(genre: &str) -> Vec<String> {
    GENRE_PRESETS
        .iter()
        .find(|preset| preset.genre == genre)
        .map(|preset| preset.styles.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

/// All known genre names, in catalogue order.
pub fn all_genres() -> Vec<&'static str> {
    GENRE_PRESETS.iter().map(|preset| preset.genre).collect()
}

//! Session queue state.

use super::cursor::PlaybackCursor;
use crate::model::{Track, TrackState};

/// Result of a forward move that may step over failed tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advance {
    /// Whether the cursor moved at all
    pub moved: bool,
    /// Ids of failed tracks stepped over, in order
    pub skipped: Vec<String>,
}

/// The tracks of one playback session and where playback is.
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    tracks: Vec<Track>,
    cursor: PlaybackCursor,
    is_playing: bool,
}

impl QueueState {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.cursor.index()
    }

    /// The track under the cursor, if any.
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor.index())
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
        self.refresh_playing_marker();
    }

    /// Append a track and return its index.
    pub fn push(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.refresh_playing_marker();
        self.tracks.len() - 1
    }

    /// Replace every track, keeping the cursor in range.
    pub fn replace_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.cursor = PlaybackCursor::at(self.cursor.index(), self.tracks.len());
        self.refresh_playing_marker();
    }

    /// Step back one track.
    pub fn retreat(&mut self) -> bool {
        let moved = self.cursor.retreat();
        self.refresh_playing_marker();
        moved
    }

    /// Step forward, then keep stepping while the cursor sits on a
    /// failed track and there is somewhere to go.
    pub fn advance_skipping_failed(&mut self) -> Advance {
        let mut result = Advance {
            moved: self.cursor.advance(self.tracks.len()),
            skipped: Vec::new(),
        };
        if result.moved {
            self.skip_failed(&mut result.skipped);
        }
        self.refresh_playing_marker();
        result
    }

    /// Leave a failed current track if a later one exists.
    pub fn leave_failed(&mut self) -> Advance {
        let mut result = Advance::default();
        let start = self.cursor.index();
        self.skip_failed(&mut result.skipped);
        result.moved = self.cursor.index() != start;
        self.refresh_playing_marker();
        result
    }

    fn skip_failed(&mut self, skipped: &mut Vec<String>) {
        while let Some(track) = self.current() {
            if track.state != TrackState::Failed {
                break;
            }
            let id = track.id.clone();
            if !self.cursor.advance(self.tracks.len()) {
                break;
            }
            skipped.push(id);
        }
    }

    /// Tracks queued after the current one (negative when empty).
    pub fn remaining(&self) -> i64 {
        self.cursor.remaining(self.tracks.len())
    }

    /// How many tracks must be generated to keep `threshold` queued ahead.
    pub fn prefetch_deficit(&self, threshold: usize) -> usize {
        let deficit = threshold as i64 - self.remaining();
        deficit.max(0) as usize
    }

    /// Keep the `Playing` marker on exactly the current track while playing.
    fn refresh_playing_marker(&mut self) {
        let current = self.cursor.index();
        let playing = self.is_playing;
        for (i, track) in self.tracks.iter_mut().enumerate() {
            if i == current && playing && track.state.is_playable() {
                track.state = TrackState::Playing;
            } else if track.state == TrackState::Playing {
                track.state = TrackState::Ready;
            }
        }
    }
}

//! Playback cursor - the current position within a session's queue.

/// Position within a track list.
///
/// The cursor only ever steps to an adjacent index, and clamps at both
/// ends instead of wrapping. It does not own the list, so every
/// movement takes the current length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    index: usize,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at `index`, clamped into a list of `len` tracks.
    pub fn at(index: usize, len: usize) -> Self {
        let mut cursor = Self { index };
        cursor.clamp_to(len);
        cursor
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Step to the next track, staying put on the last one.
    ///
    /// Returns whether the cursor moved.
    pub fn advance(&mut self, len: usize) -> bool {
        let next = (self.index + 1).min(len.saturating_sub(1));
        let moved = next != self.index;
        self.index = next;
        moved
    }

    /// Step to the previous track, staying put on the first one.
    ///
    /// Returns whether the cursor moved.
    pub fn retreat(&mut self) -> bool {
        let moved = self.index > 0;
        self.index = self.index.saturating_sub(1);
        moved
    }

    /// Tracks queued after the cursor. Negative once the list is empty.
    pub fn remaining(&self, len: usize) -> i64 {
        len as i64 - self.index as i64 - 1
    }

    fn clamp_to(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }
}

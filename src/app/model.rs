//! Application model type: `App`.
//!
//! The `App` struct holds terminal-side state only: the playlist cursor,
//! follow mode and popups. Everything about playback lives in the session.

use std::path::PathBuf;

/// The main application model.
pub struct App {
    /// Cursor position in the playlist.
    pub selected: usize,
    /// Paths given on the command line; used again on reselect.
    pub sources: Vec<PathBuf>,

    pub follow_playback: bool,
    pub pending_follow_index: Option<usize>,

    pub info_window: bool,
    len: usize,
}

impl App {
    /// Create a new `App` for a playlist of `len` entries.
    pub fn new(len: usize, sources: Vec<PathBuf>) -> Self {
        Self {
            selected: 0,
            sources,
            follow_playback: true,
            pending_follow_index: None,
            info_window: false,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if the playlist has any entries.
    pub fn has_tracks(&self) -> bool {
        self.len > 0
    }

    /// Adopt a new playlist length, e.g. after a reselect.
    pub fn reset_len(&mut self, len: usize) {
        self.len = len;
        self.selected = 0;
        self.pending_follow_index = None;
    }

    pub fn toggle_info_window(&mut self) {
        self.info_window = !self.info_window;
    }

    /// Enable following playback (cursor follows the loaded track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }
    /// Disable follow-playback and clear any pending follow index.
    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow_index = None;
    }
    /// Set an index to follow once the session has loaded it.
    pub fn set_pending_follow_index(&mut self, idx: usize) {
        self.pending_follow_index = Some(idx);
    }

    /// Set the cursor, clamped to the playlist.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = if self.len == 0 {
            0
        } else {
            idx.min(self.len - 1)
        };
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        if self.len > 0 {
            self.selected = (self.selected + 1) % self.len;
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        if self.len > 0 {
            self.selected = if self.selected == 0 {
                self.len - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.len.saturating_sub(1);
    }

    /// Move the cursor to the loaded track when following playback.
    ///
    /// With a pending follow index the cursor waits until that index is the
    /// one loaded, so it doesn't jump back to the previous track first.
    pub fn sync_with_loaded(&mut self, loaded: Option<usize>) {
        let Some(idx) = loaded else {
            return;
        };
        if !self.follow_playback {
            return;
        }
        match self.pending_follow_index {
            Some(pending) if pending == idx => {
                self.pending_follow_index = None;
                self.set_selected(idx);
            }
            Some(_) => {}
            None => self.set_selected(idx),
        }
    }
}

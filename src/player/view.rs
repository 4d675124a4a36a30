//! Projection of a `PlaybackSession` into display values.

use crate::config::UiSettings;
use crate::format::{fill_percent, format_time};
use crate::metadata::{CoverArt, Credits};

use super::session::PlaybackSession;
use super::types::{PlaybackState, SinkVariant};

/// Everything the front-end needs to draw the player, recomputed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub title: String,
    /// Artist/album line.
    pub credits: String,
    pub art: Option<CoverArt>,
    /// Drives the play/pause icon.
    pub is_playing: bool,
    pub elapsed_text: String,
    pub total_text: String,
    pub progress_percent: f64,
    pub volume_percent: f64,
    pub muted: bool,
    /// Playlist entry to highlight.
    pub highlight: Option<usize>,
    pub sink: SinkVariant,
    pub state: PlaybackState,
}

impl PlaybackSession {
    pub fn view(&self, ui: &UiSettings) -> ViewModel {
        let position = self.position();
        let duration = self.duration();
        let (title, credits, art) = self.text_fields(ui);

        ViewModel {
            title,
            credits,
            art,
            is_playing: self.is_playing(),
            elapsed_text: format_time(position),
            total_text: format_time(duration),
            progress_percent: fill_percent(position, 0.0, duration),
            volume_percent: fill_percent(f64::from(self.volume()), 0.0, 1.0),
            muted: self.muted(),
            highlight: self.current_index(),
            sink: self.active_sink(),
            state: self.state().clone(),
        }
    }

    fn text_fields(&self, ui: &UiSettings) -> (String, String, Option<CoverArt>) {
        let Some(file) = self.current_file() else {
            return (ui.idle_title.clone(), String::new(), None);
        };

        // Errors win over whatever metadata arrived.
        if let PlaybackState::Error(kind) = self.state() {
            return (
                ui.error_title.clone(),
                format!("({kind}) {}", file.name),
                None,
            );
        }

        match self.track_info() {
            None => (file.display_name(), ui.loading_text.clone(), None),
            Some(meta) => {
                let credits = match &meta.credits {
                    Credits::Known(parts) => parts.join(&ui.artist_album_separator),
                    Credits::Blank => String::new(),
                    Credits::Unavailable => ui.unavailable_text.clone(),
                    Credits::Failed => ui.metadata_error_text.clone(),
                };
                (meta.title.clone(), credits, meta.art.clone())
            }
        }
    }
}

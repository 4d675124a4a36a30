use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/playdeck/config.toml` or
/// `~/.config/playdeck/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `PLAYDECK__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub controls: ControlsSettings,
    pub metadata: MetadataSettings,
    pub ui: UiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Start playing the first track as soon as files are selected.
    pub autoplay_on_select: bool,
    /// What to do when asked to load an index past the end of the playlist.
    pub out_of_range: OutOfRangePolicy,
    /// `previous` restarts the current track instead of going back when more
    /// than this many seconds have elapsed.
    pub restart_threshold_secs: f64,
    /// Load the next track (looping) when the current one ends.
    pub auto_advance: bool,
    /// Session volume before the user touches it, in `[0, 1]`.
    pub initial_volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            autoplay_on_select: false,
            out_of_range: OutOfRangePolicy::WrapToStart,
            restart_threshold_secs: 3.0,
            auto_advance: true,
            initial_volume: 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutOfRangePolicy {
    /// Load the first track instead.
    #[serde(alias = "wrap", alias = "wrap_to_start", alias = "loop")]
    WrapToStart,
    /// Log and leave the session untouched.
    #[serde(alias = "reject")]
    Ignore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions picked up when a directory is selected
    /// (case-insensitive, without dot). Explicitly selected files are always kept.
    pub extensions: Vec<String>,
    /// Whether to follow symlinks while expanding directories.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
                "mp4".into(),
            ],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Read tags and cover art. When off, the tag reader is not installed at all.
    pub enabled: bool,
    /// Read tags on a worker thread instead of the event loop.
    pub background: bool,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            background: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Title shown while nothing is loaded.
    pub idle_title: String,
    /// Artist/album line while a track is loading.
    pub loading_text: String,
    /// Title shown when the session is in its error state.
    pub error_title: String,
    /// Artist/album line when no tag reader is available.
    pub unavailable_text: String,
    /// Artist/album line when the tag reader failed.
    pub metadata_error_text: String,
    /// Separator used to join artist and album.
    pub artist_album_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ playdeck ~ ".to_string(),
            idle_title: "Select files...".to_string(),
            loading_text: "Loading...".to_string(),
            error_title: "Error".to_string(),
            unavailable_text: "(metadata unavailable)".to_string(),
            metadata_error_text: "(error reading metadata)".to_string(),
            artist_album_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Write logs to this file. Without it, logging stays off so the
    /// terminal UI is not scribbled over.
    pub file: Option<PathBuf>,
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

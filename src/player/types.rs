//! Player-side small types shared by the session, the sinks and the view.

use crate::error::{ErrorKind, MediaErrorCode};

/// Which of the two playback sinks a track plays through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SinkVariant {
    Audio,
    /// Used for `.mp4` containers only.
    Video,
}

impl SinkVariant {
    pub fn name(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// Monotonic id of a `load_track` attempt.
///
/// Every deferred callback (sink notifications, one-shot observers, metadata
/// replies) carries the generation it was created for and is dropped when a
/// newer load has happened since.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadGeneration(u64);

impl LoadGeneration {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// How much of the bound source a sink has buffered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    /// Minimum level at which a paused sink may be resumed.
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// A playable URL bound to a sink for one load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBinding {
    pub url: String,
    pub generation: LoadGeneration,
}

/// Lifecycle notifications a sink reports back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Duration is known (or known to be unknown).
    MetadataLoaded { duration: Option<f64> },
    /// Enough data is buffered to start playback.
    CanPlay,
    TimeUpdate { position: f64 },
    Playing,
    Paused,
    Ended,
    Error(MediaErrorCode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkNotification {
    pub generation: LoadGeneration,
    pub event: SinkEvent,
}

/// State of the track load/autoplay state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing selected.
    Idle,
    Loading,
    /// Loaded, waiting for the user to press play.
    ReadyPaused,
    /// Loaded, will try to play once the sink reports it can.
    ReadyAutoplayPending,
    Playing,
    Paused,
    Error(ErrorKind),
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Idle
    }
}

impl PlaybackState {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

//! The host playback primitive and the audio/video sink pair.

use tracing::debug;

use crate::error::PlayError;
use crate::library::MediaFile;

use super::types::{ReadyState, SinkNotification, SinkVariant, SourceBinding};

/// A host playback element able to render one media stream.
///
/// Playback state changes are reported through `poll` as notifications; a
/// successful `play` only means the request was accepted.
pub trait MediaSink {
    /// Attach a source URL. Takes effect on the next `load`.
    fn bind(&mut self, binding: SourceBinding);
    /// Detach the source URL.
    fn clear(&mut self);
    /// Drop buffered state and start loading whatever is bound (if anything).
    fn load(&mut self);
    fn play(&mut self) -> Result<(), PlayError>;
    fn pause(&mut self);

    /// Host-side paused flag. Flips as soon as `play`/`pause` is accepted,
    /// before the matching notification is delivered.
    fn is_paused(&self) -> bool;
    fn has_source(&self) -> bool;
    fn ready_state(&self) -> ReadyState;
    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Duration in seconds, `None` while unknown.
    fn duration(&self) -> Option<f64>;
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);

    /// Drain notifications produced since the last call.
    fn poll(&mut self) -> Vec<SinkNotification>;
}

/// Pick the sink a file plays through: `.mp4` goes to the video sink,
/// everything else to the audio sink.
pub fn select_sink(file: &MediaFile) -> SinkVariant {
    if file.name.to_ascii_lowercase().ends_with(".mp4") {
        SinkVariant::Video
    } else {
        SinkVariant::Audio
    }
}

/// The two sinks, exactly one of which is active.
pub struct SinkPair {
    audio: Box<dyn MediaSink>,
    video: Box<dyn MediaSink>,
    active: SinkVariant,
}

impl SinkPair {
    pub fn new(audio: Box<dyn MediaSink>, video: Box<dyn MediaSink>) -> Self {
        Self {
            audio,
            video,
            active: SinkVariant::Audio,
        }
    }

    pub fn active(&self) -> SinkVariant {
        self.active
    }

    pub fn active_sink(&self) -> &dyn MediaSink {
        self.get(self.active)
    }

    pub fn active_sink_mut(&mut self) -> &mut dyn MediaSink {
        self.get_mut(self.active)
    }

    pub fn get(&self, variant: SinkVariant) -> &dyn MediaSink {
        match variant {
            SinkVariant::Audio => &*self.audio,
            SinkVariant::Video => &*self.video,
        }
    }

    pub fn get_mut(&mut self, variant: SinkVariant) -> &mut dyn MediaSink {
        match variant {
            SinkVariant::Audio => &mut *self.audio,
            SinkVariant::Video => &mut *self.video,
        }
    }

    /// Pause, unbind and reload a sink so it forgets its source entirely.
    pub fn reset(&mut self, variant: SinkVariant) {
        let sink = self.get_mut(variant);
        sink.pause();
        sink.clear();
        sink.load();
        debug!(sink = variant.name(), "sink reset");
    }

    /// Make `variant` the active sink, resetting the previously active one.
    /// Returns whether a switch happened.
    pub fn switch_active(&mut self, variant: SinkVariant) -> bool {
        if self.active == variant {
            return false;
        }
        self.reset(self.active);
        debug!(from = self.active.name(), to = variant.name(), "switching sink");
        self.active = variant;
        true
    }

    /// Drain notifications from both sinks, tagged with their origin.
    pub fn poll_all(&mut self) -> Vec<(SinkVariant, SinkNotification)> {
        let mut out: Vec<(SinkVariant, SinkNotification)> = Vec::new();
        for variant in [SinkVariant::Audio, SinkVariant::Video] {
            out.extend(self.get_mut(variant).poll().into_iter().map(|n| (variant, n)));
        }
        out
    }
}

//! The playback session: track loading, handle lifecycle, autoplay and the
//! sink handoff.
//!
//! All mutable player state lives in `PlaybackSession`. Transitions happen
//! only through its methods; the transport layer asks, the session decides.
//! `is_playing` follows the active sink's `Playing`/`Paused` notifications and
//! is never set optimistically.

use tracing::{debug, error, info, warn};

use crate::config::{OutOfRangePolicy, PlaybackSettings};
use crate::error::{ErrorKind, PlayError};
use crate::library::{MediaFile, Playlist};
use crate::metadata::{Metadata, MetadataFetcher, MetadataOutcome, MetadataReply};

use super::handle::{HandleProvider, PlaybackHandle};
use super::sink::{SinkPair, select_sink};
use super::types::{
    LoadGeneration, PlaybackState, ReadyState, SinkEvent, SinkNotification, SinkVariant,
    SourceBinding,
};

/// Behavior knobs taken from `[playback]`.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub out_of_range: OutOfRangePolicy,
    pub restart_threshold_secs: f64,
    pub auto_advance: bool,
    pub initial_volume: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&PlaybackSettings::default())
    }
}

impl From<&PlaybackSettings> for SessionOptions {
    fn from(s: &PlaybackSettings) -> Self {
        Self {
            out_of_range: s.out_of_range,
            restart_threshold_secs: s.restart_threshold_secs,
            auto_advance: s.auto_advance,
            initial_volume: s.initial_volume.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ObserverKind {
    /// Attempt playback once the sink can play.
    Ready,
    /// Abandon the autoplay attempt if loading fails first.
    LoadError,
}

/// One-shot observer registered by an autoplay load.
#[derive(Debug, Copy, Clone)]
struct Observer {
    generation: LoadGeneration,
    kind: ObserverKind,
}

pub struct PlaybackSession {
    playlist: Playlist,
    current: Option<usize>,
    sinks: SinkPair,
    handles: Box<dyn HandleProvider>,
    handle: Option<PlaybackHandle>,
    metadata: MetadataFetcher,
    track_info: Option<Metadata>,
    state: PlaybackState,
    is_playing: bool,
    volume: f32,
    muted: bool,
    generation: LoadGeneration,
    observers: Vec<Observer>,
    position: f64,
    duration: f64,
    options: SessionOptions,
}

impl PlaybackSession {
    pub fn new(
        sinks: SinkPair,
        handles: Box<dyn HandleProvider>,
        metadata: MetadataFetcher,
        options: SessionOptions,
    ) -> Self {
        let volume = options.initial_volume;
        Self {
            playlist: Playlist::default(),
            current: None,
            sinks,
            handles,
            handle: None,
            metadata,
            track_info: None,
            state: PlaybackState::Idle,
            is_playing: false,
            volume,
            muted: volume == 0.0,
            generation: LoadGeneration::default(),
            observers: Vec::new(),
            position: 0.0,
            duration: 0.0,
            options,
        }
    }

    // --- queries ---

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_file(&self) -> Option<&MediaFile> {
        self.current.and_then(|i| self.playlist.get(i))
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn active_sink(&self) -> SinkVariant {
        self.sinks.active()
    }

    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    pub fn live_handles(&self) -> usize {
        self.handles.live_handles()
    }

    pub fn track_info(&self) -> Option<&Metadata> {
        self.track_info.as_ref()
    }

    /// Last reported position of the current track, in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Duration of the current track in seconds, 0 while unknown.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Whether the active sink itself considers playback paused.
    pub fn sink_paused(&self) -> bool {
        self.sinks.active_sink().is_paused()
    }

    /// Position as the active sink reports it right now.
    pub fn elapsed(&self) -> f64 {
        self.sinks.active_sink().current_time()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Whether a paused track may be resumed: something is loaded and the
    /// active sink has buffered at least the current frame.
    pub fn can_resume(&self) -> bool {
        let sink = self.sinks.active_sink();
        self.current.is_some()
            && sink.has_source()
            && sink.ready_state() >= ReadyState::HaveCurrentData
    }

    // --- selection and loading ---

    /// Replace the playlist with a new selection and load its first track.
    /// An empty selection is ignored.
    pub fn select_files(&mut self, files: Vec<MediaFile>, autoplay: bool) {
        if files.is_empty() {
            debug!("empty selection ignored");
            return;
        }
        info!(count = files.len(), "new selection");
        self.playlist = Playlist::new(files);
        self.load_track(0, autoplay);
    }

    /// Load the track at `index`, optionally starting playback once the sink
    /// is ready.
    pub fn load_track(&mut self, index: usize, autoplay: bool) {
        if self.playlist.is_empty() {
            self.reset_to_idle();
            return;
        }

        let index = if index < self.playlist.len() {
            index
        } else {
            match self.options.out_of_range {
                OutOfRangePolicy::WrapToStart => {
                    warn!(index, len = self.playlist.len(), "index out of range, wrapping to 0");
                    0
                }
                OutOfRangePolicy::Ignore => {
                    warn!(index, len = self.playlist.len(), "index out of range");
                    self.fail(ErrorKind::InvalidIndex);
                    return;
                }
            }
        };

        // Invalidate everything registered by earlier loads.
        self.generation = self.generation.next();
        let generation = self.generation;
        self.observers.retain(|o| o.generation == generation);

        self.release_handle();

        let Some(file) = self.playlist.get(index).cloned() else {
            return;
        };
        let variant = select_sink(&file);
        if !self.sinks.switch_active(variant) {
            self.sinks.reset(variant);
        }

        self.current = Some(index);
        self.position = 0.0;
        self.duration = 0.0;
        self.is_playing = false;
        self.track_info = None;
        self.state = PlaybackState::Loading;

        info!(index, file = %file.name, sink = variant.name(), autoplay, "loading track");

        let handle = match self.handles.acquire(&file) {
            Ok(h) => h,
            Err(e) => {
                error!(file = %file.name, error = %e, "could not create playable handle");
                self.fail(ErrorKind::ResourceCreation);
                return;
            }
        };

        let sink = self.sinks.active_sink_mut();
        sink.bind(SourceBinding {
            url: handle.url().to_string(),
            generation,
        });
        sink.load();
        sink.set_volume(self.volume);
        sink.set_muted(self.muted);
        self.handle = Some(handle);

        self.metadata.fetch(generation, &file);

        if autoplay {
            self.state = PlaybackState::ReadyAutoplayPending;
            self.observers.push(Observer {
                generation,
                kind: ObserverKind::Ready,
            });
            self.observers.push(Observer {
                generation,
                kind: ObserverKind::LoadError,
            });
        } else {
            self.state = PlaybackState::ReadyPaused;
        }
    }

    /// Release the handle, reset the sinks and forget the current track.
    pub fn teardown(&mut self) {
        self.generation = self.generation.next();
        self.observers.clear();
        self.release_handle();
        for variant in [SinkVariant::Audio, SinkVariant::Video] {
            self.sinks.reset(variant);
        }
        self.current = None;
        self.is_playing = false;
        self.track_info = None;
        self.position = 0.0;
        self.duration = 0.0;
        self.state = PlaybackState::Idle;
    }

    fn reset_to_idle(&mut self) {
        info!("playlist empty, resetting player");
        self.teardown();
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.handles.release(handle);
        }
    }

    /// Report an error. Only session errors park the session in `Error`; the
    /// recoverable kinds are logged and leave the state alone.
    fn fail(&mut self, kind: ErrorKind) {
        let name = self.current_file().map(|f| f.name.clone()).unwrap_or_default();
        if !kind.is_session_error() {
            warn!(kind = %kind, file = %name, "recoverable error");
            return;
        }
        error!(kind = %kind, file = %name, "playback error");
        self.is_playing = false;
        self.state = PlaybackState::Error(kind);
    }

    // --- event intake ---

    /// Drain sink notifications and metadata replies and apply them.
    pub fn pump(&mut self) {
        for (variant, notification) in self.sinks.poll_all() {
            self.on_sink_event(variant, notification);
        }
        for reply in self.metadata.drain() {
            self.on_metadata(reply);
        }
    }

    /// Apply one sink notification. Notifications from the inactive sink or
    /// from a superseded load are dropped.
    pub fn on_sink_event(&mut self, variant: SinkVariant, notification: SinkNotification) {
        if variant != self.sinks.active() || notification.generation != self.generation {
            debug!(
                sink = variant.name(),
                event = ?notification.event,
                "discarding stale sink notification"
            );
            return;
        }
        if self.current.is_none() {
            return;
        }

        match notification.event {
            SinkEvent::MetadataLoaded { duration } => {
                self.duration = duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);
                debug!(duration = self.duration, "duration known");
            }
            SinkEvent::CanPlay => {
                if self.take_observer(ObserverKind::Ready, notification.generation) {
                    self.discard_observers(ObserverKind::LoadError);
                    self.autoplay();
                }
            }
            SinkEvent::TimeUpdate { position } => {
                if position.is_finite() {
                    self.position = position.max(0.0);
                }
            }
            SinkEvent::Playing => {
                self.is_playing = true;
                self.state = PlaybackState::Playing;
            }
            SinkEvent::Paused => {
                self.is_playing = false;
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                }
            }
            SinkEvent::Ended => {
                self.is_playing = false;
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                }
                if self.options.auto_advance {
                    if let Some(next) = self.playlist.next_index(self.current) {
                        debug!(next, "track ended, advancing");
                        self.load_track(next, true);
                    }
                }
            }
            SinkEvent::Error(code) => {
                if self.take_observer(ObserverKind::LoadError, notification.generation) {
                    debug!("load failed before autoplay could start");
                    self.discard_observers(ObserverKind::Ready);
                }
                self.fail(ErrorKind::MediaLoad(code));
            }
        }
    }

    fn on_metadata(&mut self, reply: MetadataReply) {
        if reply.generation != self.generation {
            debug!(file = %reply.file.name, "discarding stale metadata reply");
            return;
        }
        if matches!(reply.outcome, MetadataOutcome::Failed(_)) {
            self.fail(ErrorKind::Metadata);
        }
        self.track_info = Some(Metadata::from_outcome(&reply.file, &reply.outcome));
    }

    /// Remove a one-shot observer of `kind`. Returns true only if one was
    /// registered for the current generation.
    fn take_observer(&mut self, kind: ObserverKind, generation: LoadGeneration) -> bool {
        let Some(pos) = self.observers.iter().position(|o| o.kind == kind) else {
            return false;
        };
        let observer = self.observers.remove(pos);
        if observer.generation != self.generation || observer.generation != generation {
            debug!(?kind, "stale observer ignored");
            return false;
        }
        true
    }

    fn discard_observers(&mut self, kind: ObserverKind) {
        self.observers.retain(|o| o.kind != kind);
    }

    fn autoplay(&mut self) {
        match self.sinks.active_sink_mut().play() {
            Ok(()) => debug!("autoplay requested"),
            Err(e) => {
                warn!(error = %e, "autoplay rejected");
                self.fail(ErrorKind::AutoplayRejected);
            }
        }
    }

    // --- transitions used by the transport controller ---

    pub(super) fn request_play(&mut self) -> Result<(), PlayError> {
        let result = self.sinks.active_sink_mut().play();
        if let Err(e) = &result {
            warn!(error = %e, "play request failed");
            self.is_playing = false;
            self.state = PlaybackState::Paused;
        }
        result
    }

    pub(super) fn request_pause(&mut self) {
        self.sinks.active_sink_mut().pause();
    }

    /// Jump back to the start of the current track without reloading it.
    pub(super) fn restart_in_place(&mut self) {
        let was_playing = self.is_playing;
        let sink = self.sinks.active_sink_mut();
        sink.set_current_time(0.0);
        if !was_playing {
            sink.pause();
        }
        self.position = 0.0;
        debug!(was_playing, "restarted current track");
    }

    /// Seek the active sink. Ignored while the duration is unknown.
    pub(super) fn seek_to(&mut self, seconds: f64) {
        let sink = self.sinks.active_sink_mut();
        let Some(duration) = sink.duration().filter(|d| d.is_finite()) else {
            debug!("seek ignored, duration unknown");
            return;
        };
        if !seconds.is_finite() {
            return;
        }
        let target = seconds.clamp(0.0, duration);
        sink.set_current_time(target);
        self.position = target;
    }

    /// Set the session volume; zero mutes, anything else unmutes.
    pub(super) fn apply_volume(&mut self, volume: f32) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.volume
        };
        self.volume = volume;
        self.muted = volume == 0.0;
        let sink = self.sinks.active_sink_mut();
        sink.set_volume(volume);
        sink.set_muted(self.muted);
    }

    pub(super) fn apply_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sinks.active_sink_mut().set_muted(muted);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.release_handle();
    }
}

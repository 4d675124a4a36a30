//! `MediaSink` backed by a `rodio::Sink` on a shared output mixer.
//!
//! Loading decodes the bytes behind the bound URL and prepares a paused
//! `Sink`. Lifecycle notifications are queued as they happen and handed out by
//! `poll`, which also detects the end of the stream and emits periodic
//! position updates. A source that played out is decoded again on the next
//! `play` or seek, so an ended track restarts like a host media element.

use std::io::Cursor;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rodio::decoder::DecoderError;
use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use tracing::{debug, warn};

use crate::error::{MediaErrorCode, PlayError};

use super::handle::SourceResolver;
use super::sink::MediaSink;
use super::types::{
    LoadGeneration, ReadyState, SinkEvent, SinkNotification, SinkVariant, SourceBinding,
};

const TIME_UPDATE_EVERY: Duration = Duration::from_millis(250);

pub struct RodioSink {
    variant: SinkVariant,
    mixer: Mixer,
    sources: SourceResolver,
    binding: Option<SourceBinding>,
    generation: LoadGeneration,
    sink: Option<Sink>,
    ready: ReadyState,
    duration: Option<f64>,
    volume: f32,
    muted: bool,
    playing: bool,
    last_time_update: Option<Instant>,
    events: Vec<SinkNotification>,
}

impl RodioSink {
    pub fn new(variant: SinkVariant, mixer: Mixer, sources: SourceResolver) -> Self {
        Self {
            variant,
            mixer,
            sources,
            binding: None,
            generation: LoadGeneration::default(),
            sink: None,
            ready: ReadyState::HaveNothing,
            duration: None,
            volume: 1.0,
            muted: false,
            playing: false,
            last_time_update: None,
            events: Vec::new(),
        }
    }

    fn emit(&mut self, event: SinkEvent) {
        self.events.push(SinkNotification {
            generation: self.generation,
            event,
        });
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn drop_sink(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.ready = ReadyState::HaveNothing;
        self.duration = None;
        self.playing = false;
        self.last_time_update = None;
    }

    fn fail(&mut self, code: MediaErrorCode) {
        self.drop_sink();
        self.emit(SinkEvent::Error(code));
    }

    /// Decode the bytes behind the bound URL.
    fn open(&self) -> Result<Decoder<Cursor<Arc<[u8]>>>, MediaErrorCode> {
        let url = self
            .binding
            .as_ref()
            .map(|b| b.url.as_str())
            .unwrap_or_default();
        let Some(bytes) = self.sources.resolve(url) else {
            warn!(sink = self.variant.name(), %url, "source url no longer resolves");
            return Err(MediaErrorCode::SrcNotSupported);
        };

        let byte_len = bytes.len() as u64;
        Decoder::builder()
            .with_data(Cursor::new(bytes))
            .with_byte_len(byte_len)
            .with_seekable(true)
            .build()
            .map_err(|e| {
                warn!(sink = self.variant.name(), error = %e, "failed to decode source");
                media_error(&e)
            })
    }

    /// Queue a fresh decoder once the previous one has played out, so an
    /// ended source can be played or sought again.
    fn rearm(&mut self) -> Result<(), MediaErrorCode> {
        if !self.sink.as_ref().is_some_and(Sink::empty) {
            return Ok(());
        }
        let decoder = self.open()?;
        if let Some(sink) = self.sink.as_ref() {
            sink.append(decoder);
        }
        debug!(sink = self.variant.name(), "source re-armed after end of stream");
        Ok(())
    }
}

fn media_error(e: &DecoderError) -> MediaErrorCode {
    match e {
        // The bytes are in memory, so an I/O error means the probe ran off
        // the end of data it could not recognize.
        DecoderError::UnrecognizedFormat | DecoderError::NoStreams | DecoderError::IoError(_) => {
            MediaErrorCode::SrcNotSupported
        }
        DecoderError::DecodeError(_) => MediaErrorCode::Decode,
        _ => MediaErrorCode::Other,
    }
}

impl MediaSink for RodioSink {
    fn bind(&mut self, binding: SourceBinding) {
        self.generation = binding.generation;
        self.binding = Some(binding);
    }

    fn clear(&mut self) {
        self.binding = None;
    }

    fn load(&mut self) {
        self.drop_sink();
        if self.binding.is_none() {
            return;
        }

        let decoder = match self.open() {
            Ok(d) => d,
            Err(code) => {
                self.fail(code);
                return;
            }
        };

        let duration = decoder.total_duration().map(|d| d.as_secs_f64());
        let sink = Sink::connect_new(&self.mixer);
        sink.pause();
        sink.set_volume(self.effective_volume());
        sink.append(decoder);

        self.sink = Some(sink);
        self.duration = duration;
        self.ready = ReadyState::HaveEnoughData;
        debug!(sink = self.variant.name(), ?duration, "source loaded");
        self.emit(SinkEvent::MetadataLoaded { duration });
        self.emit(SinkEvent::CanPlay);
    }

    fn play(&mut self) -> Result<(), PlayError> {
        if self.sink.is_none() {
            return Err(if self.binding.is_some() {
                PlayError::NotReady
            } else {
                PlayError::NoSource
            });
        }
        self.rearm()
            .map_err(|code| PlayError::Rejected(format!("cannot restart source: {code}")))?;
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
        }
        if !self.playing {
            self.playing = true;
            self.last_time_update = Some(Instant::now());
            self.emit(SinkEvent::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
        if self.playing {
            self.playing = false;
            self.emit(SinkEvent::Paused);
        }
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn has_source(&self) -> bool {
        self.binding.is_some()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn current_time(&self) -> f64 {
        self.sink
            .as_ref()
            .map(|s| s.get_pos().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn set_current_time(&mut self, seconds: f64) {
        if let Err(code) = self.rearm() {
            warn!(sink = self.variant.name(), %code, "cannot seek in ended source");
            return;
        }
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        let target = Duration::from_secs_f64(seconds.max(0.0));
        if let Err(e) = sink.try_seek(target) {
            warn!(sink = self.variant.name(), error = %e, "seek failed");
            return;
        }
        let position = self.current_time();
        self.emit(SinkEvent::TimeUpdate { position });
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(self.effective_volume());
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(self.effective_volume());
        }
    }

    fn poll(&mut self) -> Vec<SinkNotification> {
        if self.playing {
            let finished = self.sink.as_ref().map(Sink::empty).unwrap_or(true);
            if finished {
                if let Some(s) = self.sink.as_ref() {
                    s.pause();
                }
                self.playing = false;
                let position = self.duration.unwrap_or_else(|| self.current_time());
                self.emit(SinkEvent::TimeUpdate { position });
                self.emit(SinkEvent::Paused);
                self.emit(SinkEvent::Ended);
            } else if self
                .last_time_update
                .map(|t| t.elapsed() >= TIME_UPDATE_EVERY)
                .unwrap_or(true)
            {
                self.last_time_update = Some(Instant::now());
                let position = self.current_time();
                self.emit(SinkEvent::TimeUpdate { position });
            }
        }
        mem::take(&mut self.events)
    }
}

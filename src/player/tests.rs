use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use super::*;
use crate::config::{OutOfRangePolicy, UiSettings};
use crate::error::{ErrorKind, MediaErrorCode, PlayError, ResourceError, TagError};
use crate::library::MediaFile;
use crate::metadata::{FetchMode, MetadataFetcher, MetadataService, RawTags};

type Log = Rc<RefCell<Vec<String>>>;

struct FakeState {
    binding: Option<SourceBinding>,
    generation: LoadGeneration,
    loaded: bool,
    paused: bool,
    position: f64,
    duration: Option<f64>,
    volume: f32,
    muted: bool,
    /// What `load` reports as the duration.
    known_duration: Option<f64>,
    reject_play: bool,
    fail_load: Option<MediaErrorCode>,
    /// Played to the end; the next `play` starts over.
    ended: bool,
    queue: Vec<SinkNotification>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            binding: None,
            generation: LoadGeneration::default(),
            loaded: false,
            paused: true,
            position: 0.0,
            duration: None,
            volume: 1.0,
            muted: false,
            known_duration: Some(200.0),
            reject_play: false,
            fail_load: None,
            ended: false,
            queue: Vec::new(),
        }
    }
}

impl FakeState {
    fn emit(&mut self, event: SinkEvent) {
        self.queue.push(SinkNotification {
            generation: self.generation,
            event,
        });
    }
}

struct FakeSink {
    name: &'static str,
    state: Rc<RefCell<FakeState>>,
    log: Log,
}

impl FakeSink {
    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}:{call}", self.name));
    }
}

impl MediaSink for FakeSink {
    fn bind(&mut self, binding: SourceBinding) {
        self.record("bind");
        let mut s = self.state.borrow_mut();
        s.generation = binding.generation;
        s.binding = Some(binding);
    }

    fn clear(&mut self) {
        self.record("clear");
        self.state.borrow_mut().binding = None;
    }

    fn load(&mut self) {
        self.record("load");
        let mut s = self.state.borrow_mut();
        s.position = 0.0;
        s.paused = true;
        s.duration = None;
        s.loaded = false;
        if s.binding.is_none() {
            return;
        }
        if let Some(code) = s.fail_load {
            s.emit(SinkEvent::Error(code));
            return;
        }
        s.loaded = true;
        s.duration = s.known_duration;
        let duration = s.known_duration;
        s.emit(SinkEvent::MetadataLoaded { duration });
        s.emit(SinkEvent::CanPlay);
    }

    fn play(&mut self) -> Result<(), PlayError> {
        self.record("play");
        let mut s = self.state.borrow_mut();
        if s.reject_play {
            return Err(PlayError::Rejected("blocked".into()));
        }
        if !s.loaded {
            return Err(PlayError::NotReady);
        }
        if s.ended {
            s.ended = false;
            s.position = 0.0;
        }
        if s.paused {
            s.paused = false;
            s.emit(SinkEvent::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.record("pause");
        let mut s = self.state.borrow_mut();
        if !s.paused {
            s.paused = true;
            s.emit(SinkEvent::Paused);
        }
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn has_source(&self) -> bool {
        self.state.borrow().binding.is_some()
    }

    fn ready_state(&self) -> ReadyState {
        if self.state.borrow().loaded {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().position
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut s = self.state.borrow_mut();
        s.ended = false;
        s.position = seconds;
        s.emit(SinkEvent::TimeUpdate { position: seconds });
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn poll(&mut self) -> Vec<SinkNotification> {
        std::mem::take(&mut self.state.borrow_mut().queue)
    }
}

struct FakeHandles {
    next: u64,
    live: Rc<Cell<usize>>,
    fail_on: Option<String>,
    log: Log,
}

impl HandleProvider for FakeHandles {
    fn acquire(&mut self, file: &MediaFile) -> Result<PlaybackHandle, ResourceError> {
        if self.fail_on.as_deref() == Some(file.name.as_str()) {
            return Err(ResourceError::Empty(file.path.clone()));
        }
        self.next += 1;
        self.live.set(self.live.get() + 1);
        self.log.borrow_mut().push(format!("acquire:{}", file.name));
        Ok(PlaybackHandle::new(format!("fake:{}", self.next)))
    }

    fn release(&mut self, handle: PlaybackHandle) {
        self.live.set(self.live.get() - 1);
        self.log.borrow_mut().push(format!("release:{}", handle.url()));
    }

    fn live_handles(&self) -> usize {
        self.live.get()
    }
}

struct FakeTags;

impl MetadataService for FakeTags {
    fn read(&self, file: &MediaFile) -> Result<RawTags, TagError> {
        match file.name.as_str() {
            "a.mp3" => Ok(RawTags {
                title: Some("Song A".into()),
                artist: Some("Artist".into()),
                album: Some("Album".into()),
                picture: None,
            }),
            "b.mp4" => Err(TagError::new("tagFormat", "no tags")),
            _ => Ok(RawTags::default()),
        }
    }
}

struct Harness {
    session: PlaybackSession,
    audio: Rc<RefCell<FakeState>>,
    video: Rc<RefCell<FakeState>>,
    live: Rc<Cell<usize>>,
    log: Log,
}

impl Harness {
    fn build(
        options: SessionOptions,
        service: Option<Arc<dyn MetadataService>>,
        fail_on: Option<&str>,
    ) -> Self {
        let log: Log = Rc::default();
        let audio = Rc::new(RefCell::new(FakeState::default()));
        let video = Rc::new(RefCell::new(FakeState::default()));
        let live = Rc::new(Cell::new(0));

        let sinks = SinkPair::new(
            Box::new(FakeSink {
                name: "audio",
                state: audio.clone(),
                log: log.clone(),
            }),
            Box::new(FakeSink {
                name: "video",
                state: video.clone(),
                log: log.clone(),
            }),
        );
        let handles = FakeHandles {
            next: 0,
            live: live.clone(),
            fail_on: fail_on.map(str::to_string),
            log: log.clone(),
        };
        let session = PlaybackSession::new(
            sinks,
            Box::new(handles),
            MetadataFetcher::new(service, FetchMode::Inline),
            options,
        );

        Self {
            session,
            audio,
            video,
            live,
            log,
        }
    }

    fn new() -> Self {
        Self::build(SessionOptions::default(), None, None)
    }

    /// Pump until follow-up notifications (e.g. `Playing` after `CanPlay`)
    /// have been delivered too.
    fn settle(&mut self) {
        for _ in 0..3 {
            self.session.pump();
        }
    }

    fn position_in_log(&self, entry: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry} not in log: {:?}", self.log.borrow()))
    }
}

fn abc() -> Vec<MediaFile> {
    ["a.mp3", "b.mp4", "c.flac"]
        .into_iter()
        .map(MediaFile::from_path)
        .collect()
}

fn notify(session: &mut PlaybackSession, variant: SinkVariant, event: SinkEvent) {
    let generation = session.generation();
    session.on_sink_event(variant, SinkNotification { generation, event });
}

#[test]
fn load_without_autoplay_is_ready_paused_on_audio_sink() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);

    assert_eq!(h.session.state(), &PlaybackState::ReadyPaused);
    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.active_sink(), SinkVariant::Audio);
    assert_eq!(h.session.live_handles(), 1);
    assert_eq!(h.live.get(), 1);
    assert!(!h.session.is_playing());

    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::ReadyPaused);
    assert!(!h.session.is_playing());
    assert!(h.audio.borrow().paused);
    assert_eq!(h.session.duration(), 200.0);
}

#[test]
fn empty_selection_keeps_current_playlist() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    h.session.select_files(Vec::new(), true);

    assert_eq!(h.session.playlist().len(), 3);
    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.state(), &PlaybackState::ReadyPaused);
}

#[test]
fn next_to_mp4_switches_sink_and_releases_before_acquiring() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    h.settle();
    h.log.borrow_mut().clear();

    transport::next(&mut h.session);

    assert_eq!(h.session.current_index(), Some(1));
    assert_eq!(h.session.active_sink(), SinkVariant::Video);
    assert_eq!(h.session.state(), &PlaybackState::ReadyAutoplayPending);
    assert_eq!(h.live.get(), 1);

    let release = h.position_in_log("release:fake:1");
    let audio_clear = h.position_in_log("audio:clear");
    let acquire = h.position_in_log("acquire:b.mp4");
    let bind = h.position_in_log("video:bind");
    assert!(release < audio_clear);
    assert!(audio_clear < acquire);
    assert!(acquire < bind);
    assert!(h.audio.borrow().binding.is_none());

    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::Playing);
    assert!(h.session.is_playing());
    assert!(!h.video.borrow().paused);
    assert!(h.audio.borrow().paused);
}

#[test]
fn at_most_one_handle_is_live() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    assert_eq!(h.live.get(), 1);

    let steps: [fn(&mut PlaybackSession); 6] = [
        transport::next,
        transport::next,
        transport::previous,
        |s: &mut PlaybackSession| transport::select(s, 2),
        |s: &mut PlaybackSession| s.load_track(7, false),
        |s: &mut PlaybackSession| s.load_track(1, true),
    ];
    for step in steps {
        step(&mut h.session);
        h.settle();
        assert_eq!(h.live.get(), 1);
        assert_eq!(h.session.live_handles(), 1);
    }

    h.session.teardown();
    assert_eq!(h.live.get(), 0);
    assert_eq!(h.session.state(), &PlaybackState::Idle);
}

#[test]
fn dropping_the_session_releases_its_handle() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    assert_eq!(h.live.get(), 1);

    let Harness { session, live, .. } = h;
    drop(session);
    assert_eq!(live.get(), 0);
}

#[test]
fn navigation_wraps_in_both_directions() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);

    h.session.load_track(2, false);
    transport::next(&mut h.session);
    assert_eq!(h.session.current_index(), Some(0));

    transport::previous(&mut h.session);
    assert_eq!(h.session.current_index(), Some(2));

    h.session.load_track(5, false);
    assert_eq!(h.session.current_index(), Some(0));
}

#[test]
fn out_of_range_is_ignored_under_ignore_policy() {
    let options = SessionOptions {
        out_of_range: OutOfRangePolicy::Ignore,
        ..SessionOptions::default()
    };
    let mut h = Harness::build(options, None, None);
    h.session.select_files(abc(), false);
    h.session.load_track(1, false);
    let generation = h.session.generation();

    h.session.load_track(9, true);
    assert_eq!(h.session.current_index(), Some(1));
    assert_eq!(h.session.generation(), generation);
    assert_eq!(h.session.state(), &PlaybackState::ReadyPaused);
}

#[test]
fn previous_past_threshold_restarts_in_place_while_playing() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::Playing);

    h.audio.borrow_mut().position = 5.0;
    let generation = h.session.generation();
    transport::previous(&mut h.session);

    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.generation(), generation);
    assert_eq!(h.audio.borrow().position, 0.0);
    assert!(!h.audio.borrow().paused);
    assert_eq!(h.live.get(), 1);

    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::Playing);
    assert_eq!(h.session.position(), 0.0);
}

#[test]
fn previous_past_threshold_keeps_paused_track_paused() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    h.settle();

    h.audio.borrow_mut().position = 5.0;
    transport::previous(&mut h.session);
    h.settle();

    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.audio.borrow().position, 0.0);
    assert!(h.audio.borrow().paused);
    assert!(!h.session.is_playing());
    assert_eq!(h.session.state(), &PlaybackState::ReadyPaused);
}

#[test]
fn previous_near_start_loads_previous_track_with_autoplay() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    h.settle();

    h.audio.borrow_mut().position = 1.0;
    transport::previous(&mut h.session);

    assert_eq!(h.session.current_index(), Some(2));
    assert_eq!(h.session.active_sink(), SinkVariant::Audio);
    assert_eq!(h.session.state(), &PlaybackState::ReadyAutoplayPending);

    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::Playing);
}

#[test]
fn double_toggle_from_paused_converges_to_paused() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    h.settle();
    transport::toggle_play_pause(&mut h.session);
    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::Paused);

    transport::toggle_play_pause(&mut h.session);
    transport::toggle_play_pause(&mut h.session);
    h.settle();

    assert_eq!(h.session.state(), &PlaybackState::Paused);
    assert!(!h.session.is_playing());
    assert!(h.audio.borrow().paused);
}

#[test]
fn toggle_with_nothing_loaded_starts_first_track() {
    let mut h = Harness::new();
    transport::toggle_play_pause(&mut h.session);
    assert_eq!(h.session.state(), &PlaybackState::Idle);
    assert_eq!(h.live.get(), 0);

    h.session.select_files(abc(), false);
    h.session.teardown();
    assert_eq!(h.session.current_index(), None);

    transport::toggle_play_pause(&mut h.session);
    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.state(), &PlaybackState::ReadyAutoplayPending);
}

#[test]
fn failed_play_request_reconciles_to_paused() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    h.settle();
    h.audio.borrow_mut().reject_play = true;

    transport::toggle_play_pause(&mut h.session);

    assert_eq!(h.session.state(), &PlaybackState::Paused);
    assert!(!h.session.is_playing());
}

#[test]
fn rejected_autoplay_keeps_track_loaded_in_error_state() {
    let mut h = Harness::new();
    h.audio.borrow_mut().reject_play = true;
    h.session.select_files(abc(), true);
    h.settle();

    assert_eq!(
        h.session.state(),
        &PlaybackState::Error(ErrorKind::AutoplayRejected)
    );
    assert_eq!(h.session.live_handles(), 1);
    assert!(!h.session.is_playing());

    let view = h.session.view(&UiSettings::default());
    assert_eq!(view.title, "Error");
    assert_eq!(view.credits, "(interaction required?) a.mp3");
    assert!(view.art.is_none());
}

#[test]
fn load_error_abandons_autoplay() {
    let mut h = Harness::new();
    h.audio.borrow_mut().fail_load = Some(MediaErrorCode::Decode);
    h.session.select_files(abc(), true);
    h.settle();

    assert_eq!(
        h.session.state(),
        &PlaybackState::Error(ErrorKind::MediaLoad(MediaErrorCode::Decode))
    );
    assert!(!h.log.borrow().iter().any(|e| e == "audio:play"));

    let view = h.session.view(&UiSettings::default());
    assert_eq!(view.credits, "(decode error) a.mp3");
}

#[test]
fn handle_failure_sets_error_and_next_recovers() {
    let mut h = Harness::build(SessionOptions::default(), None, Some("b.mp4"));
    h.session.select_files(abc(), false);

    transport::next(&mut h.session);
    assert_eq!(
        h.session.state(),
        &PlaybackState::Error(ErrorKind::ResourceCreation)
    );
    assert_eq!(h.session.current_index(), Some(1));
    assert_eq!(h.live.get(), 0);

    transport::next(&mut h.session);
    assert_eq!(h.session.current_index(), Some(2));
    assert_eq!(h.session.state(), &PlaybackState::ReadyAutoplayPending);
    assert_eq!(h.live.get(), 1);
}

#[test]
fn stale_notifications_are_discarded() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    let first = h.session.generation();

    // Superseded before the audio sink ever reported readiness.
    transport::next(&mut h.session);
    h.settle();

    assert!(h.audio.borrow().paused);
    assert!(!h.log.borrow().iter().any(|e| e == "audio:play"));
    assert_eq!(h.session.state(), &PlaybackState::Playing);

    h.session.on_sink_event(
        SinkVariant::Video,
        SinkNotification {
            generation: first,
            event: SinkEvent::Error(MediaErrorCode::Decode),
        },
    );
    notify(&mut h.session, SinkVariant::Audio, SinkEvent::Paused);
    assert_eq!(h.session.state(), &PlaybackState::Playing);
    assert!(h.session.is_playing());
}

#[test]
fn ended_advances_with_autoplay() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    h.settle();

    notify(&mut h.session, SinkVariant::Audio, SinkEvent::Ended);
    assert_eq!(h.session.current_index(), Some(1));
    assert_eq!(h.session.active_sink(), SinkVariant::Video);
    h.settle();
    assert_eq!(h.session.state(), &PlaybackState::Playing);
}

#[test]
fn ended_without_auto_advance_stops_on_track() {
    let options = SessionOptions {
        auto_advance: false,
        ..SessionOptions::default()
    };
    let mut h = Harness::build(options, None, None);
    h.session.select_files(abc(), true);
    h.settle();

    notify(&mut h.session, SinkVariant::Audio, SinkEvent::Ended);
    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.state(), &PlaybackState::Paused);
    assert!(!h.session.is_playing());
}

fn end_of_track(h: &mut Harness) {
    {
        let mut a = h.audio.borrow_mut();
        a.paused = true;
        a.ended = true;
        a.position = 200.0;
    }
    notify(&mut h.session, SinkVariant::Audio, SinkEvent::Paused);
    notify(&mut h.session, SinkVariant::Audio, SinkEvent::Ended);
}

#[test]
fn play_after_end_replays_the_same_track() {
    let options = SessionOptions {
        auto_advance: false,
        ..SessionOptions::default()
    };
    let mut h = Harness::build(options, None, None);
    h.session.select_files(abc(), true);
    h.settle();
    end_of_track(&mut h);
    assert!(h.session.can_resume());

    transport::toggle_play_pause(&mut h.session);
    h.settle();

    assert_eq!(h.session.state(), &PlaybackState::Playing);
    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.audio.borrow().position, 0.0);
    assert_eq!(h.live.get(), 1);
    let acquires = h.log.borrow().iter().filter(|e| e.starts_with("acquire:")).count();
    assert_eq!(acquires, 1);
}

#[test]
fn previous_after_end_rewinds_without_playing() {
    let options = SessionOptions {
        auto_advance: false,
        ..SessionOptions::default()
    };
    let mut h = Harness::build(options, None, None);
    h.session.select_files(abc(), true);
    h.settle();
    end_of_track(&mut h);

    transport::previous(&mut h.session);
    h.settle();

    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.position(), 0.0);
    assert!(h.audio.borrow().paused);
    assert_eq!(h.session.state(), &PlaybackState::Paused);
}

#[test]
fn zero_volume_mutes_and_nonzero_unmutes() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);

    transport::set_volume(&mut h.session, 0.0);
    assert!(h.session.muted());
    assert!(h.audio.borrow().muted);

    transport::toggle_mute(&mut h.session);
    transport::toggle_mute(&mut h.session);
    transport::set_volume(&mut h.session, 0.4);
    assert!(!h.session.muted());
    assert!(!h.audio.borrow().muted);
    assert_eq!(h.audio.borrow().volume, 0.4);

    transport::set_volume(&mut h.session, 1.7);
    assert_eq!(h.session.volume(), 1.0);
}

#[test]
fn volume_carries_over_to_the_next_sink() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    transport::set_volume(&mut h.session, 0.25);
    transport::next(&mut h.session);

    assert_eq!(h.video.borrow().volume, 0.25);
    assert!(!h.video.borrow().muted);
}

#[test]
fn seek_is_clamped_and_needs_a_known_duration() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);
    h.settle();

    transport::seek(&mut h.session, 500.0);
    assert_eq!(h.audio.borrow().position, 200.0);
    transport::seek(&mut h.session, -3.0);
    assert_eq!(h.audio.borrow().position, 0.0);
    transport::seek_by(&mut h.session, 5.0);
    assert_eq!(h.audio.borrow().position, 5.0);

    h.video.borrow_mut().known_duration = None;
    transport::next(&mut h.session);
    h.settle();
    h.video.borrow_mut().position = 12.0;
    transport::seek(&mut h.session, 50.0);
    assert_eq!(h.video.borrow().position, 12.0);
}

#[test]
fn apply_dispatches_commands() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);

    transport::apply(&mut h.session, ControlCmd::Select(2));
    assert_eq!(h.session.current_index(), Some(2));
    transport::apply(&mut h.session, ControlCmd::Next);
    assert_eq!(h.session.current_index(), Some(0));
    transport::apply(&mut h.session, ControlCmd::SetVolume(0.5));
    transport::apply(&mut h.session, ControlCmd::VolumeBy(-0.5));
    assert!(h.session.muted());
}

#[test]
fn idle_view_shows_placeholder() {
    let h = Harness::new();
    let view = h.session.view(&UiSettings::default());
    assert_eq!(view.title, "Select files...");
    assert_eq!(view.credits, "");
    assert_eq!(view.highlight, None);
    assert_eq!(view.elapsed_text, "0:00");
    assert_eq!(view.progress_percent, 0.0);
}

#[test]
fn view_without_tag_reader_falls_back_to_file_name() {
    let mut h = Harness::new();
    h.session.select_files(abc(), false);

    let loading = h.session.view(&UiSettings::default());
    assert_eq!(loading.title, "a");
    assert_eq!(loading.credits, "Loading...");

    h.settle();
    let view = h.session.view(&UiSettings::default());
    assert_eq!(view.title, "a");
    assert_eq!(view.credits, "(metadata unavailable)");
    assert!(view.art.is_none());
    assert_eq!(view.highlight, Some(0));
}

#[test]
fn view_reflects_progress() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    h.settle();
    notify(
        &mut h.session,
        SinkVariant::Audio,
        SinkEvent::TimeUpdate { position: 50.0 },
    );

    let view = h.session.view(&UiSettings::default());
    assert!(view.is_playing);
    assert_eq!(view.elapsed_text, "0:50");
    assert_eq!(view.total_text, "3:20");
    assert_eq!(view.progress_percent, 25.0);
    assert_eq!(view.volume_percent, 100.0);
}

#[test]
fn metadata_replies_follow_the_current_track() {
    let service: Arc<dyn MetadataService> = Arc::new(FakeTags);
    let mut h = Harness::build(SessionOptions::default(), Some(service), None);
    let ui = UiSettings::default();

    h.session.select_files(abc(), false);
    h.settle();
    let view = h.session.view(&ui);
    assert_eq!(view.title, "Song A");
    assert_eq!(view.credits, "Artist - Album");

    // a.mp3's reply is still queued when b.mp4 takes over.
    h.session.load_track(0, false);
    transport::next(&mut h.session);
    h.settle();
    let view = h.session.view(&ui);
    assert_eq!(view.title, "b");
    assert_eq!(view.credits, "(error reading metadata)");

    transport::next(&mut h.session);
    h.settle();
    let view = h.session.view(&ui);
    assert_eq!(view.title, "c");
    assert_eq!(view.credits, "");
}

#[test]
fn tag_failure_leaves_playback_running() {
    let service: Arc<dyn MetadataService> = Arc::new(FakeTags);
    let mut h = Harness::build(SessionOptions::default(), Some(service), None);
    h.session.select_files(abc(), true);
    h.settle();

    transport::next(&mut h.session);
    h.settle();
    assert_eq!(h.session.current_file().map(|f| f.name.as_str()), Some("b.mp4"));
    assert_eq!(h.session.state(), &PlaybackState::Playing);
    assert!(h.session.is_playing());
}

#[test]
fn selecting_the_playing_entry_reloads_it() {
    let mut h = Harness::new();
    h.session.select_files(abc(), true);
    h.settle();
    notify(
        &mut h.session,
        SinkVariant::Audio,
        SinkEvent::TimeUpdate { position: 50.0 },
    );
    let generation = h.session.generation();

    transport::select(&mut h.session, 0);
    assert!(h.session.generation() > generation);
    assert_eq!(h.session.position(), 0.0);

    h.settle();
    assert_eq!(h.session.current_index(), Some(0));
    assert_eq!(h.session.state(), &PlaybackState::Playing);
    assert_eq!(h.live.get(), 1);
}

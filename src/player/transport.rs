//! User-facing transport operations.
//!
//! These only consult the session and call its transition methods; the
//! session stays the single owner of player state.

use tracing::{debug, warn};

use super::session::PlaybackSession;

/// A transport command, as produced by key bindings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlCmd {
    PlayPause,
    Next,
    Prev,
    /// Absolute position in seconds.
    Seek(f64),
    /// Relative scrub in seconds.
    SeekBy(f64),
    SetVolume(f32),
    VolumeBy(f32),
    ToggleMute,
    /// Activate a playlist entry.
    Select(usize),
}

pub fn apply(session: &mut PlaybackSession, cmd: ControlCmd) {
    debug!(?cmd, "transport");
    match cmd {
        ControlCmd::PlayPause => toggle_play_pause(session),
        ControlCmd::Next => next(session),
        ControlCmd::Prev => previous(session),
        ControlCmd::Seek(secs) => seek(session, secs),
        ControlCmd::SeekBy(delta) => seek_by(session, delta),
        ControlCmd::SetVolume(v) => set_volume(session, v),
        ControlCmd::VolumeBy(delta) => volume_by(session, delta),
        ControlCmd::ToggleMute => toggle_mute(session),
        ControlCmd::Select(index) => select(session, index),
    }
}

pub fn toggle_play_pause(session: &mut PlaybackSession) {
    if !session.can_resume() {
        warn!(
            index = ?session.current_index(),
            "nothing ready to play"
        );
        if session.current_index().is_none() && !session.playlist().is_empty() {
            session.load_track(0, true);
        }
        return;
    }

    // Ask the sink, not `is_playing`: a play request may still be in flight.
    if !session.sink_paused() {
        session.request_pause();
    } else {
        // A refusal is logged and reconciled by the session; not fatal.
        let _ = session.request_play();
    }
}

pub fn next(session: &mut PlaybackSession) {
    let Some(index) = session.playlist().next_index(session.current_index()) else {
        debug!("next ignored, playlist empty");
        return;
    };
    session.load_track(index, true);
}

/// Restart the current track if it is past the restart threshold, otherwise
/// go to the previous track.
pub fn previous(session: &mut PlaybackSession) {
    if session.playlist().is_empty() {
        debug!("previous ignored, playlist empty");
        return;
    }
    if session.current_index().is_some()
        && session.elapsed() > session.options().restart_threshold_secs
    {
        session.restart_in_place();
        return;
    }
    if let Some(index) = session.playlist().prev_index(session.current_index()) {
        session.load_track(index, true);
    }
}

pub fn seek(session: &mut PlaybackSession, seconds: f64) {
    session.seek_to(seconds);
}

pub fn seek_by(session: &mut PlaybackSession, delta: f64) {
    let target = session.elapsed() + delta;
    session.seek_to(target);
}

pub fn set_volume(session: &mut PlaybackSession, volume: f32) {
    session.apply_volume(volume);
}

pub fn volume_by(session: &mut PlaybackSession, delta: f32) {
    let target = session.volume() + delta;
    session.apply_volume(target);
}

pub fn toggle_mute(session: &mut PlaybackSession) {
    let muted = !session.muted();
    session.apply_muted(muted);
}

pub fn select(session: &mut PlaybackSession, index: usize) {
    session.load_track(index, true);
}

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::config;
use crate::library;
use crate::player::{ControlCmd, PlaybackSession, transport};
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: feeds sink and metadata events into the session,
/// draws, and handles input. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        session.pump();
        app.sync_with_loaded(session.current_index());

        let view = session.view(&settings.ui);
        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                session.playlist(),
                &view,
                &settings.ui,
                &settings.controls,
            )
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, session, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Map a key to a transport command. `selected` is the playlist cursor.
fn transport_command(
    code: KeyCode,
    selected: usize,
    controls: &config::ControlsSettings,
) -> Option<ControlCmd> {
    let scrub = controls.scrub_seconds as f64;
    let step = controls.volume_step;
    match code {
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(ControlCmd::PlayPause),
        KeyCode::Char('l') => Some(ControlCmd::Next),
        KeyCode::Char('h') => Some(ControlCmd::Prev),
        KeyCode::Char('L') => Some(ControlCmd::SeekBy(scrub)),
        KeyCode::Char('H') => Some(ControlCmd::SeekBy(-scrub)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(ControlCmd::VolumeBy(step)),
        KeyCode::Char('-') => Some(ControlCmd::VolumeBy(-step)),
        KeyCode::Char('m') => Some(ControlCmd::ToggleMute),
        KeyCode::Enter => Some(ControlCmd::Select(selected)),
        _ => None,
    }
}

/// Build a fresh playlist from the command-line paths.
fn reselect(settings: &config::Settings, app: &mut App, session: &mut PlaybackSession) {
    match library::select(&app.sources, &settings.library) {
        Ok(files) if files.is_empty() => warn!("reselect found no files"),
        Ok(files) => {
            info!(count = files.len(), "reselected files");
            app.reset_len(files.len());
            app.follow_playback_on();
            session.select_files(files, settings.playback.autoplay_on_select);
        }
        Err(e) => warn!(error = %e, "reselect failed"),
    }
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession,
    state: &mut EventLoopState,
) -> bool {
    if let Some(cmd) = transport_command(key.code, app.selected, &settings.controls) {
        state.pending_gg = false;
        match cmd {
            ControlCmd::Select(idx) => {
                if !app.has_tracks() {
                    return false;
                }
                app.follow_playback_on();
                app.set_pending_follow_index(idx);
            }
            ControlCmd::PlayPause | ControlCmd::Next | ControlCmd::Prev => {
                app.follow_playback_on();
            }
            _ => {}
        }
        transport::apply(session, cmd);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => {
            state.pending_gg = false;
            return true;
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            state.pending_gg = false;
            app.follow_playback_off();
            app.last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.pending_gg = false;
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.pending_gg = false;
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char('K') => {
            state.pending_gg = false;
            app.toggle_info_window();
        }
        KeyCode::Char('R') => {
            state.pending_gg = false;
            reselect(settings, app, session);
        }
        KeyCode::Char(_) => {
            // g pending should clear on any other printable char
            state.pending_gg = false;
        }
        _ => {}
    }

    false
}

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rodio::OutputStreamBuilder;
use tracing::info;

use crate::app::App;
use crate::library;
use crate::metadata::{FetchMode, LoftyReader, MetadataFetcher, MetadataService};
use crate::player::{
    ObjectUrlRegistry, PlaybackSession, RodioSink, SessionOptions, SinkPair, SinkVariant,
};

mod event_loop;
mod logging;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    logging::init_logging(&settings.log);

    let mut sources: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    if sources.is_empty() {
        sources.push(env::current_dir()?);
    }
    let files = library::select(&sources, &settings.library)?;
    info!(count = files.len(), "files selected");

    let mut stream = OutputStreamBuilder::open_default_stream()?;
    stream.log_on_drop(false);

    let registry = ObjectUrlRegistry::new();
    let resolver = registry.resolver();
    let sinks = SinkPair::new(
        Box::new(RodioSink::new(
            SinkVariant::Audio,
            stream.mixer().clone(),
            resolver.clone(),
        )),
        Box::new(RodioSink::new(
            SinkVariant::Video,
            stream.mixer().clone(),
            resolver,
        )),
    );

    let service: Option<Arc<dyn MetadataService>> = if settings.metadata.enabled {
        Some(Arc::new(LoftyReader))
    } else {
        None
    };
    let mode = if settings.metadata.background {
        FetchMode::Background
    } else {
        FetchMode::Inline
    };

    let mut session = PlaybackSession::new(
        sinks,
        Box::new(registry),
        MetadataFetcher::new(service, mode),
        SessionOptions::from(&settings.playback),
    );
    let mut app = App::new(files.len(), sources);
    session.select_files(files, settings.playback.autoplay_on_select);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(&mut terminal, &settings, &mut app, &mut session, &mut state)
    })();

    session.teardown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

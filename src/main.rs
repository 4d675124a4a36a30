mod app;
mod config;
mod error;
mod format;
mod library;
mod metadata;
mod player;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}

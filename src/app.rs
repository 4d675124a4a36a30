//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the playlist cursor and
//! popup state.

mod model;

pub use model::*;

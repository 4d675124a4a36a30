//! Library module: the user's file selection and the playlist built from it.
//!
//! `library::model` holds `MediaFile` and `Playlist`; `library::select` turns
//! command-line paths into the ordered list of files.

mod model;
mod select;

pub use model::*;
pub use select::select;

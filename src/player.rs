//! Playback core: the track load state machine, handles, sinks and the
//! transport controller.

mod handle;
mod rodio_sink;
mod session;
mod sink;
pub mod transport;
mod types;
mod view;

pub use handle::{HandleProvider, ObjectUrlRegistry, PlaybackHandle, SourceResolver};
pub use rodio_sink::RodioSink;
pub use session::{PlaybackSession, SessionOptions};
pub use sink::{MediaSink, SinkPair, select_sink};
pub use transport::ControlCmd;
pub use types::{
    LoadGeneration, PlaybackState, ReadyState, SinkEvent, SinkNotification, SinkVariant,
    SourceBinding,
};
pub use view::ViewModel;

#[cfg(test)]
mod tests;

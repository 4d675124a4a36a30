//! Error types for the player core.
//!
//! Host-facing failures are typed with `thiserror`; the session keeps an
//! `ErrorKind` describing why it is sitting in its error state.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A playable handle could not be minted for a file.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0:?} is empty")]
    Empty(PathBuf),
}

/// A sink refused to start playback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("no source is bound to the sink")]
    NoSource,
    #[error("source is not ready to play")]
    NotReady,
    #[error("playback was rejected by the host: {0}")]
    Rejected(String),
}

/// Error descriptor returned by a metadata service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {info}")]
pub struct TagError {
    pub kind: String,
    pub info: String,
}

impl TagError {
    pub fn new(kind: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            info: info.into(),
        }
    }
}

/// The user's file selection could not be turned into a playlist.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("{0:?} does not exist")]
    Missing(PathBuf),
    #[error("failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Error codes a media sink can report, mirroring the usual host media errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaErrorCode {
    Decode,
    SrcNotSupported,
    Other,
}

impl fmt::Display for MediaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => write!(f, "decode error"),
            Self::SrcNotSupported => write!(f, "format not supported"),
            Self::Other => write!(f, "unknown error"),
        }
    }
}

/// Why the session is (or would have been) in its error state.
///
/// `InvalidIndex` and `Metadata` are recoverable and never park the session in
/// `Error`; they exist so callers can log them uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    ResourceCreation,
    MediaLoad(MediaErrorCode),
    AutoplayRejected,
    Metadata,
    InvalidIndex,
}

impl ErrorKind {
    /// Whether this kind moves the session into `Error`.
    pub fn is_session_error(&self) -> bool {
        !matches!(self, Self::Metadata | Self::InvalidIndex)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreation => write!(f, "could not create playback URL"),
            Self::MediaLoad(code) => write!(f, "{code}"),
            Self::AutoplayRejected => write!(f, "interaction required?"),
            Self::Metadata => write!(f, "metadata unavailable"),
            Self::InvalidIndex => write!(f, "invalid track index"),
        }
    }
}

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::TagError;
use crate::library::MediaFile;
use crate::player::LoadGeneration;

use super::service::{MetadataService, Picture, RawTags};

/// Where the tag service runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// On a worker thread per request.
    Background,
    /// On the caller's thread; the reply is still only delivered through `drain`.
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOutcome {
    Tags(RawTags),
    Failed(TagError),
    /// No tag service is installed.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct MetadataReply {
    pub generation: LoadGeneration,
    pub file: MediaFile,
    pub outcome: MetadataOutcome,
}

/// The artist/album line, before it is turned into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credits {
    /// Artist and/or album, absent fields omitted.
    Known(Vec<String>),
    /// Tags were read but carry neither artist nor album.
    Blank,
    Unavailable,
    Failed,
}

/// Cover art ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
    pub mime: String,
    pub alt: String,
    /// Size of the embedded image in bytes.
    pub size: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoverArtError {
    #[error("embedded picture has no data")]
    Empty,
    #[error("{0:?} is not an image type")]
    NotAnImage(String),
}

/// Encode an embedded picture as an inline `data:` URL.
pub fn cover_art(picture: &Picture, album: Option<&str>) -> Result<CoverArt, CoverArtError> {
    if picture.data.is_empty() {
        return Err(CoverArtError::Empty);
    }
    let mime = picture.format.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") || mime.len() == "image/".len() {
        return Err(CoverArtError::NotAnImage(picture.format.clone()));
    }

    let payload = general_purpose::STANDARD.encode(&picture.data);
    Ok(CoverArt {
        data_url: format!("data:{mime};base64,{payload}"),
        alt: album.unwrap_or("Album Art").to_string(),
        mime,
        size: picture.data.len(),
    })
}

/// Display-ready metadata for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub credits: Credits,
    pub art: Option<CoverArt>,
}

impl Metadata {
    /// Normalize a service outcome. The title always falls back to the file's
    /// display name; a bad picture only costs the art.
    pub fn from_outcome(file: &MediaFile, outcome: &MetadataOutcome) -> Self {
        match outcome {
            MetadataOutcome::Tags(tags) => {
                let title = tags.title.clone().unwrap_or_else(|| file.display_name());

                let parts: Vec<String> = [tags.artist.as_deref(), tags.album.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect();
                let credits = if parts.is_empty() {
                    Credits::Blank
                } else {
                    Credits::Known(parts)
                };

                let art = tags.picture.as_ref().and_then(|p| {
                    cover_art(p, tags.album.as_deref())
                        .map_err(|e| warn!(file = %file.name, error = %e, "dropping cover art"))
                        .ok()
                });

                Self {
                    title,
                    credits,
                    art,
                }
            }
            MetadataOutcome::Failed(_) => Self {
                title: file.display_name(),
                credits: Credits::Failed,
                art: None,
            },
            MetadataOutcome::Unavailable => Self {
                title: file.display_name(),
                credits: Credits::Unavailable,
                art: None,
            },
        }
    }
}

/// Runs the optional tag service and hands replies back over a channel.
pub struct MetadataFetcher {
    service: Option<Arc<dyn MetadataService>>,
    mode: FetchMode,
    tx: Sender<MetadataReply>,
    rx: Receiver<MetadataReply>,
}

impl MetadataFetcher {
    pub fn new(service: Option<Arc<dyn MetadataService>>, mode: FetchMode) -> Self {
        if service.is_none() {
            warn!("no tag reader installed; metadata disabled");
        }
        let (tx, rx) = mpsc::channel::<MetadataReply>();
        Self {
            service,
            mode,
            tx,
            rx,
        }
    }

    /// Request metadata for `file`. Never blocks in `Background` mode.
    pub fn fetch(&self, generation: LoadGeneration, file: &MediaFile) {
        let Some(service) = self.service.clone() else {
            let _ = self.tx.send(MetadataReply {
                generation,
                file: file.clone(),
                outcome: MetadataOutcome::Unavailable,
            });
            return;
        };

        let tx = self.tx.clone();
        let file = file.clone();
        let work = move || {
            let outcome = match service.read(&file) {
                Ok(tags) => MetadataOutcome::Tags(tags),
                Err(e) => {
                    debug!(
                        file = %file.name,
                        kind = %e.kind,
                        info = %e.info,
                        "metadata read failed"
                    );
                    MetadataOutcome::Failed(e)
                }
            };
            let _ = tx.send(MetadataReply {
                generation,
                file,
                outcome,
            });
        };

        match self.mode {
            FetchMode::Background => {
                thread::spawn(work);
            }
            FetchMode::Inline => work(),
        }
    }

    /// Replies that have arrived so far.
    pub fn drain(&self) -> Vec<MetadataReply> {
        self.rx.try_iter().collect()
    }
}

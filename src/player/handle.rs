//! Playable handles: transient `blob:` style URLs minted for a selected file.
//!
//! The session holds at most one `PlaybackHandle`. Sinks never see the handle
//! itself, only its URL, which they resolve through a `SourceResolver`; once
//! the handle is released the URL stops resolving.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::ResourceError;
use crate::library::MediaFile;

/// Single-owner token for a live playable URL. Not `Clone`: releasing it
/// consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PlaybackHandle {
    url: String,
}

impl PlaybackHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Mints and revokes playable handles.
pub trait HandleProvider {
    fn acquire(&mut self, file: &MediaFile) -> Result<PlaybackHandle, ResourceError>;
    fn release(&mut self, handle: PlaybackHandle);
    /// Number of handles minted and not yet released.
    fn live_handles(&self) -> usize;
}

type SourceTable = Arc<Mutex<HashMap<String, Arc<[u8]>>>>;

/// In-process handle registry mapping `blob:playdeck/<n>` URLs to file bytes.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    next_id: u64,
    sources: SourceTable,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view handed to sinks.
    pub fn resolver(&self) -> SourceResolver {
        SourceResolver {
            sources: self.sources.clone(),
        }
    }
}

impl HandleProvider for ObjectUrlRegistry {
    fn acquire(&mut self, file: &MediaFile) -> Result<PlaybackHandle, ResourceError> {
        let bytes = file.read_bytes().map_err(|source| ResourceError::Read {
            path: file.path.clone(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(ResourceError::Empty(file.path.clone()));
        }

        self.next_id += 1;
        let url = format!("blob:playdeck/{}", self.next_id);
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), Arc::from(bytes));
        debug!(%url, file = %file.name, "object url created");
        Ok(PlaybackHandle::new(url))
    }

    fn release(&mut self, handle: PlaybackHandle) {
        let removed = self
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle.url())
            .is_some();
        debug!(url = %handle.url(), removed, "object url revoked");
    }

    fn live_handles(&self) -> usize {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Looks up the bytes behind a live URL.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    sources: SourceTable,
}

impl SourceResolver {
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn acquire_then_release_revokes_the_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"ID3 fake bytes").unwrap();

        let mut registry = ObjectUrlRegistry::new();
        let resolver = registry.resolver();
        let handle = registry.acquire(&MediaFile::from_path(&path)).unwrap();
        let url = handle.url().to_string();

        assert!(url.starts_with("blob:playdeck/"));
        assert_eq!(registry.live_handles(), 1);
        assert_eq!(resolver.resolve(&url).as_deref(), Some(&b"ID3 fake bytes"[..]));

        registry.release(handle);
        assert_eq!(registry.live_handles(), 0);
        assert!(resolver.resolve(&url).is_none());
    }

    #[test]
    fn acquire_mints_distinct_urls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"x").unwrap();
        let file = MediaFile::from_path(&path);

        let mut registry = ObjectUrlRegistry::new();
        let first = registry.acquire(&file).unwrap();
        let second = registry.acquire(&file).unwrap();
        assert_ne!(first.url(), second.url());
    }

    #[test]
    fn acquire_fails_for_missing_or_empty_files() {
        let dir = tempdir().unwrap();
        let mut registry = ObjectUrlRegistry::new();

        let missing = MediaFile::from_path(dir.path().join("gone.mp3"));
        assert!(matches!(
            registry.acquire(&missing),
            Err(ResourceError::Read { .. })
        ));

        let empty_path = dir.path().join("empty.mp3");
        fs::write(&empty_path, b"").unwrap();
        assert!(matches!(
            registry.acquire(&MediaFile::from_path(&empty_path)),
            Err(ResourceError::Empty(_))
        ));
        assert_eq!(registry.live_handles(), 0);
    }
}

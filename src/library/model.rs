use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A file the user selected for playback.
///
/// Immutable once created; the playlist holds these until a new selection
/// replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Raw file name, extension included.
    pub name: String,
    /// Declared media type, e.g. `audio/mpeg`.
    pub media_type: Option<String>,
}

impl MediaFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = guess_media_type(&path).map(str::to_string);
        Self {
            path,
            name,
            media_type,
        }
    }

    /// File name without its last extension.
    pub fn display_name(&self) -> String {
        strip_extension(&self.name).to_string()
    }

    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// Drops a trailing `.ext`. A bare `.mp3` strips to an empty name, while a
/// trailing dot with nothing after it is kept.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Guess a media type from the extension. Hosts normally report this with the
/// file; natively we only have the name.
pub fn guess_media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// Ordered, index-addressable list of selected files.
///
/// Indices stay stable for the playlist's lifetime; a new selection builds a
/// new `Playlist` rather than editing this one.
#[derive(Debug, Default, Clone)]
pub struct Playlist {
    files: Vec<MediaFile>,
}

impl Playlist {
    pub fn new(files: Vec<MediaFile>) -> Self {
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaFile> {
        self.files.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaFile> {
        self.files.iter()
    }

    /// Index after `current`, wrapping to the first entry.
    /// Nothing loaded counts as "before the first entry".
    pub fn next_index(&self, current: Option<usize>) -> Option<usize> {
        if self.files.is_empty() {
            return None;
        }
        match current {
            Some(i) if i + 1 < self.files.len() => Some(i + 1),
            Some(_) => Some(0),
            None => Some(0),
        }
    }

    /// Index before `current`, wrapping to the last entry.
    pub fn prev_index(&self, current: Option<usize>) -> Option<usize> {
        if self.files.is_empty() {
            return None;
        }
        let last = self.files.len() - 1;
        match current {
            Some(0) | None => Some(last),
            Some(i) if i > last => Some(last),
            Some(i) => Some(i - 1),
        }
    }
}

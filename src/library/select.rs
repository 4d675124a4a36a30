use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::SelectionError;

use super::model::MediaFile;

fn is_media_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Turn the user's selection into an ordered list of files.
///
/// Explicit files are kept as given, in order. Directories are expanded into
/// the media files they contain (filtered by `settings.extensions`), sorted by
/// path so the resulting order is deterministic.
pub fn select(
    paths: &[PathBuf],
    settings: &LibrarySettings,
) -> Result<Vec<MediaFile>, SelectionError> {
    let mut files: Vec<MediaFile> = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(MediaFile::from_path(path.clone()));
        } else if path.is_dir() {
            files.extend(expand_dir(path, settings)?);
        } else {
            return Err(SelectionError::Missing(path.clone()));
        }
    }

    debug!(count = files.len(), "selection built");
    Ok(files)
}

fn expand_dir(dir: &Path, settings: &LibrarySettings) -> Result<Vec<MediaFile>, SelectionError> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut found: Vec<PathBuf> = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(SelectionError::Walk {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_media_file(path, settings)
        {
            found.push(path.to_path_buf());
        }
    }

    found.sort();
    Ok(found.into_iter().map(MediaFile::from_path).collect())
}

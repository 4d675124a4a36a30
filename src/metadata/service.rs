use lofty::file::TaggedFileExt;
use lofty::picture::PictureType;
use lofty::tag::Accessor;

use crate::error::TagError;
use crate::library::MediaFile;

/// Embedded picture as raw bytes plus its declared format (a MIME type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub format: String,
}

/// Whatever tags the service found. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub picture: Option<Picture>,
}

/// A tag reader. Treated as a black box that either yields tags or an error
/// descriptor.
pub trait MetadataService: Send + Sync {
    fn read(&self, file: &MediaFile) -> Result<RawTags, TagError>;
}

/// Tag reader backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyReader;

fn non_blank(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl MetadataService for LoftyReader {
    fn read(&self, file: &MediaFile) -> Result<RawTags, TagError> {
        let tagged = lofty::read_from_path(&file.path)
            .map_err(|e| TagError::new("tagFormat", e.to_string()))?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(RawTags::default());
        };

        let pictures = tag.pictures();
        let picture = pictures
            .iter()
            .find(|p| p.pic_type() == PictureType::CoverFront)
            .or_else(|| pictures.first())
            .map(|p| Picture {
                data: p.data().to_vec(),
                format: p
                    .mime_type()
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            });

        Ok(RawTags {
            title: non_blank(tag.title()),
            artist: non_blank(tag.artist()),
            album: non_blank(tag.album()),
            picture,
        })
    }
}

//! Tag writing for cached tracks, backed by `lofty`.

use std::fs::File;
use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{Picture, PictureType};
use lofty::read_from_path;
use lofty::tag::{ItemKey, Tag};
use log::debug;

use crate::sanitize::to_safe_print;
use crate::track_info::TrackInfo;

/// Tag-set keys and the tag items they are written to.
const TAG_ITEM_KEYS: [(&str, ItemKey); 8] = [
    ("artist", ItemKey::TrackArtist),
    ("albumartist", ItemKey::AlbumArtist),
    ("title", ItemKey::TrackTitle),
    ("album", ItemKey::AlbumTitle),
    ("genre", ItemKey::Genre),
    ("tracknumber", ItemKey::TrackNumber),
    ("discnumber", ItemKey::DiscNumber),
    ("date", ItemKey::RecordingDate),
];

/// Writes a track's tag set (and optional cover) into an audio file.
pub trait TagWriter {
    fn write_tags(&self, path: &Path, info: &TrackInfo, art: Option<&Path>) -> Result<(), String>;
}

/// Writes tags with `lofty`, keeping existing tag items not in the tag set.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagWriter;

fn read_cover_picture(art: &Path) -> Result<Picture, String> {
    let mut file = File::open(art)
        .map_err(|error| format!("Failed to open cover art {}: {error}", art.display()))?;
    let mut picture = Picture::from_reader(&mut file)
        .map_err(|error| format!("Failed to read cover art {}: {error}", art.display()))?;
    picture.set_pic_type(PictureType::CoverFront);
    Ok(picture)
}

impl TagWriter for LoftyTagWriter {
    fn write_tags(&self, path: &Path, info: &TrackInfo, art: Option<&Path>) -> Result<(), String> {
        let mut tagged_file =
            read_from_path(path).map_err(|error| format!("Failed to read tags: {error}"))?;
        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let tag = tagged_file
            .tag_mut(tag_type)
            .ok_or_else(|| format!("No writable tag available for {:?}", tag_type))?;

        let id3_meta = info.id3_meta();
        for (meta_key, item_key) in TAG_ITEM_KEYS {
            if let Some(value) = id3_meta.get(meta_key) {
                tag.insert_text(item_key, value.clone());
            }
        }

        if let Some(art) = art {
            let picture = read_cover_picture(art)?;
            tag.remove_picture_type(PictureType::CoverFront);
            tag.push_picture(picture);
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|error| format!("Failed to write tags: {error}"))?;
        debug!(
            "wrote {} tag item(s) to {}",
            id3_meta.len(),
            to_safe_print(path)
        );
        Ok(())
    }
}

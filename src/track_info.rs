//! Track metadata model and the filing/tag attributes derived from it.

use std::collections::BTreeMap;

use serde_json::Value;

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Cover image reference attached to remote track metadata.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ArtRef {
    pub url: String,
}

/// Remote metadata for one track. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album_artist: Option<String>,
    #[serde(default)]
    pub composer: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub track_number: Option<i64>,
    #[serde(default)]
    pub disc_number: Option<i64>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub album_art_ref: Vec<ArtRef>,
    /// Remaining payload fields, kept for failure reports.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TrackMetadata {
    /// First referenced cover image url, if any.
    pub fn album_art_url(&self) -> Option<&str> {
        self.album_art_ref
            .first()
            .map(|art| art.url.trim())
            .filter(|url| !url.is_empty())
    }
}

/// Strings used to file a track on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingInfo {
    pub artist: String,
    pub album: String,
    pub title: String,
}

/// Canonical tag keys mapped to stringified values.
pub type Id3Meta = BTreeMap<&'static str, String>;

/// A track id with its metadata and the attributes derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    track_id: String,
    metadata: TrackMetadata,
    filing: FilingInfo,
    id3_meta: Id3Meta,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn filing_artist(metadata: &TrackMetadata) -> String {
    [
        &metadata.album_artist,
        &metadata.artist,
        &metadata.composer,
    ]
    .into_iter()
    .find_map(non_empty)
    .unwrap_or(UNKNOWN_ARTIST)
    .to_string()
}

fn filing_album(metadata: &TrackMetadata) -> String {
    let album = non_empty(&metadata.album).unwrap_or(UNKNOWN_ALBUM);
    match metadata.year {
        Some(year) if year != 0 => format!("{album} [{year}]"),
        _ => album.to_string(),
    }
}

fn filing_title(track_id: &str, metadata: &TrackMetadata) -> String {
    let title = non_empty(&metadata.title).unwrap_or(track_id);
    let Some(track_number) = metadata.track_number else {
        return title.to_string();
    };
    let numbered = format!("{track_number:02} - {title}");
    match metadata.disc_number {
        Some(disc_number) => format!("{disc_number:02}:{numbered}"),
        None => numbered,
    }
}

fn id3_meta(metadata: &TrackMetadata) -> Id3Meta {
    let text_fields = [
        ("artist", &metadata.artist),
        ("albumartist", &metadata.album_artist),
        ("title", &metadata.title),
        ("album", &metadata.album),
        ("genre", &metadata.genre),
    ];
    let number_fields = [
        ("tracknumber", metadata.track_number),
        ("discnumber", metadata.disc_number),
        ("date", metadata.year),
    ];

    let mut meta = Id3Meta::new();
    for (key, value) in text_fields {
        if let Some(value) = value {
            meta.insert(key, value.clone());
        }
    }
    for (key, value) in number_fields {
        if let Some(value) = value {
            meta.insert(key, value.to_string());
        }
    }
    meta
}

impl TrackInfo {
    /// Builds the model; absent metadata behaves like an empty record.
    pub fn new(track_id: impl Into<String>, metadata: Option<&TrackMetadata>) -> Self {
        let track_id = track_id.into();
        let metadata = metadata.cloned().unwrap_or_default();
        let filing = FilingInfo {
            artist: filing_artist(&metadata),
            album: filing_album(&metadata),
            title: filing_title(&track_id, &metadata),
        };
        let id3_meta = id3_meta(&metadata);
        Self {
            track_id,
            metadata,
            filing,
            id3_meta,
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    pub fn filing(&self) -> &FilingInfo {
        &self.filing
    }

    pub fn filing_artist(&self) -> &str {
        &self.filing.artist
    }

    pub fn filing_album(&self) -> &str {
        &self.filing.album
    }

    pub fn filing_title(&self) -> &str {
        &self.filing.title
    }

    pub fn id3_meta(&self) -> &Id3Meta {
        &self.id3_meta
    }
}

//! Destination paths for cached tracks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::sanitize::to_safe_filename;
use crate::track_info::FilingInfo;

pub const CACHED_TRACK_EXTENSION: &str = "mp3";

/// Directory layout used below the cache root.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CacheHierarchy {
    /// `{root}/{artist}/{album}/{title}.mp3`
    #[default]
    #[value(name = "artist_album")]
    ArtistAlbum,
    /// `{root}/{title}.mp3`
    Flat,
}

impl CacheHierarchy {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheHierarchy::ArtistAlbum => "artist_album",
            CacheHierarchy::Flat => "flat",
        }
    }
}

/// Expands a leading `~` to the current user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };
    if rest.as_os_str().is_empty() {
        home
    } else {
        home.join(rest)
    }
}

/// Computes the destination path without touching the filesystem.
pub fn cache_path_for(cache_root: &Path, hierarchy: CacheHierarchy, filing: &FilingInfo) -> PathBuf {
    let mut dir = expand_home(cache_root);
    if hierarchy == CacheHierarchy::ArtistAlbum {
        dir.push(to_safe_filename(filing.artist.as_str()));
        dir.push(to_safe_filename(filing.album.as_str()));
    }
    dir.join(format!(
        "{}.{CACHED_TRACK_EXTENSION}",
        to_safe_filename(filing.title.as_str())
    ))
}

/// Computes the destination path and creates its parent directory.
pub fn build_cache_path(
    cache_root: &Path,
    hierarchy: CacheHierarchy,
    filing: &FilingInfo,
) -> io::Result<PathBuf> {
    let path = cache_path_for(cache_root, hierarchy, filing);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{build_cache_path, cache_path_for, expand_home, CacheHierarchy};
    use crate::track_info::tests::{southpaw_metadata, SOUTHPAW_TRACK_ID};
    use crate::track_info::TrackInfo;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("playlist_cache_{name}_{nonce}"))
    }

    #[test]
    fn test_artist_album_layout() {
        let metadata = southpaw_metadata();
        let info = TrackInfo::new(SOUTHPAW_TRACK_ID, Some(&metadata));
        let path = cache_path_for(
            Path::new("/tmp/x"),
            CacheHierarchy::ArtistAlbum,
            info.filing(),
        );
        assert_eq!(
            path,
            PathBuf::from("/tmp/x/Moonbase Commander/Southpaw EP 2015/0101  Southpaw.mp3")
        );
    }

    #[test]
    fn test_flat_layout() {
        let metadata = southpaw_metadata();
        let info = TrackInfo::new(SOUTHPAW_TRACK_ID, Some(&metadata));
        let path = cache_path_for(Path::new("/tmp/x"), CacheHierarchy::Flat, info.filing());
        assert_eq!(path, PathBuf::from("/tmp/x/0101  Southpaw.mp3"));
    }

    #[test]
    fn test_build_cache_path_creates_parent_only() {
        let root = unique_temp_dir("build_path");
        let metadata = southpaw_metadata();
        let info = TrackInfo::new(SOUTHPAW_TRACK_ID, Some(&metadata));

        let first = build_cache_path(&root, CacheHierarchy::ArtistAlbum, info.filing())
            .expect("path should build");
        let second = build_cache_path(&root, CacheHierarchy::ArtistAlbum, info.filing())
            .expect("second build should be idempotent");

        assert_eq!(first, second);
        assert_eq!(
            first,
            root.join("Moonbase Commander")
                .join("Southpaw EP 2015")
                .join("0101  Southpaw.mp3")
        );
        assert!(first.parent().expect("path should have parent").is_dir());
        assert!(!first.exists());

        fs::remove_dir_all(root).expect("temp dir should be removable");
    }

    #[test]
    fn test_expand_home_only_rewrites_leading_tilde() {
        let home = dirs::home_dir().expect("test environment should have a home dir");
        assert_eq!(expand_home(Path::new("~/music")), home.join("music"));
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("/srv/~music")), PathBuf::from("/srv/~music"));
    }

    #[test]
    fn test_hierarchy_deserializes_from_snake_case() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            hierarchy: CacheHierarchy,
        }
        let parsed: Wrapper = toml::from_str("hierarchy = \"flat\"").expect("should parse");
        assert_eq!(parsed.hierarchy, CacheHierarchy::Flat);
        assert_eq!(CacheHierarchy::ArtistAlbum.as_str(), "artist_album");
    }
}

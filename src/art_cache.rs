//! Album art downloads shared by all tracks of one batch.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cache_path::expand_home;
use crate::errors::TrackError;
use crate::sanitize::{to_safe_filename, to_safe_print};
use crate::track_info::TrackInfo;
use crate::transport::{clear_staging, commit_staged, staging_path_for, Transport};

const ART_EXTENSION: &str = "jpg";

/// Album id to local art file, filled at most once per album.
pub struct AlbumArtCache {
    root: PathBuf,
    entries: HashMap<String, PathBuf>,
}

impl AlbumArtCache {
    pub fn new(root: &Path) -> Self {
        Self {
            root: expand_home(root),
            entries: HashMap::new(),
        }
    }

    /// Local file name for an album's art.
    pub fn art_path_for(&self, album_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{ART_EXTENSION}", to_safe_filename(album_id)))
    }

    /// Returns the art file for the track's album, downloading it on first use.
    /// Tracks without an album id or art reference have no art.
    pub fn fetch(
        &mut self,
        info: &TrackInfo,
        transport: &dyn Transport,
    ) -> Result<Option<PathBuf>, TrackError> {
        let metadata = info.metadata();
        let (Some(album_id), Some(url)) = (metadata.album_id.as_deref(), metadata.album_art_url())
        else {
            debug!("no album art for track {}", to_safe_print(info.track_id()));
            return Ok(None);
        };

        if let Some(path) = self.entries.get(album_id) {
            return Ok(Some(path.clone()));
        }

        let art_path = self.art_path_for(album_id);
        if !art_path.exists() {
            fs::create_dir_all(&self.root).map_err(|source| TrackError::Io {
                path: self.root.clone(),
                source,
            })?;
            let staging_path = staging_path_for(&art_path);
            clear_staging(&staging_path).map_err(|source| TrackError::Io {
                path: staging_path.clone(),
                source,
            })?;
            info!(
                "downloading album art for {} to {}",
                to_safe_print(album_id),
                to_safe_print(art_path.as_path())
            );
            if let Err(err) = transport.fetch_to_file(url, &staging_path) {
                let _ = clear_staging(&staging_path);
                return Err(TrackError::Transport(err));
            }
            commit_staged(&staging_path, &art_path).map_err(|source| TrackError::Io {
                path: art_path.clone(),
                source,
            })?;
        }

        self.entries.insert(album_id.to_string(), art_path.clone());
        Ok(Some(art_path))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::AlbumArtCache;
    use crate::track_info::tests::{southpaw_metadata, SOUTHPAW_TRACK_ID};
    use crate::track_info::{TrackInfo, TrackMetadata};
    use crate::transport::Transport;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("playlist_cache_{name}_{nonce}"))
    }

    struct HalfWrittenTransport;

    impl Transport for HalfWrittenTransport {
        fn fetch_to_file(&self, _url: &str, path: &Path) -> Result<u64, String> {
            fs::write(path, b"\xff\xd8").map_err(|err| err.to_string())?;
            Err("connection reset".to_string())
        }
    }

    #[derive(Default)]
    struct CountingTransport {
        urls: RefCell<Vec<String>>,
    }

    impl Transport for CountingTransport {
        fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64, String> {
            self.urls.borrow_mut().push(url.to_string());
            fs::write(path, b"\xff\xd8\xff\xe0art").map_err(|err| err.to_string())?;
            Ok(7)
        }
    }

    #[test]
    fn test_art_is_named_by_album_id() {
        let root = unique_temp_dir("art_named");
        let mut cache = AlbumArtCache::new(&root);
        let transport = CountingTransport::default();
        let metadata = southpaw_metadata();
        let info = TrackInfo::new(SOUTHPAW_TRACK_ID, Some(&metadata));

        let path = cache
            .fetch(&info, &transport)
            .expect("art should download")
            .expect("track has art");

        assert_eq!(path, root.join("B52ucw7kgew7axvye5vldk6rxty.jpg"));
        assert!(path.exists());
        fs::remove_dir_all(root).expect("temp dir should be removable");
    }

    #[test]
    fn test_art_downloads_once_per_album() {
        let root = unique_temp_dir("art_once");
        let mut cache = AlbumArtCache::new(&root);
        let transport = CountingTransport::default();
        let metadata = southpaw_metadata();
        let first = TrackInfo::new("t1", Some(&metadata));
        let second = TrackInfo::new("t2", Some(&metadata));

        let first_path = cache.fetch(&first, &transport).expect("first fetch");
        let second_path = cache.fetch(&second, &transport).expect("second fetch");

        assert_eq!(first_path, second_path);
        assert_eq!(transport.urls.borrow().len(), 1);
        fs::remove_dir_all(root).expect("temp dir should be removable");
    }

    #[test]
    fn test_track_without_album_id_has_no_art() {
        let root = unique_temp_dir("art_none");
        let mut cache = AlbumArtCache::new(&root);
        let transport = CountingTransport::default();
        let metadata = TrackMetadata {
            album_id: None,
            ..southpaw_metadata()
        };
        let info = TrackInfo::new("t1", Some(&metadata));

        assert_eq!(cache.fetch(&info, &transport).expect("no error"), None);
        assert!(transport.urls.borrow().is_empty());
        assert!(!root.exists());
    }

    #[test]
    fn test_failed_download_leaves_no_staging_file() {
        let root = unique_temp_dir("art_failed");
        let mut cache = AlbumArtCache::new(&root);
        let metadata = southpaw_metadata();
        let info = TrackInfo::new(SOUTHPAW_TRACK_ID, Some(&metadata));

        assert!(cache.fetch(&info, &HalfWrittenTransport).is_err());

        let leftovers = fs::read_dir(&root)
            .expect("art root should exist")
            .count();
        assert_eq!(leftovers, 0);
        fs::remove_dir_all(root).expect("temp dir should be removable");
    }
}

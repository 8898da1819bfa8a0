//! Batch caching of one remote playlist into the local cache directory.
//!
//! Tracks are processed strictly one after another. A failing track is
//! recorded and skipped; only a rejected-client signal from the service
//! aborts the batch.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::art_cache::AlbumArtCache;
use crate::backends::{PlaylistEntry, PlaylistService, RemotePlaylist};
use crate::cache_path::{build_cache_path, CacheHierarchy};
use crate::errors::{CacheError, ServiceError, TrackError};
use crate::library::{find_or_create_playlist, find_playlist};
use crate::sanitize::{to_safe_print, Printable};
use crate::tagging::TagWriter;
use crate::track_info::{TrackInfo, TrackMetadata};
use crate::transport::{clear_staging, commit_staged, staging_path_for, Transport};

/// Settings for one caching run.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Name pattern of the playlist to cache.
    pub source_pattern: String,
    /// Playlist that cached tracks are added to, created when missing.
    pub destination_playlist: Option<String>,
    /// Remove all entries from the source playlist after a batch without failures.
    pub clear_source: bool,
    pub cache_root: PathBuf,
    pub hierarchy: CacheHierarchy,
    pub art_root: PathBuf,
    /// Pause between consecutive tracks.
    pub sleep_time: Duration,
}

/// A track that could not be cached.
#[derive(Debug, Clone)]
pub struct FailedTrack {
    pub track_id: String,
    pub metadata: Option<TrackMetadata>,
    pub error: String,
}

/// Outcome of a completed batch.
#[derive(Debug, Clone, Default)]
pub struct CacheReport {
    pub playlist_name: String,
    pub cached: Vec<PathBuf>,
    pub failed: Vec<FailedTrack>,
    pub source_cleared: bool,
}

fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_string()
}

/// Logs in to the service. Any failure is a bad login.
pub fn login(service: &dyn PlaylistService) -> Result<(), CacheError> {
    service
        .authenticate()
        .map_err(|err| CacheError::BadLogin(err.to_string()))
}

pub struct PlaylistCacher<'a> {
    service: &'a dyn PlaylistService,
    transport: &'a dyn Transport,
    tag_writer: &'a dyn TagWriter,
    options: CacheOptions,
    art_cache: AlbumArtCache,
}

impl<'a> PlaylistCacher<'a> {
    pub fn new(
        service: &'a dyn PlaylistService,
        transport: &'a dyn Transport,
        tag_writer: &'a dyn TagWriter,
        options: CacheOptions,
    ) -> Self {
        let art_cache = AlbumArtCache::new(&options.art_root);
        Self {
            service,
            transport,
            tag_writer,
            options,
            art_cache,
        }
    }

    /// Caches every track of the source playlist in playlist order.
    /// Logs in, then caches the source playlist. Nothing is listed or
    /// downloaded when the login fails.
    pub fn run(&mut self) -> Result<CacheReport, CacheError> {
        login(self.service)?;
        info!("logged in");
        self.cache_playlist()
    }

    pub fn cache_playlist(&mut self) -> Result<CacheReport, CacheError> {
        let playlists = self.service.list_playlists()?;
        let source = find_playlist(&playlists, &self.options.source_pattern)?.clone();
        let destination = match self.options.destination_playlist.as_deref() {
            Some(name) => Some(find_or_create_playlist(self.service, &playlists, name)?),
            None => None,
        };

        let mut report = CacheReport {
            playlist_name: source.name.clone(),
            ..CacheReport::default()
        };

        let track_count = source.tracks.len();
        for (index, entry) in source.tracks.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.cache_track(entry, destination.as_ref())
            }))
            .unwrap_or_else(|payload| {
                Err(TrackError::Panicked(panic_payload_to_string(payload.as_ref())))
            });
            match outcome {
                Ok(path) => {
                    info!("successfully cached to {}", to_safe_print(path.as_path()));
                    report.cached.push(path);
                }
                Err(TrackError::Service(ServiceError::CallFailure { code, message })) => {
                    warn!(
                        "service rejected client while caching {} (code {})",
                        to_safe_print(&entry.track_id),
                        code
                    );
                    return Err(CacheError::StaleClientRegistration {
                        track_id: entry.track_id.clone(),
                        message,
                    });
                }
                Err(err) => {
                    warn!(
                        "failed to cache track {}: {}",
                        to_safe_print(&entry.track_id),
                        to_safe_print(Printable::display(&err))
                    );
                    report.failed.push(FailedTrack {
                        track_id: entry.track_id.clone(),
                        metadata: entry.track.clone(),
                        error: err.to_string(),
                    });
                }
            }

            if index + 1 < track_count && !self.options.sleep_time.is_zero() {
                info!("waiting {:?} before the next track", self.options.sleep_time);
                thread::sleep(self.options.sleep_time);
            }
        }

        if !report.failed.is_empty() {
            warn!("{} track(s) failed", report.failed.len());
            for failed in &report.failed {
                warn!(
                    "-> {} {} ({})",
                    to_safe_print(&failed.track_id),
                    to_safe_print(format!("{:?}", failed.metadata)),
                    to_safe_print(&failed.error)
                );
            }
        } else if self.options.clear_source {
            self.clear_source(&source)?;
            report.source_cleared = true;
        }

        Ok(report)
    }

    fn clear_source(&self, source: &RemotePlaylist) -> Result<(), CacheError> {
        let entry_ids: Vec<String> = source
            .tracks
            .iter()
            .map(|entry| entry.entry_id.clone())
            .collect();
        info!(
            "removing {} entr(ies) from {}",
            entry_ids.len(),
            to_safe_print(&source.name)
        );
        self.service.remove_from_playlist(&source.id, &entry_ids)?;
        Ok(())
    }

    fn cache_track(
        &mut self,
        entry: &PlaylistEntry,
        destination: Option<&RemotePlaylist>,
    ) -> Result<PathBuf, TrackError> {
        let info = TrackInfo::new(entry.track_id.as_str(), entry.track.as_ref());
        let target = build_cache_path(&self.options.cache_root, self.options.hierarchy, info.filing())
            .map_err(|source| TrackError::Io {
                path: self.options.cache_root.clone(),
                source,
            })?;
        info!(
            "caching song: id {}; artist {}; album {}; title {}; path {}",
            to_safe_print(info.track_id()),
            to_safe_print(info.filing_artist()),
            to_safe_print(info.filing_album()),
            to_safe_print(info.filing_title()),
            to_safe_print(target.as_path())
        );

        let stream_url = self.service.get_stream_url(info.track_id())?;

        let staging = staging_path_for(&target);
        clear_staging(&staging).map_err(|source| TrackError::Io {
            path: staging.clone(),
            source,
        })?;
        let staged = panic::catch_unwind(AssertUnwindSafe(|| {
            self.stage_track(&info, &stream_url, &staging)
        }))
        .unwrap_or_else(|payload| {
            Err(TrackError::Panicked(panic_payload_to_string(payload.as_ref())))
        });
        if staged.is_err() {
            let _ = clear_staging(&staging);
        }
        staged?;

        commit_staged(&staging, &target).map_err(|source| TrackError::Io {
            path: target.clone(),
            source,
        })?;

        if let Some(destination) = destination {
            self.service
                .add_to_playlist(&destination.id, &[entry.track_id.clone()])?;
        }
        Ok(target)
    }

    fn stage_track(
        &mut self,
        info: &TrackInfo,
        stream_url: &str,
        staging: &Path,
    ) -> Result<(), TrackError> {
        self.transport
            .fetch_to_file(stream_url, staging)
            .map_err(TrackError::Transport)?;
        let art = self.art_cache.fetch(info, self.transport)?;
        self.tag_writer
            .write_tags(staging, info, art.as_deref())
            .map_err(TrackError::Tagging)
    }
}

//! Remote playlist service abstractions and concrete implementations.

pub mod opensubsonic;

use crate::errors::ServiceError;
use crate::track_info::TrackMetadata;

/// One entry of a remote playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    /// Service-side handle of this entry, used for removal.
    pub entry_id: String,
    pub track_id: String,
    pub track: Option<TrackMetadata>,
}

/// Remote playlist payload returned by services.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
    pub tracks: Vec<PlaylistEntry>,
}

/// Connection details for a remote service account.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Registered client identifier presented with every call.
    pub client_id: String,
}

/// Capabilities consumed from a remote playlist service.
pub trait PlaylistService {
    fn authenticate(&self) -> Result<(), ServiceError>;
    /// All playlists of the account, with their entries.
    fn list_playlists(&self) -> Result<Vec<RemotePlaylist>, ServiceError>;
    fn get_stream_url(&self, track_id: &str) -> Result<String, ServiceError>;
    /// Creates an empty playlist and returns its id.
    fn create_playlist(&self, name: &str) -> Result<String, ServiceError>;
    fn add_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ServiceError>;
    fn remove_from_playlist(
        &self,
        playlist_id: &str,
        entry_ids: &[String],
    ) -> Result<(), ServiceError>;
}

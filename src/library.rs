//! Playlist lookup over a snapshot of the account's playlists.

use log::{debug, info};
use regex::RegexBuilder;

use crate::backends::{PlaylistService, RemotePlaylist};
use crate::errors::{CacheError, PlaylistLookupError};
use crate::sanitize::to_safe_print;

/// Returns the first playlist whose name matches `pattern` from its start,
/// ignoring case.
pub fn find_playlist<'a>(
    playlists: &'a [RemotePlaylist],
    pattern: &str,
) -> Result<&'a RemotePlaylist, PlaylistLookupError> {
    let matcher = RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(true)
        .build()
        .map_err(|source| PlaylistLookupError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

    for playlist in playlists {
        debug!(
            "found playlist {} {}",
            to_safe_print(&playlist.name),
            to_safe_print(&playlist.id)
        );
        if matcher.is_match(&playlist.name) {
            info!(
                "found target playlist {} ({} tracks)",
                to_safe_print(&playlist.name),
                playlist.tracks.len()
            );
            return Ok(playlist);
        }
    }

    Err(PlaylistLookupError::NotFound(pattern.to_string()))
}

/// Returns the matching playlist, creating an empty one named `name` when
/// nothing matches.
pub fn find_or_create_playlist(
    service: &dyn PlaylistService,
    playlists: &[RemotePlaylist],
    name: &str,
) -> Result<RemotePlaylist, CacheError> {
    match find_playlist(playlists, name) {
        Ok(playlist) => Ok(playlist.clone()),
        Err(PlaylistLookupError::NotFound(_)) => {
            info!("creating playlist {}", to_safe_print(name));
            let id = service.create_playlist(name)?;
            Ok(RemotePlaylist {
                id,
                name: name.to_string(),
                tracks: Vec::new(),
            })
        }
        Err(err) => Err(err.into()),
    }
}

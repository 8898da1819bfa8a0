//! OpenSubsonic playlist service implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::backends::{PlaylistEntry, PlaylistService, RemotePlaylist, ServiceAuth};
use crate::errors::ServiceError;
use crate::sanitize::to_safe_print;
use crate::track_info::{ArtRef, TrackMetadata};

const API_VERSION: &str = "1.16.1";
const STREAM_FORMAT: &str = "mp3";

/// Error codes meaning the server will not serve this client at all:
/// incompatible client/server versions, bad credentials, token auth refused.
const REJECTED_CLIENT_CODES: [i64; 4] = [20, 30, 40, 41];

/// Song payload keys mapped onto [`TrackMetadata`] fields.
const MAPPED_SONG_KEYS: [&str; 13] = [
    "id",
    "title",
    "artist",
    "displayAlbumArtist",
    "displayComposer",
    "album",
    "genre",
    "track",
    "discNumber",
    "year",
    "albumId",
    "coverArt",
    "isDir",
];

/// OpenSubsonic service backed by `ureq`.
pub struct OpenSubsonicService {
    http_client: ureq::Agent,
    auth: ServiceAuth,
}

impl OpenSubsonicService {
    pub fn new(auth: ServiceAuth) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self { http_client, auth }
    }

    fn make_salt() -> String {
        let mut bytes = [0u8; 8];
        let _ = getrandom::fill(&mut bytes);
        bytes.iter().map(|value| format!("{value:02x}")).collect()
    }

    fn auth_params(auth: &ServiceAuth) -> Vec<(String, String)> {
        let salt = Self::make_salt();
        let token = format!("{:x}", md5::compute(format!("{}{}", auth.password, salt)));
        vec![
            ("u".to_string(), auth.username.clone()),
            ("t".to_string(), token),
            ("s".to_string(), salt),
            ("f".to_string(), "json".to_string()),
            ("v".to_string(), API_VERSION.to_string()),
            ("c".to_string(), auth.client_id.clone()),
        ]
    }

    fn endpoint_base(endpoint: &str) -> String {
        endpoint.trim().trim_end_matches('/').to_string()
    }

    fn api_url(auth: &ServiceAuth, method: &str, params: &[(String, String)]) -> String {
        let mut query_parts: Vec<String> = Self::auth_params(auth)
            .into_iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(&value)))
            .collect();
        query_parts.extend(
            params
                .iter()
                .map(|(key, value)| format!("{key}={}", urlencoding::encode(value))),
        );
        format!(
            "{}/rest/{}.view?{}",
            Self::endpoint_base(&auth.endpoint),
            method,
            query_parts.join("&")
        )
    }

    fn check_status(method: &str, parsed: &Value) -> Result<(), ServiceError> {
        let response = parsed.get("subsonic-response");
        let status = response
            .and_then(|value| value.get("status"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if status == "ok" {
            return Ok(());
        }
        let error = response.and_then(|value| value.get("error"));
        let code = error
            .and_then(|value| value.get("code"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let message = error
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("OpenSubsonic returned an error")
            .to_string();
        if REJECTED_CLIENT_CODES.contains(&code) {
            return Err(ServiceError::CallFailure { code, message });
        }
        Err(ServiceError::Request(format!(
            "OpenSubsonic {method} failed (code {code}): {message}"
        )))
    }

    fn request_json(&self, method: &str, params: &[(String, String)]) -> Result<Value, ServiceError> {
        let url = Self::api_url(&self.auth, method, params);
        let response = self.http_client.get(&url).call().map_err(|err| {
            ServiceError::Request(format!("OpenSubsonic request failed ({method}): {err}"))
        })?;
        let parsed: Value = response.into_json().map_err(|err| {
            ServiceError::Request(format!("OpenSubsonic response parse failed ({method}): {err}"))
        })?;
        Self::check_status(method, &parsed)?;
        Ok(parsed)
    }

    fn array_or_single(value: Option<&Value>) -> Vec<&Value> {
        match value {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(item @ Value::Object(_)) => vec![item],
            _ => Vec::new(),
        }
    }

    fn string_field(song: &Value, key: &str) -> Option<String> {
        song.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
    }

    fn number_field(song: &Value, key: &str) -> Option<i64> {
        let value = song.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
    }

    fn parse_track(auth: &ServiceAuth, song: &Value) -> TrackMetadata {
        let album_art_ref = Self::string_field(song, "coverArt")
            .filter(|cover_id| !cover_id.trim().is_empty())
            .map(|cover_id| {
                vec![ArtRef {
                    url: Self::api_url(auth, "getCoverArt", &[("id".to_string(), cover_id)]),
                }]
            })
            .unwrap_or_default();
        let extra: BTreeMap<String, Value> = song
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter(|(key, _)| !MAPPED_SONG_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        TrackMetadata {
            artist: Self::string_field(song, "artist"),
            album_artist: Self::string_field(song, "displayAlbumArtist"),
            composer: Self::string_field(song, "displayComposer"),
            album: Self::string_field(song, "album"),
            title: Self::string_field(song, "title"),
            genre: Self::string_field(song, "genre"),
            track_number: Self::number_field(song, "track"),
            disc_number: Self::number_field(song, "discNumber"),
            year: Self::number_field(song, "year"),
            album_id: Self::string_field(song, "albumId"),
            album_art_ref,
            extra,
        }
    }

    /// Entry ids are positions in the playlist, as `updatePlaylist` removes by index.
    fn parse_entry(auth: &ServiceAuth, index: usize, song: &Value) -> Option<PlaylistEntry> {
        let track_id = song.get("id")?.as_str()?.to_string();
        Some(PlaylistEntry {
            entry_id: index.to_string(),
            track_id,
            track: Some(Self::parse_track(auth, song)),
        })
    }

    fn fetch_playlist_entries(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, ServiceError> {
        let payload =
            self.request_json("getPlaylist", &[("id".to_string(), playlist_id.to_string())])?;
        let entries = Self::array_or_single(
            payload
                .get("subsonic-response")
                .and_then(|value| value.get("playlist"))
                .and_then(|value| value.get("entry")),
        );
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, song)| Self::parse_entry(&self.auth, index, song))
            .collect())
    }
}

impl PlaylistService for OpenSubsonicService {
    fn authenticate(&self) -> Result<(), ServiceError> {
        let _ = self.request_json("ping", &[])?;
        Ok(())
    }

    fn list_playlists(&self) -> Result<Vec<RemotePlaylist>, ServiceError> {
        let payload = self.request_json("getPlaylists", &[])?;
        let playlists = Self::array_or_single(
            payload
                .get("subsonic-response")
                .and_then(|value| value.get("playlists"))
                .and_then(|value| value.get("playlist")),
        );

        let mut result = Vec::new();
        for playlist in playlists {
            let Some(id) = playlist
                .get("id")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
            else {
                continue;
            };
            let name = playlist
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            debug!("OpenSubsonic: loading playlist {} {}", to_safe_print(&name), to_safe_print(&id));
            let tracks = self.fetch_playlist_entries(&id)?;
            result.push(RemotePlaylist { id, name, tracks });
        }
        Ok(result)
    }

    fn get_stream_url(&self, track_id: &str) -> Result<String, ServiceError> {
        let trimmed_track_id = track_id.trim();
        if trimmed_track_id.is_empty() {
            return Err(ServiceError::Request("track id cannot be empty".to_string()));
        }
        let params = [("id".to_string(), trimmed_track_id.to_string())];
        let _ = self.request_json("getSong", &params)?;
        Ok(Self::api_url(
            &self.auth,
            "stream",
            &[
                ("id".to_string(), trimmed_track_id.to_string()),
                ("format".to_string(), STREAM_FORMAT.to_string()),
            ],
        ))
    }

    fn create_playlist(&self, name: &str) -> Result<String, ServiceError> {
        let trimmed_name = name.trim();
        if trimmed_name.is_empty() {
            return Err(ServiceError::Request("playlist name cannot be empty".to_string()));
        }
        let payload =
            self.request_json("createPlaylist", &[("name".to_string(), trimmed_name.to_string())])?;
        payload
            .get("subsonic-response")
            .and_then(|value| value.get("playlist"))
            .and_then(|value| value.get("id"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                ServiceError::Request(
                    "OpenSubsonic createPlaylist response missing playlist id".to_string(),
                )
            })
    }

    fn add_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ServiceError> {
        if track_ids.is_empty() {
            return Ok(());
        }
        let mut params = vec![("playlistId".to_string(), playlist_id.to_string())];
        for track_id in track_ids {
            params.push(("songIdToAdd".to_string(), track_id.clone()));
        }
        let _ = self.request_json("updatePlaylist", &params)?;
        Ok(())
    }

    fn remove_from_playlist(
        &self,
        playlist_id: &str,
        entry_ids: &[String],
    ) -> Result<(), ServiceError> {
        if entry_ids.is_empty() {
            return Ok(());
        }
        let mut params = vec![("playlistId".to_string(), playlist_id.to_string())];
        for entry_id in entry_ids {
            params.push(("songIndexToRemove".to_string(), entry_id.clone()));
        }
        let _ = self.request_json("updatePlaylist", &params)?;
        Ok(())
    }
}

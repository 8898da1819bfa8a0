//! Command-line surface. Flags override values from the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::cache_path::CacheHierarchy;
use crate::config::{Config, LogLevel};

/// Cache the tracks of a remote playlist as tagged mp3 files.
#[derive(Debug, Parser)]
#[command(name = "playlist-cache", version)]
pub struct Args {
    /// Config file [default: <user config dir>/playlist-cache/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base url of the remote service
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// Falls back to the OS keyring when not given
    #[arg(long, env = "PLAYLIST_CACHE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Store the given password in the OS keyring
    #[arg(long, requires = "password")]
    pub save_password: bool,

    /// Client identifier registered with the service
    #[arg(long)]
    pub client_id: Option<String>,

    /// Name pattern of the playlist to cache from
    #[arg(long)]
    pub playlist: Option<String>,

    /// Playlist to add cached tracks to; the source playlist is emptied
    /// after a batch without failures
    #[arg(long)]
    pub playlist_cached: Option<String>,

    /// Never remove entries from the source playlist
    #[arg(long)]
    pub keep_source: bool,

    /// Seconds to wait between tracks
    #[arg(long)]
    pub sleep_time: Option<f64>,

    /// Directory cached tracks are written below
    #[arg(long)]
    pub cache_location: Option<String>,

    #[arg(long, value_enum)]
    pub cache_hierarchy: Option<CacheHierarchy>,

    /// Directory album art is cached in
    #[arg(long)]
    pub art_location: Option<String>,

    /// Level above which log records are printed
    #[arg(long, value_enum)]
    pub debug_level: Option<LogLevel>,
}

impl Args {
    /// Layers command-line values over `config`.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(endpoint) = &self.endpoint {
            config.service.endpoint = endpoint.clone();
        }
        if let Some(username) = &self.username {
            config.service.username = username.clone();
        }
        if let Some(client_id) = &self.client_id {
            config.service.client_id = client_id.clone();
        }
        if let Some(playlist) = &self.playlist {
            config.playlists.source = playlist.clone();
        }
        if let Some(playlist_cached) = &self.playlist_cached {
            config.playlists.cached = playlist_cached.clone();
        }
        if self.keep_source {
            config.playlists.keep_source = true;
        }
        if let Some(sleep_time) = self.sleep_time {
            config.cache.sleep_time_secs = sleep_time;
        }
        if let Some(cache_location) = &self.cache_location {
            config.cache.location = cache_location.clone();
        }
        if let Some(cache_hierarchy) = self.cache_hierarchy {
            config.cache.hierarchy = cache_hierarchy;
        }
        if let Some(art_location) = &self.art_location {
            config.cache.art_location = art_location.clone();
        }
        if let Some(debug_level) = self.debug_level {
            config.logging.level = debug_level;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use crate::cache_path::CacheHierarchy;
    use crate::config::{Config, LogLevel};
    use clap::Parser;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "playlist-cache",
            "--playlist",
            "Road Trip",
            "--playlist-cached",
            "Cached",
            "--cache-hierarchy",
            "flat",
            "--sleep-time",
            "0.5",
            "--debug-level",
            "critical",
        ])
        .expect("arguments should parse");

        let mut config = Config::default();
        config.service.endpoint = "https://music.example.com".to_string();
        let merged = args.apply_to(config);

        assert_eq!(merged.playlists.source, "Road Trip");
        assert_eq!(merged.playlists.cached, "Cached");
        assert_eq!(merged.cache.hierarchy, CacheHierarchy::Flat);
        assert_eq!(merged.cache.sleep_time_secs, 0.5);
        assert_eq!(merged.logging.level, LogLevel::Critical);
        assert_eq!(merged.service.endpoint, "https://music.example.com");
    }

    #[test]
    fn test_hierarchy_flag_uses_snake_case_name() {
        let args = Args::try_parse_from(["playlist-cache", "--cache-hierarchy", "artist_album"])
            .expect("arguments should parse");
        assert_eq!(args.cache_hierarchy, Some(CacheHierarchy::ArtistAlbum));
    }

    #[test]
    fn test_save_password_requires_password() {
        std::env::remove_var("PLAYLIST_CACHE_PASSWORD");
        assert!(Args::try_parse_from(["playlist-cache", "--save-password"]).is_err());
    }
}

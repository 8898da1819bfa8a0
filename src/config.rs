//! Persistent configuration model, defaults and loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::cache::CacheOptions;
use crate::cache_path::CacheHierarchy;

const APP_DIR_NAME: &str = "playlist-cache";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Remote service account.
    pub service: ServiceConfig,
    #[serde(default)]
    /// Local cache layout and pacing.
    pub cache: CacheConfig,
    #[serde(default)]
    /// Source and destination playlists.
    pub playlists: PlaylistsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote service account. The password lives in the OS keyring, not here.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub username: String,
    /// Client identifier registered with the service.
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_location")]
    pub location: String,
    #[serde(default)]
    pub hierarchy: CacheHierarchy,
    /// Album art directory. Empty means the per-user cache directory.
    #[serde(default)]
    pub art_location: String,
    #[serde(default = "default_sleep_time_secs")]
    pub sleep_time_secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PlaylistsConfig {
    /// Name pattern of the playlist to cache.
    #[serde(default)]
    pub source: String,
    /// Playlist that receives cached tracks. Empty disables registration.
    #[serde(default)]
    pub cached: String,
    /// Keep source entries even after a fully successful batch.
    #[serde(default)]
    pub keep_source: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Level above which log records are printed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => log::LevelFilter::Error,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: String::new(),
            client_id: default_client_id(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            hierarchy: CacheHierarchy::ArtistAlbum,
            art_location: String::new(),
            sleep_time_secs: default_sleep_time_secs(),
        }
    }
}

fn default_client_id() -> String {
    APP_DIR_NAME.to_string()
}

fn default_cache_location() -> String {
    format!("~/{APP_DIR_NAME}")
}

fn default_sleep_time_secs() -> f64 {
    10.0
}

/// `<user config dir>/playlist-cache/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|path| path.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn default_art_location() -> Option<PathBuf> {
    dirs::cache_dir().map(|path| path.join(APP_DIR_NAME).join("album_art"))
}

/// Loads the config file, writing a default one first when it is missing.
pub fn load_or_create_config(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
        }
        let default_contents = toml::to_string(&Config::default())
            .map_err(|err| format!("failed to serialize default config: {err}"))?;
        fs::write(path, default_contents)
            .map_err(|err| format!("failed to write {}: {err}", path.display()))?;
    }

    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    toml::from_str::<Config>(&contents)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))
}

/// Normalizes values loaded from disk or the command line.
pub fn sanitize_config(config: Config) -> Config {
    let sleep_time_secs = if config.cache.sleep_time_secs.is_finite() {
        config.cache.sleep_time_secs.max(0.0)
    } else {
        warn!(
            "Ignoring invalid sleep time {}, using default",
            config.cache.sleep_time_secs
        );
        default_sleep_time_secs()
    };
    let client_id = config.service.client_id.trim();
    let location = config.cache.location.trim();

    Config {
        service: ServiceConfig {
            endpoint: config.service.endpoint.trim().to_string(),
            username: config.service.username.trim().to_string(),
            client_id: if client_id.is_empty() {
                default_client_id()
            } else {
                client_id.to_string()
            },
        },
        cache: CacheConfig {
            location: if location.is_empty() {
                default_cache_location()
            } else {
                location.to_string()
            },
            hierarchy: config.cache.hierarchy,
            art_location: config.cache.art_location.trim().to_string(),
            sleep_time_secs,
        },
        playlists: PlaylistsConfig {
            source: config.playlists.source.trim().to_string(),
            cached: config.playlists.cached.trim().to_string(),
            keep_source: config.playlists.keep_source,
        },
        logging: config.logging,
    }
}

impl Config {
    /// Checks the settings a run cannot start without.
    pub fn validate(&self) -> Result<(), String> {
        if self.service.endpoint.is_empty() {
            return Err("service endpoint is not configured".to_string());
        }
        if self.service.username.is_empty() {
            return Err("service username is not configured".to_string());
        }
        if self.playlists.source.is_empty() {
            return Err("source playlist is not configured".to_string());
        }
        self.sleep_time()?;
        Ok(())
    }

    /// Courtesy delay between tracks; fails for values no `Duration` can hold.
    pub fn sleep_time(&self) -> Result<Duration, String> {
        Duration::try_from_secs_f64(self.cache.sleep_time_secs).map_err(|err| {
            format!(
                "invalid sleep time {}s: {err}",
                self.cache.sleep_time_secs
            )
        })
    }

    pub fn art_location(&self) -> PathBuf {
        if !self.cache.art_location.is_empty() {
            return PathBuf::from(&self.cache.art_location);
        }
        default_art_location()
            .unwrap_or_else(|| PathBuf::from(&self.cache.location).join(".album_art"))
    }

    pub fn cache_options(&self) -> Result<CacheOptions, String> {
        let destination_playlist =
            Some(self.playlists.cached.clone()).filter(|name| !name.is_empty());
        Ok(CacheOptions {
            source_pattern: self.playlists.source.clone(),
            clear_source: destination_playlist.is_some() && !self.playlists.keep_source,
            destination_playlist,
            cache_root: PathBuf::from(&self.cache.location),
            hierarchy: self.cache.hierarchy,
            art_root: self.art_location(),
            sleep_time: self.sleep_time()?,
        })
    }
}

mod art_cache;
mod backends;
mod cache;
mod cache_path;
mod cli;
mod config;
mod errors;
mod integration_keyring;
mod library;
mod sanitize;
mod tagging;
mod track_info;
mod transport;

use std::path::PathBuf;
use std::process::ExitCode;

use backends::opensubsonic::OpenSubsonicService;
use backends::ServiceAuth;
use cache::{CacheReport, PlaylistCacher};
use clap::Parser;
use cli::Args;
use config::{default_config_path, load_or_create_config, sanitize_config, Config};
use errors::CacheError;
use log::{error, info, warn};
use sanitize::{to_safe_print, Printable};
use tagging::LoftyTagWriter;
use transport::HttpTransport;

fn resolve_config_path(args: &Args) -> Result<PathBuf, CacheError> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path().ok_or_else(|| {
            CacheError::Config("could not determine the user config directory".to_string())
        }),
    }
}

fn load_config(args: &Args) -> Result<Config, CacheError> {
    let config_path = resolve_config_path(args)?;
    let loaded = load_or_create_config(&config_path).map_err(CacheError::Config)?;
    let config = sanitize_config(args.apply_to(loaded));
    config.validate().map_err(CacheError::Config)?;
    Ok(config)
}

fn log_settings(config: &Config) {
    info!("endpoint: {}", to_safe_print(&config.service.endpoint));
    info!("username: {}", to_safe_print(&config.service.username));
    info!("client id: {}", to_safe_print(&config.service.client_id));
    info!("source playlist: {}", to_safe_print(&config.playlists.source));
    if config.playlists.cached.is_empty() {
        info!("cached playlist: <none>");
    } else {
        info!("cached playlist: {}", to_safe_print(&config.playlists.cached));
    }
    info!("keep source: {}", config.playlists.keep_source);
    info!("cache location: {}", to_safe_print(&config.cache.location));
    info!("cache hierarchy: {}", config.cache.hierarchy.as_str());
    info!(
        "album art location: {}",
        to_safe_print(config.art_location().as_path())
    );
    info!("sleep time: {}s", config.cache.sleep_time_secs);
}

fn resolve_password(args: &Args, config: &Config) -> Result<String, CacheError> {
    let endpoint = &config.service.endpoint;
    let username = &config.service.username;

    if let Some(password) = &args.password {
        if args.save_password {
            integration_keyring::set_service_password(endpoint, username, password)
                .map_err(CacheError::Config)?;
            info!("saved password to the OS keyring");
        }
        return Ok(password.clone());
    }

    match integration_keyring::get_service_password(endpoint, username) {
        Ok(Some(password)) => Ok(password),
        Ok(None) => Err(CacheError::BadLogin(
            "no password given and none stored in the OS keyring".to_string(),
        )),
        Err(err) => Err(CacheError::BadLogin(err)),
    }
}

fn run(args: &Args) -> Result<CacheReport, CacheError> {
    let config = load_config(args)?;
    log::set_max_level(config.logging.level.to_level_filter());
    log_settings(&config);

    let password = resolve_password(args, &config)?;
    let service = OpenSubsonicService::new(ServiceAuth {
        endpoint: config.service.endpoint.clone(),
        username: config.service.username.clone(),
        password,
        client_id: config.service.client_id.clone(),
    });
    let options = config.cache_options().map_err(CacheError::Config)?;

    let transport = HttpTransport::new();
    let tag_writer = LoftyTagWriter;
    let mut cacher = PlaylistCacher::new(&service, &transport, &tag_writer, options);
    cacher.run()
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();
    // Until the config is loaded only the command-line level is known.
    log::set_max_level(args.debug_level.unwrap_or_default().to_level_filter());

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    match run(&args) {
        Ok(report) if report.failed.is_empty() => {
            info!(
                "cached {} track(s) from {}",
                report.cached.len(),
                to_safe_print(&report.playlist_name)
            );
            if report.source_cleared {
                info!("cleared {}", to_safe_print(&report.playlist_name));
            }
            ExitCode::SUCCESS
        }
        Ok(report) => {
            warn!(
                "cached {} track(s) from {}, {} failed",
                report.cached.len(),
                to_safe_print(&report.playlist_name),
                report.failed.len()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{}", to_safe_print(Printable::display(&err)));
            ExitCode::from(err.exit_code())
        }
    }
}

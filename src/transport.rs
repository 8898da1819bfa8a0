//! Byte downloads and staged (temp file, then rename) writes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::sanitize::to_safe_print;

const STAGING_INFIX: &str = "part";

/// Fetches remote bytes into local files.
pub trait Transport {
    /// Streams `url` into `path`, replacing any existing file. Returns bytes written.
    fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64, String>;
}

/// `ureq`-backed transport.
pub struct HttpTransport {
    http_client: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(60))
            .build();
        Self { http_client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64, String> {
        let response = self
            .http_client
            .get(url)
            .call()
            .map_err(|err| format!("request failed: {err}"))?;
        let mut reader = response.into_reader();
        let file = File::create(path)
            .map_err(|err| format!("failed to create {}: {err}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let written = io::copy(&mut reader, &mut writer)
            .map_err(|err| format!("failed to write {}: {err}", path.display()))?;
        writer
            .flush()
            .map_err(|err| format!("failed to flush {}: {err}", path.display()))?;
        debug!("wrote {} bytes to {}", written, to_safe_print(path));
        Ok(written)
    }
}

/// Sibling path used while `target` is being written. Keeps the final
/// extension so format sniffing by extension still works.
pub fn staging_path_for(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match target.extension() {
        Some(extension) => format!(
            "{stem}.{STAGING_INFIX}.{}",
            extension.to_string_lossy()
        ),
        None => format!("{stem}.{STAGING_INFIX}"),
    };
    target.with_file_name(file_name)
}

/// Removes a leftover staging file from an interrupted run.
pub fn clear_staging(staging_path: &Path) -> io::Result<()> {
    match fs::remove_file(staging_path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Moves a fully written staging file into place.
pub fn commit_staged(staging_path: &Path, target: &Path) -> io::Result<()> {
    fs::rename(staging_path, target)
}

use std::env;
use std::path::{Path, PathBuf};

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    /// Public base URL that media URLs are built from. Always ends with `/`.
    pub root_path: Url,
    pub upload_dir: PathBuf,
    /// Uncommitted uploads. Kept outside `upload_dir` so they are never served.
    pub staging_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3500u16)?;
        let cors_origins = env::var("CORS_ORIGIN")
            .map(|raw| split_origins(&raw))
            .unwrap_or_default();
        let root_path = env::var("ROOT_PATH").unwrap_or_else(|_| format!("http://localhost:{port}/"));
        let root_path = parse_root_path(&root_path).ok_or(ConfigError::Invalid {
            name: "ROOT_PATH",
            value: root_path.clone(),
        })?;
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let staging_dir = env::var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_staging_dir(&upload_dir));
        let max_upload_mb = parse_var("MAX_UPLOAD_MB", 20usize)?;

        Ok(Self {
            database_url,
            host,
            port,
            cors_origins,
            root_path,
            upload_dir,
            staging_dir,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// A hidden sibling of the upload root, so promoting a file is a same-filesystem rename.
fn default_staging_dir(upload_dir: &Path) -> PathBuf {
    let name = upload_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "uploads".to_string());
    upload_dir.with_file_name(format!(".{name}-staging"))
}

pub(crate) fn parse_root_path(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).ok()
}

//! Run configuration, read once from the environment at startup.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::BaseDirs;
use url::Url;

use crate::age::MinAge;
use crate::error::ConfigError;
use crate::types::MediaKind;

pub const ENV_FILE_NAME: &str = "abs-cleanup.env";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which media kinds a run is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaTypeFilter {
    #[default]
    Everything,
    Audiobooks,
    Podcasts,
}

impl MediaTypeFilter {
    pub fn includes(self, kind: MediaKind) -> bool {
        match self {
            Self::Everything => true,
            Self::Audiobooks => kind == MediaKind::Audiobook,
            Self::Podcasts => kind == MediaKind::PodcastEpisode,
        }
    }
}

impl FromStr for MediaTypeFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EVERYTHING" => Ok(Self::Everything),
            "AUDIOBOOKS" => Ok(Self::Audiobooks),
            "PODCASTS" => Ok(Self::Podcasts),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MediaTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Everything => "EVERYTHING",
            Self::Audiobooks => "AUDIOBOOKS",
            Self::Podcasts => "PODCASTS",
        })
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_url: Url,
    pub api_token: String,
    pub verify_ssl: bool,
    pub dry_run: bool,
    pub media_type_filter: MediaTypeFilter,
    pub debug: bool,
    pub min_age: Option<MinAge>,
    pub http_timeout: Duration,
}

// Keeps the token out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url.as_str())
            .field("api_token", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("dry_run", &self.dry_run)
            .field("media_type_filter", &self.media_type_filter)
            .field("debug", &self.debug)
            .field("min_age", &self.min_age)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Raw settings plus where a fallback file was read from, if any.
#[derive(Debug, Default)]
pub struct EnvVars {
    pub vars: HashMap<String, String>,
    pub env_file: Option<PathBuf>,
}

impl Config {
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw_url = required(vars, "ABS_URL")?;
        let api_token = required(vars, "ABS_TOKEN")?.to_string();
        let server_url = parse_server_url(raw_url)?;

        let media_type_filter = value(vars, "MEDIA_TYPE").and_then(|v| v.parse::<MediaTypeFilter>().ok()).unwrap_or_default();

        let min_age = value(vars, "AGE").map(|v| v.parse::<MinAge>()).transpose()?;

        let http_timeout = match value(vars, "ABS_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(v.to_string())),
            },
        };

        Ok(Self {
            server_url,
            api_token,
            verify_ssl: value(vars, "VERIFY_SSL") != Some("0"),
            dry_run: flag(vars, "DRY_RUN"),
            media_type_filter,
            debug: flag(vars, "DEBUG"),
            min_age,
            http_timeout,
        })
    }
}

/// A MEDIA_TYPE value that was set but not understood, and so fell back to EVERYTHING.
pub fn unrecognized_media_type(vars: &HashMap<String, String>) -> Option<&str> {
    value(vars, "MEDIA_TYPE").filter(|v| v.parse::<MediaTypeFilter>().is_err())
}

/// `"1"` is true; anything else, including absent, is false.
pub fn flag(vars: &HashMap<String, String>, key: &str) -> bool {
    value(vars, key) == Some("1")
}

fn value<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<'a>(vars: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, ConfigError> {
    value(vars, key).ok_or(ConfigError::Missing(key))
}

fn parse_server_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl { value: raw.to_string(), reason };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(invalid("expected an absolute URL with a host".to_string()));
    }
    Ok(url)
}

/// Default fallback location, e.g. `~/.config/abs-cleanup.env`.
pub fn default_env_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(ENV_FILE_NAME))
}

/// Snapshot the process environment, filling gaps from the fallback env file.
pub fn collect_env() -> Result<EnvVars, ConfigError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    match default_env_file() {
        Some(path) => merge_env_file(vars, &path),
        None => Ok(EnvVars { vars, env_file: None }),
    }
}

/// The file is only consulted when ABS_URL or ABS_TOKEN is missing, and never
/// overrides a value that is already set.
pub fn merge_env_file(mut vars: HashMap<String, String>, path: &Path) -> Result<EnvVars, ConfigError> {
    let complete = value(&vars, "ABS_URL").is_some() && value(&vars, "ABS_TOKEN").is_some();
    if complete || !path.is_file() {
        return Ok(EnvVars { vars, env_file: None });
    }

    let env_file_err = |source: dotenvy::Error| ConfigError::EnvFile { path: path.to_path_buf(), source };
    for entry in dotenvy::from_path_iter(path).map_err(env_file_err)? {
        let (key, val) = entry.map_err(env_file_err)?;
        let slot = vars.entry(key).or_default();
        if slot.trim().is_empty() {
            *slot = val;
        }
    }
    Ok(EnvVars { vars, env_file: Some(path.to_path_buf()) })
}

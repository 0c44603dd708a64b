use std::path::PathBuf;

use reqwest::StatusCode;

/// Startup configuration failures. Always fatal, raised before any network call.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required setting is unset or empty.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid ABS_URL `{value}`: {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("invalid AGE `{0}` (expected a number followed by d, w, m or y, e.g. 5d, 4w, 3m, 1y)")]
    InvalidAge(String),

    #[error("invalid ABS_TIMEOUT_SECS `{0}` (expected a positive number of seconds)")]
    InvalidTimeout(String),

    /// The token cannot be carried in an HTTP header.
    #[error("ABS_TOKEN contains characters that are not allowed in an HTTP header")]
    InvalidToken,

    #[error("failed to read env file {path}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// A failed call against the media server.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: StatusCode },

    /// Connection, TLS or timeout failure.
    #[error("request to {endpoint} failed")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client")]
    ClientSetup(#[source] reqwest::Error),
}

impl ApiError {
    pub fn status(endpoint: impl Into<String>, status: StatusCode) -> Self {
        Self::Status { endpoint: endpoint.into(), status }
    }

    /// 401 and 403 mean the token is bad or lacks permission; nothing after that can succeed.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

/// Outcomes that abort a purge run.
#[derive(thiserror::Error, Debug)]
pub enum PurgeError {
    #[error("authentication failed, check ABS_TOKEN")]
    Auth(#[source] ApiError),

    #[error("media server unavailable")]
    Api(#[source] ApiError),
}

impl PurgeError {
    /// Classify a call failure that cannot be skipped over.
    pub fn fatal(err: ApiError) -> Self {
        if err.is_auth_failure() { Self::Auth(err) } else { Self::Api(err) }
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

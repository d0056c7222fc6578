//! Error types for fitplay.
//!
//! Every failure in the token lifecycle and the fetch pipeline is terminal from the
//! library's point of view. The CLI layer renders these and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for fitplay
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Credential store
    // ============================================================================
    #[error("Credential store {} is not writable: {source}", path.display())]
    StoreUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential store {} is malformed: {message}", path.display())]
    StoreCorrupt { path: PathBuf, message: String },

    // ============================================================================
    // Authentication
    // ============================================================================
    #[error("No usable {provider} token. Please run `fitplay {provider} auth`")]
    AuthenticationRequired { provider: String },

    #[error("{provider} rejected the refresh token (HTTP {status}): {body}")]
    RefreshRejected {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Request is still unauthorized after refreshing the access token")]
    PersistentAuthFailure,

    #[error("Token endpoint returned an unusable response: {message}")]
    InvalidTokenResponse { message: String },

    #[error("Authorization failed: {message}")]
    AuthorizationFailed { message: String },

    // ============================================================================
    // HTTP
    // ============================================================================
    #[error("Still rate limited after {attempts} backoff attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    // ============================================================================
    // Commands
    // ============================================================================
    #[error("None of the requested songs matched a Spotify track")]
    NoTracksFound,

    // ============================================================================
    // Ambient
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using the fitplay Error
pub type Result<T> = std::result::Result<T, Error>;

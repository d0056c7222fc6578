//! Configuration for fitplay.
//!
//! Values come from the process environment, which [`load_env`] seeds from
//! `./.env` and from `fitplay/.env` in the local data directory. Variables that
//! are already set are never overridden, so the precedence is:
//! 1. Environment variables
//! 2. `./.env`
//! 3. `.env` in the local data directory
//! 4. Built-in defaults
//!
//! The data directory `.env` doubles as the default credential store, which is
//! where refreshed tokens are written back.

use std::{env, io::ErrorKind, path::PathBuf, time::Duration};

use reqwest::Url;
use tracing::debug;

use crate::{
    error::{Error, Result},
    http::BackoffPolicy,
    management::{CredentialStore, DEFAULT_SKEW_SECS, TokenEndpoint},
    spotify, strava, utils,
};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const DEFAULT_PLAYLIST_NAME: &str = "Temple of Chills";
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str = "Made by the GPT playlist gods";

/// `fitplay` directory below the platform's local data directory.
///
/// - Linux: `~/.local/share/fitplay`
/// - macOS: `~/Library/Application Support/fitplay`
/// - Windows: `%LOCALAPPDATA%/fitplay`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("fitplay");
    path
}

/// Loads `./.env` and the data directory `.env` into the environment.
///
/// Missing files are skipped. A file that exists but cannot be parsed is a
/// [`Error::Config`].
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir).await?;

    for path in [PathBuf::from(".env"), dir.join(".env")] {
        match dotenv::from_path(&path) {
            Ok(()) => debug!("Loaded environment from {}", path.display()),
            Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::config(format!(
                    "cannot load {}: {}",
                    path.display(),
                    e
                )));
            }
        }
    }
    Ok(())
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("{key}='{raw}' is invalid: {e}"))),
        None => Ok(default),
    }
}

/// Endpoints, client registration and credential location of one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    /// Env key prefix, e.g. `STRAVA`
    pub prefix: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub redirect_uri: String,
    pub scope: String,
    pub credentials_path: PathBuf,
}

impl ProviderConfig {
    fn from_env(
        name: &str,
        auth_url: &str,
        token_url: &str,
        api_url: &str,
        scope: &str,
    ) -> Self {
        let prefix = name.to_uppercase();
        let key = |field: &str| format!("{prefix}_{field}");

        Self {
            name: name.to_string(),
            client_id: var_or(&key("CLIENT_ID"), ""),
            client_secret: var_or(&key("CLIENT_SECRET"), ""),
            auth_url: var_or(&key("AUTH_URL"), auth_url),
            token_url: var_or(&key("TOKEN_URL"), token_url),
            api_url: var_or(&key("API_URL"), api_url),
            redirect_uri: var_or(&key("REDIRECT_URI"), DEFAULT_REDIRECT_URI),
            scope: var_or(&key("SCOPE"), scope),
            credentials_path: var(&key("CREDENTIALS_PATH"))
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join(".env")),
            prefix,
        }
    }

    pub fn strava() -> Self {
        Self::from_env(
            strava::PROVIDER,
            "https://www.strava.com/oauth/authorize",
            "https://www.strava.com/oauth/token",
            "https://www.strava.com/api/v3",
            "read,activity:read_all",
        )
    }

    pub fn spotify() -> Self {
        Self::from_env(
            spotify::PROVIDER,
            "https://accounts.spotify.com/authorize",
            "https://accounts.spotify.com/api/token",
            "https://api.spotify.com/v1",
            "playlist-modify-public,playlist-modify-private",
        )
    }

    /// Credential store for this provider, falling back to the configured client.
    pub fn store(&self) -> CredentialStore {
        CredentialStore::new(&self.credentials_path, &self.prefix)
            .with_fallback_client(&self.client_id, &self.client_secret)
    }

    pub fn endpoint(&self) -> TokenEndpoint {
        TokenEndpoint::new(&self.name, &self.token_url)
    }

    /// Browser URL for the authorization code grant.
    pub fn authorize_url(&self, state: &str) -> Result<Url> {
        if self.client_id.is_empty() {
            return Err(Error::config(format!("{}_CLIENT_ID is not set", self.prefix)));
        }

        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| Error::config(format!("{}_AUTH_URL is invalid: {}", self.prefix, e)))
    }
}

/// Timeouts and retry tuning shared by both providers.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub http_timeout: Duration,
    pub token_skew_secs: i64,
    pub backoff: BackoffPolicy,
    /// Pause between consecutive pages of one listing
    pub page_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            token_skew_secs: DEFAULT_SKEW_SECS,
            backoff: BackoffPolicy::default(),
            page_delay: Duration::from_secs(1),
        }
    }
}

impl FetchSettings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let backoff = BackoffPolicy::new(
            Duration::from_secs(parse_var(
                "FITPLAY_BACKOFF_BASE_SECS",
                defaults.backoff.base.as_secs(),
            )?),
            Duration::from_secs(parse_var(
                "FITPLAY_BACKOFF_MAX_DELAY_SECS",
                defaults.backoff.max_delay.as_secs(),
            )?),
            parse_var("FITPLAY_BACKOFF_MAX_ATTEMPTS", defaults.backoff.max_attempts)?,
        );

        Ok(Self {
            http_timeout: Duration::from_secs(parse_var(
                "FITPLAY_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            token_skew_secs: parse_var("FITPLAY_TOKEN_SKEW_SECS", defaults.token_skew_secs)?,
            backoff,
            page_delay: Duration::from_millis(parse_var(
                "FITPLAY_PAGE_DELAY_MS",
                defaults.page_delay.as_millis() as u64,
            )?),
        })
    }
}

pub fn playlist_name() -> String {
    var_or("SPOTIFY_PLAYLIST_NAME", DEFAULT_PLAYLIST_NAME)
}

pub fn playlist_description() -> String {
    var_or("SPOTIFY_PLAYLIST_DESCRIPTION", DEFAULT_PLAYLIST_DESCRIPTION)
}

/// Songs from `SPOTIFY_DEFAULT_SONGS` (comma separated), else the built-in list.
pub fn default_songs() -> Vec<String> {
    var("SPOTIFY_DEFAULT_SONGS")
        .map(|raw| utils::split_list(&raw))
        .filter(|songs| !songs.is_empty())
        .unwrap_or_else(|| {
            spotify::DEFAULT_SONGS
                .iter()
                .map(|song| song.to_string())
                .collect()
        })
}

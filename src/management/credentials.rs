use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// OAuth credentials for one provider.
///
/// `expires_at` is always present when `access_token` is; [`CredentialStore::load`]
/// and [`super::TokenProvider`] maintain that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry, epoch seconds
    pub expires_at: Option<i64>,
}

/// Lifecycle state of the access token held in [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    Valid,
    Expired,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// A token counts as expired once `now >= expires_at - skew`.
    pub fn state(&self, now: i64, skew: i64) -> TokenState {
        match (&self.access_token, self.expires_at) {
            (None, _) => TokenState::NoToken,
            (Some(_), Some(expires_at)) if now < expires_at.saturating_sub(skew) => {
                TokenState::Valid
            }
            (Some(_), _) => TokenState::Expired,
        }
    }
}

const CLIENT_ID: &str = "CLIENT_ID";
const CLIENT_SECRET: &str = "CLIENT_SECRET";
const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
const REFRESH_TOKEN: &str = "REFRESH_TOKEN";
const EXPIRES_AT: &str = "TOKEN_EXPIRES_AT";

/// Persists [`Credentials`] as `KEY=value` lines in an env-style file.
///
/// Keys are namespaced by provider, e.g. `STRAVA_ACCESS_TOKEN`, so both providers
/// and unrelated settings can share one file. Lines that are not credential keys
/// are left untouched on save.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    prefix: String,
    fallback: Option<(String, String)>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
            fallback: None,
        }
    }

    /// Client id/secret to use when the file does not carry them.
    #[must_use]
    pub fn with_fallback_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.fallback = Some((client_id.into(), client_secret.into()));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn keys(&self) -> [String; 5] {
        [CLIENT_ID, CLIENT_SECRET, ACCESS_TOKEN, REFRESH_TOKEN, EXPIRES_AT].map(|f| self.key(f))
    }

    /// Reads the persisted credentials. A missing file yields credentials with
    /// every token field absent.
    pub async fn load(&self) -> Result<Credentials> {
        let mut values = self.read_values()?;
        let mut take = |field: &str| {
            values
                .remove(&self.key(field))
                .filter(|value| !value.is_empty())
        };

        let (fallback_id, fallback_secret) = self.fallback.clone().unwrap_or_default();
        let client_id = take(CLIENT_ID).unwrap_or(fallback_id);
        let client_secret = take(CLIENT_SECRET).unwrap_or(fallback_secret);
        let access_token = take(ACCESS_TOKEN);
        let refresh_token = take(REFRESH_TOKEN);
        let expires_at = match take(EXPIRES_AT) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|e| Error::StoreCorrupt {
                path: self.path.clone(),
                message: format!("{} is not an epoch timestamp: {}", self.key(EXPIRES_AT), e),
            })?),
            None => None,
        };

        let expires_at = match (&access_token, expires_at) {
            (Some(_), None) => {
                warn!(
                    "{} has no expiry in {}; treating it as expired",
                    self.key(ACCESS_TOKEN),
                    self.path.display()
                );
                Some(0)
            }
            (_, expires_at) => expires_at,
        };

        Ok(Credentials {
            client_id,
            client_secret,
            access_token,
            refresh_token,
            expires_at,
        })
    }

    fn read_values(&self) -> Result<HashMap<String, String>> {
        let iter = match dotenv::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("No credential store at {}", self.path.display());
                return Ok(HashMap::new());
            }
            Err(e) => return Err(self.corrupt(e)),
        };

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| self.corrupt(e))?;
            values.insert(key, value);
        }
        Ok(values)
    }

    fn corrupt(&self, err: dotenv::Error) -> Error {
        Error::StoreCorrupt {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }

    /// Atomically replaces the credential keys in the store file.
    ///
    /// The new content goes to a sibling temp file, created empty with mode 0600
    /// on Unix before any token is written, which is then renamed over the store.
    /// Readers see either the old or the new file, and the temp file is removed
    /// on every failure.
    pub async fn save(&self, credentials: &Credentials) -> Result<()> {
        let unwritable = |source: std::io::Error| Error::StoreUnwritable {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await.map_err(unwritable)?;
        }

        let existing = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(unwritable(e)),
        };

        let content = self.render(&existing, credentials);
        let tmp = self.temp_path();

        // A leftover temp file keeps its old mode when reopened, so start fresh.
        match async_fs::remove_file(&tmp).await {
            Ok(()) => debug!("Removed stale {}", tmp.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(unwritable(e)),
        }

        let written = async {
            create_private(&tmp).await?;
            async_fs::write(&tmp, content).await?;
            restrict_permissions(&tmp).await?;
            async_fs::rename(&tmp, &self.path).await
        }
        .await;
        if let Err(e) = written {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(unwritable(e));
        }

        debug!("Saved {} credentials to {}", self.prefix, self.path.display());
        Ok(())
    }

    fn render(&self, existing: &str, credentials: &Credentials) -> String {
        let keys = self.keys();
        let mut lines: Vec<String> = existing
            .lines()
            .filter(|line| !line_key(line).is_some_and(|k| keys.iter().any(|own| own == k)))
            .map(str::to_string)
            .collect();

        lines.push(format!("{}={}", self.key(CLIENT_ID), encode_value(&credentials.client_id)));
        lines.push(format!(
            "{}={}",
            self.key(CLIENT_SECRET),
            encode_value(&credentials.client_secret)
        ));
        if let Some(token) = &credentials.access_token {
            lines.push(format!("{}={}", self.key(ACCESS_TOKEN), encode_value(token)));
        }
        if let Some(token) = &credentials.refresh_token {
            lines.push(format!("{}={}", self.key(REFRESH_TOKEN), encode_value(token)));
        }
        if let Some(expires_at) = credentials.expires_at {
            lines.push(format!("{}={}", self.key(EXPIRES_AT), expires_at));
        }

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials".to_string());
        if name.starts_with('.') {
            self.path.with_file_name(format!("{name}.tmp"))
        } else {
            self.path.with_file_name(format!(".{name}.tmp"))
        }
    }
}

/// Key of a `KEY=value` or `export KEY=value` line.
fn line_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    line.split_once('=').map(|(key, _)| key.trim())
}

/// Quotes values the dotenv parser would otherwise reinterpret.
fn encode_value(value: &str) -> String {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_.:/+-".contains(c));
    if plain {
        value.to_string()
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("\"{escaped}\"")
    }
}

#[cfg(unix)]
async fn create_private(path: &Path) -> std::io::Result<()> {
    use async_fs::unix::OpenOptionsExt;
    async_fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .await
        .map(drop)
}

#[cfg(not(unix))]
async fn create_private(path: &Path) -> std::io::Result<()> {
    async_fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map(drop)
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    async_fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

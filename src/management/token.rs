use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    error::{Error, Result},
    http::{ApiRequest, Transport},
};

use super::credentials::{CredentialStore, Credentials, TokenState};

/// Default safety margin subtracted from a token's expiry, in seconds.
pub const DEFAULT_SKEW_SECS: i64 = 60;

/// Token endpoint of one OAuth provider.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    /// Short provider name used in messages, e.g. `strava`
    pub provider: String,
    pub token_url: String,
}

impl TokenEndpoint {
    pub fn new(provider: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            token_url: token_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
}

/// Hands out valid access tokens, refreshing and persisting them as needed.
///
/// Credentials are passed in and handed back by value; the provider itself holds
/// no auth state between calls.
pub struct TokenProvider<T, C> {
    transport: T,
    clock: C,
    store: CredentialStore,
    endpoint: TokenEndpoint,
    skew: i64,
}

impl<T: Transport, C: Clock> TokenProvider<T, C> {
    pub fn new(transport: T, clock: C, store: CredentialStore, endpoint: TokenEndpoint) -> Self {
        Self {
            transport,
            clock,
            store,
            endpoint,
            skew: DEFAULT_SKEW_SECS,
        }
    }

    #[must_use]
    pub fn with_skew(mut self, skew_secs: i64) -> Self {
        self.skew = skew_secs;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn provider(&self) -> &str {
        &self.endpoint.provider
    }

    pub fn state(&self, credentials: &Credentials) -> TokenState {
        credentials.state(self.clock.epoch(), self.skew)
    }

    /// Returns a usable access token plus the (possibly refreshed) credentials.
    ///
    /// A token that is still valid outside the skew window is returned without any
    /// network call. Otherwise the refresh token is exchanged once and the result is
    /// saved to the store before it is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthenticationRequired`] - no refresh token, interactive login needed
    /// - [`Error::RefreshRejected`] - the provider refused the refresh token
    /// - [`Error::StoreUnwritable`] - the refreshed credentials could not be saved
    pub async fn get_valid_access_token(
        &self,
        credentials: Credentials,
    ) -> Result<(String, Credentials)> {
        if self.state(&credentials) == TokenState::Valid {
            if let Some(token) = credentials.access_token.clone() {
                return Ok((token, credentials));
            }
        }

        if credentials.refresh_token.is_none() {
            return Err(Error::AuthenticationRequired {
                provider: self.endpoint.provider.clone(),
            });
        }

        let refreshed = self.refresh(&credentials).await?;
        let token = refreshed
            .access_token
            .clone()
            .ok_or_else(|| Error::InvalidTokenResponse {
                message: "refresh returned no access token".to_string(),
            })?;
        Ok((token, refreshed))
    }

    /// Marks the access token as expired so the next lookup refreshes it.
    pub fn invalidate(&self, mut credentials: Credentials) -> Credentials {
        if credentials.access_token.is_some() {
            credentials.expires_at = Some(0);
        }
        credentials
    }

    /// Exchanges the refresh token for a new access token and persists the result.
    pub async fn refresh(&self, credentials: &Credentials) -> Result<Credentials> {
        let Some(refresh_token) = credentials.refresh_token.as_deref() else {
            return Err(Error::AuthenticationRequired {
                provider: self.endpoint.provider.clone(),
            });
        };

        info!("Refreshing {} access token", self.endpoint.provider);
        let request = ApiRequest::post(&self.endpoint.token_url).form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ]);

        let response = self.transport.send(request).await?;
        match response.status {
            400 | 401 | 403 => {
                return Err(Error::RefreshRejected {
                    provider: self.endpoint.provider.clone(),
                    status: response.status,
                    body: response.body,
                });
            }
            _ if !response.is_success() => {
                return Err(Error::RequestFailed {
                    status: response.status,
                    body: response.body,
                });
            }
            _ => {}
        }

        let token: TokenResponse = response.json()?;
        let updated = self.apply(credentials, token)?;
        self.store.save(&updated).await?;
        debug!(
            "Stored refreshed {} token valid until {:?}",
            self.endpoint.provider, updated.expires_at
        );
        Ok(updated)
    }

    /// Trades an authorization code from the interactive login for tokens.
    pub async fn exchange_authorization_code(
        &self,
        credentials: &Credentials,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<Credentials> {
        let mut fields = vec![
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];
        if let Some(uri) = redirect_uri {
            fields.push(("redirect_uri", uri));
        }

        let response = self
            .transport
            .send(ApiRequest::post(&self.endpoint.token_url).form(&fields))
            .await?;
        if !response.is_success() {
            return Err(Error::RequestFailed {
                status: response.status,
                body: response.body,
            });
        }

        let token: TokenResponse = response.json()?;
        if token.refresh_token.is_none() {
            return Err(Error::InvalidTokenResponse {
                message: "authorization code exchange returned no refresh token".to_string(),
            });
        }

        let updated = self.apply(credentials, token)?;
        self.store.save(&updated).await?;
        Ok(updated)
    }

    fn apply(&self, credentials: &Credentials, token: TokenResponse) -> Result<Credentials> {
        let expires_at = match (token.expires_at, token.expires_in) {
            (Some(at), _) => at,
            (None, Some(secs)) => self.clock.epoch() + secs,
            (None, None) => {
                return Err(Error::InvalidTokenResponse {
                    message: "neither expires_at nor expires_in present".to_string(),
                });
            }
        };

        Ok(Credentials {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            access_token: Some(token.access_token),
            refresh_token: token.refresh_token.or_else(|| credentials.refresh_token.clone()),
            expires_at: Some(expires_at),
        })
    }
}

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

use crate::{
    api::{CallbackState, SharedCallback},
    config::{FetchSettings, ProviderConfig},
    error::{Error, Result},
    info,
    server::start_callback_server,
    success, utils, warning,
};

use super::token_provider;

/// How long the local server waits for the browser redirect.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the authorization code grant for `config` and stores the tokens.
///
/// With `code` the browser step is skipped and the pasted code is exchanged directly.
pub async fn auth(
    config: &ProviderConfig,
    settings: &FetchSettings,
    code: Option<String>,
) -> Result<()> {
    let provider = token_provider(config, settings)?;
    let credentials = provider.store().load().await?;
    if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
        return Err(Error::config(format!(
            "{prefix}_CLIENT_ID and {prefix}_CLIENT_SECRET must be set",
            prefix = config.prefix
        )));
    }

    let code = match code {
        Some(code) => code.trim().to_string(),
        None => authorize_in_browser(config).await?,
    };

    provider
        .exchange_authorization_code(&credentials, &code, Some(&config.redirect_uri))
        .await?;

    success!(
        "Authenticated with {}. Credentials saved to {}",
        config.name,
        provider.store().path().display()
    );
    Ok(())
}

async fn authorize_in_browser(config: &ProviderConfig) -> Result<String> {
    let state = utils::generate_state();
    let url = config.authorize_url(&state)?;
    let shared: SharedCallback = Arc::new(Mutex::new(CallbackState::new(state)));

    let (addr, server) = start_callback_server(&config.redirect_uri, Arc::clone(&shared)).await?;
    info!("Waiting for the {} callback on {}", config.name, addr);

    if webbrowser::open(url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }

    let outcome = wait_for_callback(shared, CALLBACK_TIMEOUT).await;
    server.abort();
    outcome
}

/// Polls the shared callback state until a code or an error arrives.
pub async fn wait_for_callback(shared: SharedCallback, max_wait: Duration) -> Result<String> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        {
            let state = shared.lock().await;
            if state.is_done() {
                return match (&state.code, &state.error) {
                    (Some(code), _) => Ok(code.clone()),
                    (None, error) => Err(Error::AuthorizationFailed {
                        message: error.clone().unwrap_or_default(),
                    }),
                };
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Err(Error::AuthorizationFailed {
        message: format!("no callback within {} seconds", max_wait.as_secs()),
    })
}

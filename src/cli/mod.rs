//! Command implementations behind the `fitplay` binary.
//!
//! Each command builds a [`PagedFetcher`] for its provider from
//! [`ProviderConfig`] and [`FetchSettings`], runs to completion and returns an
//! [`Error`](crate::Error) for `main` to report.

mod auth;
mod export;
mod playlist;

pub use auth::{CALLBACK_TIMEOUT, auth, wait_for_callback};
pub use export::{ExportOptions, export};
pub use playlist::{PlaylistOptions, playlist};

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    clock::SystemClock,
    config::{FetchSettings, ProviderConfig},
    error::Result,
    fetch::PagedFetcher,
    http::ReqwestTransport,
    management::TokenProvider,
};

pub type Fetcher = PagedFetcher<ReqwestTransport, SystemClock>;

pub fn token_provider(
    config: &ProviderConfig,
    settings: &FetchSettings,
) -> Result<TokenProvider<ReqwestTransport, SystemClock>> {
    let transport = ReqwestTransport::new(settings.http_timeout)?;
    Ok(
        TokenProvider::new(transport, SystemClock, config.store(), config.endpoint())
            .with_skew(settings.token_skew_secs),
    )
}

/// Loads the stored credentials and wires up a fetcher for `config`.
pub async fn connect(config: &ProviderConfig, settings: &FetchSettings) -> Result<Fetcher> {
    let provider = token_provider(config, settings)?;
    let credentials = provider.store().load().await?;
    Ok(PagedFetcher::new(provider, credentials)
        .with_backoff(settings.backoff)
        .with_page_delay(settings.page_delay))
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

use std::net::SocketAddr;

use axum::{Extension, Router, routing::get};
use reqwest::Url;
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    api::{self, SharedCallback},
    error::{Error, Result},
};

/// Router serving `/health` and the redirect path of `redirect_uri`.
pub fn router(callback_path: &str, state: SharedCallback) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(callback_path, get(api::callback).layer(Extension(state)))
}

/// Binds the host and port of `redirect_uri` and serves the callback in the background.
pub async fn start_callback_server(
    redirect_uri: &str,
    state: SharedCallback,
) -> Result<(SocketAddr, JoinHandle<()>)> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| Error::config(format!("invalid redirect URI '{redirect_uri}': {e}")))?;
    let host = match url.host_str() {
        Some("localhost") | None => "127.0.0.1",
        Some(host) => host,
    };
    let port = url.port_or_known_default().unwrap_or(8888);

    let listener = TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    debug!("Callback server listening on {} for {}", addr, url.path());

    let app = router(url.path(), state);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("Callback server stopped: {}", e);
        }
    });

    Ok((addr, handle))
}

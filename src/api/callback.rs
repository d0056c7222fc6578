use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::warning;

/// Outcome of the browser redirect, shared between the server and the waiting CLI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackState {
    pub expected_state: String,
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackState {
    pub fn new(expected_state: impl Into<String>) -> Self {
        Self {
            expected_state: expected_state.into(),
            ..Self::default()
        }
    }

    pub fn is_done(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

pub type SharedCallback = Arc<Mutex<CallbackState>>;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<SharedCallback>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;

    // Stray or forged redirects are ignored; the login keeps waiting.
    if params.get("state") != Some(&state.expected_state) {
        warning!("Ignoring callback with unexpected state parameter");
        return Html("<h4>Unexpected state parameter, request ignored.</h4>");
    }

    if state.is_done() {
        return Html("<h4>Login already completed.</h4>");
    }

    if let Some(error) = params.get("error") {
        state.error = Some(error.clone());
        return Html("<h4>Login was denied.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            state.code = Some(code.clone());
            Html("<h2>Authentication successful.</h2><p>You can close this window.</p>")
        }
        None => {
            state.error = Some("callback carried no authorization code".to_string());
            Html("<h4>Missing authorization code.</h4>")
        }
    }
}

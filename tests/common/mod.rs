#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use fitplay::{
    clock::Clock,
    fetch::PagedFetcher,
    http::ReqwestTransport,
    management::{CredentialStore, Credentials, TokenEndpoint, TokenProvider},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::MockServer;

/// Fixed "now" for every test: 2023-11-14T22:13:20Z.
pub const NOW: i64 = 1_700_000_000;

pub const TOKEN_PATH: &str = "/oauth/token";

struct ClockState {
    now: DateTime<Utc>,
    slept: Vec<Duration>,
}

/// Clock that only moves when something sleeps on it.
#[derive(Clone)]
pub struct MockClock {
    state: Arc<Mutex<ClockState>>,
}

impl MockClock {
    pub fn at(epoch: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                now: Utc.timestamp_opt(epoch, 0).unwrap(),
                slept: Vec::new(),
            })),
        }
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.state.lock().unwrap().slept.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.slept().iter().sum()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().now
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap();
        state.now += chrono::Duration::from_std(duration).unwrap();
        state.slept.push(duration);
    }
}

pub fn store(dir: &TempDir) -> CredentialStore {
    CredentialStore::new(dir.path().join(".env"), "STRAVA")
}

pub fn credentials(access_token: &str, expires_at: i64) -> Credentials {
    Credentials {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        access_token: Some(access_token.to_string()),
        refresh_token: Some("refresh-1".to_string()),
        expires_at: Some(expires_at),
    }
}

pub fn token_provider(
    server: &MockServer,
    store: CredentialStore,
    clock: MockClock,
) -> TokenProvider<ReqwestTransport, MockClock> {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
    let endpoint = TokenEndpoint::new("strava", format!("{}{}", server.uri(), TOKEN_PATH));
    TokenProvider::new(transport, clock, store, endpoint)
}

/// Fetcher holding a token that stays valid for an hour past [`NOW`].
pub fn fetcher(
    server: &MockServer,
    dir: &TempDir,
    clock: MockClock,
) -> PagedFetcher<ReqwestTransport, MockClock> {
    PagedFetcher::new(
        token_provider(server, store(dir), clock),
        credentials("valid-token", NOW + 3600),
    )
}

pub fn activity(id: u64, start_epoch: i64) -> Value {
    let start = Utc.timestamp_opt(start_epoch, 0).unwrap();
    json!({
        "id": id,
        "name": format!("Activity {id}"),
        "sport_type": "Run",
        "type": "Run",
        "start_date": start.to_rfc3339(),
        "start_date_local": start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "distance": 5000.0,
        "moving_time": 1500,
        "elapsed_time": 1600,
        "average_speed": 3.33,
        "max_speed": 4.5,
        "total_elevation_gain": 12.0,
        "trainer": false,
        "commute": false
    })
}

/// `count` activities with ids starting at `first_id`, one hour apart.
pub fn activities(first_id: u64, count: usize) -> Value {
    let items: Vec<Value> = (0..count as u64)
        .map(|i| activity(first_id + i, NOW - 86_400 * 365 + (first_id + i) as i64 * 3600))
        .collect();
    Value::Array(items)
}

pub fn token_response(access_token: &str, expires_in: i64) -> Value {
    json!({
        "token_type": "Bearer",
        "access_token": access_token,
        "refresh_token": "refresh-2",
        "expires_in": expires_in
    })
}

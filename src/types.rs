use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

// ---- Strava ----

/// Summary activity as listed by `GET /athlete/activities`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: u64,
    pub name: String,
    pub sport_type: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: DateTime<Utc>,
    pub start_date_local: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: u64,
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub max_speed: f64,
    pub total_elevation_gain: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub calories: Option<f64>,
    #[serde(default)]
    pub trainer: bool,
    #[serde(default)]
    pub commute: bool,
}

/// One exported CSV row. Optional metrics stay `None` when Strava did not record them.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub id: u64,
    pub name: String,
    pub sport_type: String,
    pub start_date: String,
    pub distance_km: f64,
    pub moving_time_min: f64,
    pub elapsed_time_min: f64,
    pub average_speed_kmph: f64,
    pub max_speed_kmph: f64,
    pub total_elevation_gain_m: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub calories: Option<f64>,
    pub trainer: bool,
    pub commute: bool,
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct SportSummaryRow {
    pub sport_type: String,
    pub activity_count: usize,
    pub distance_km: f64,
}

// ---- Spotify ----

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: u32,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    pub uri: String,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

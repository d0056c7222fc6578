//! Spotify Web API calls used to build a playlist from track names.
//!
//! All calls go through a [`crate::fetch::PagedFetcher`], so token refresh and
//! rate-limit handling are the same as for paginated listings.
//!
//! - [`search`]: `GET /search` for tracks
//! - [`playlist`]: `GET /me`, `GET /me/playlists`, `POST /users/{id}/playlists`,
//!   `POST /playlists/{id}/tracks`

pub mod playlist;
pub mod search;

/// Name used for messages and the `SPOTIFY_` key prefix.
pub const PROVIDER: &str = "spotify";

/// Songs used when neither `--songs` nor `SPOTIFY_DEFAULT_SONGS` is given.
pub const DEFAULT_SONGS: [&str; 5] = [
    "Sweet Caroline - Neil Diamond",
    "In Da Club - 50 Cent",
    "Drop It Like It's Hot - Snoop Dogg",
    "Bebot - Black Eyed Peas",
    "Livin' la Vida Loca - Ricky Martin",
];

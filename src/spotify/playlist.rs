use tracing::debug;

use crate::{
    clock::Clock,
    error::Result,
    fetch::{Cursor, Page, PageSource, PagedFetcher},
    http::{ApiRequest, Transport},
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest, Paging,
        Playlist, User,
    },
};

/// Spotify accepts at most 100 track URIs per add request.
pub const TRACK_BATCH_SIZE: usize = 100;

/// Page size used when listing the user's playlists.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

fn endpoint(api_url: &str, path: &str) -> String {
    format!("{}/{}", api_url.trim_end_matches('/'), path)
}

/// Playlists owned or followed by the current user.
#[derive(Debug, Clone)]
pub struct UserPlaylists {
    api_url: String,
}

impl UserPlaylists {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }
}

impl PageSource for UserPlaylists {
    type Record = Playlist;

    fn first_cursor(&self) -> Cursor {
        Cursor::Offset(0)
    }

    fn request(&self, cursor: &Cursor, page_size: u32) -> ApiRequest {
        let offset = match cursor {
            Cursor::Offset(offset) => *offset,
            Cursor::Page(page) => page.saturating_sub(1) * page_size,
        };
        ApiRequest::get(endpoint(&self.api_url, "me/playlists"))
            .query("limit", page_size.min(PLAYLIST_PAGE_SIZE))
            .query("offset", offset)
    }

    fn decode(&self, cursor: &Cursor, body: &str) -> Result<Page<Playlist>> {
        let paging: Paging<Playlist> = serde_json::from_str(body)?;
        let offset = match cursor {
            Cursor::Offset(offset) => *offset,
            Cursor::Page(_) => paging.offset,
        };
        let next = paging
            .next
            .as_ref()
            .map(|_| Cursor::Offset(offset + paging.items.len() as u32));
        Ok(Page {
            records: paging.items,
            next,
        })
    }
}

/// Retrieves the profile of the user the access token belongs to.
///
/// # Arguments
///
/// * `fetcher` - Authorized fetcher holding the Spotify credentials
/// * `api_url` - Base URL of the Web API, e.g. `https://api.spotify.com/v1`
///
/// # Returns
///
/// - `Ok(User)` - The user's id and display name
/// - `Err(Error)` - Any fetch error, or [`crate::Error::Decode`] for an unexpected body
///
/// # API Endpoint
///
/// Uses Spotify's `GET /me` endpoint.
pub async fn current_user<T: Transport, C: Clock>(
    fetcher: &mut PagedFetcher<T, C>,
    api_url: &str,
) -> Result<User> {
    let response = fetcher.execute(ApiRequest::get(endpoint(api_url, "me"))).await?;
    response.json()
}

/// Looks for a playlist called `name`, stopping at the first match.
///
/// Pages through `GET /me/playlists` 50 at a time and returns as soon as a
/// playlist with exactly that name shows up, so later pages are never requested.
pub async fn find_playlist<T: Transport, C: Clock>(
    fetcher: &mut PagedFetcher<T, C>,
    api_url: &str,
    name: &str,
) -> Result<Option<Playlist>> {
    let mut pages = fetcher.pages(UserPlaylists::new(api_url), PLAYLIST_PAGE_SIZE, None);
    while let Some(playlists) = pages.next_page().await? {
        if let Some(found) = playlists.into_iter().find(|p| p.name == name) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Creates an empty playlist owned by `user_id`.
///
/// # Arguments
///
/// * `fetcher` - Authorized fetcher holding the Spotify credentials
/// * `api_url` - Base URL of the Web API
/// * `user_id` - Spotify id of the owner, as returned by [`current_user`]
/// * `request` - Name, description and visibility of the new playlist
///
/// # API Endpoint
///
/// Uses Spotify's `POST /users/{user_id}/playlists` endpoint with a JSON body.
///
/// # Example
///
/// ```ignore
/// let user = playlist::current_user(&mut fetcher, api_url).await?;
/// let request = CreatePlaylistRequest {
///     name: "Temple of Chills".to_string(),
///     description: "Made by the GPT playlist gods".to_string(),
///     public: true,
///     collaborative: false,
/// };
/// let created = playlist::create(&mut fetcher, api_url, &user.id, &request).await?;
/// println!("{}", created.uri);
/// ```
pub async fn create<T: Transport, C: Clock>(
    fetcher: &mut PagedFetcher<T, C>,
    api_url: &str,
    user_id: &str,
    request: &CreatePlaylistRequest,
) -> Result<Playlist> {
    let request =
        ApiRequest::post(endpoint(api_url, &format!("users/{user_id}/playlists"))).json(request)?;
    let response = fetcher.execute(request).await?;
    response.json()
}

/// Appends `uris` to the playlist in batches, returning the number of batches sent.
///
/// Batches hold at most [`TRACK_BATCH_SIZE`] URIs and are sent in order, so the
/// playlist keeps the order of `uris`. The first failing batch aborts; batches
/// already sent stay in the playlist.
pub async fn add_tracks<T: Transport, C: Clock>(
    fetcher: &mut PagedFetcher<T, C>,
    api_url: &str,
    playlist_id: &str,
    uris: &[String],
) -> Result<usize> {
    let url = endpoint(api_url, &format!("playlists/{playlist_id}/tracks"));
    let mut batches = 0;

    for chunk in uris.chunks(TRACK_BATCH_SIZE) {
        let body = AddTrackToPlaylistRequest {
            uris: chunk.to_vec(),
        };
        let response = fetcher.execute(ApiRequest::post(&url).json(&body)?).await?;
        let added: AddTrackToPlaylistResponse = response.json()?;
        batches += 1;
        debug!(
            "Added batch {} ({} tracks), snapshot {}",
            batches,
            chunk.len(),
            added.snapshot_id
        );
    }

    Ok(batches)
}

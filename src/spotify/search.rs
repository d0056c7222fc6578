use crate::{
    clock::Clock,
    error::Result,
    fetch::{Cursor, Page, PageSource, PagedFetcher},
    http::{ApiRequest, Transport},
    types::{SearchResponse, Track},
};

/// Largest `limit` the search endpoint accepts.
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Track search results for one free-text query, in Spotify's ranking order.
#[derive(Debug, Clone)]
pub struct TrackSearch {
    api_url: String,
    query: String,
}

impl TrackSearch {
    pub fn new(api_url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            query: query.into(),
        }
    }
}

impl PageSource for TrackSearch {
    type Record = Track;

    fn first_cursor(&self) -> Cursor {
        Cursor::Offset(0)
    }

    fn request(&self, cursor: &Cursor, page_size: u32) -> ApiRequest {
        let offset = match cursor {
            Cursor::Offset(offset) => *offset,
            Cursor::Page(page) => page.saturating_sub(1) * page_size,
        };

        ApiRequest::get(format!("{}/search", self.api_url.trim_end_matches('/')))
            .query("q", &self.query)
            .query("type", "track")
            .query("limit", page_size.min(MAX_SEARCH_LIMIT))
            .query("offset", offset)
    }

    fn decode(&self, cursor: &Cursor, body: &str) -> Result<Page<Track>> {
        let response: SearchResponse = serde_json::from_str(body)?;
        let paging = response.tracks;
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

/// Returns the best match for `query`, fetching a single one-record page.
///
/// # Arguments
///
/// * `fetcher` - Authorized fetcher holding the Spotify credentials
/// * `api_url` - Base URL of the Web API
/// * `query` - Free text, typically `"Title - Artist"`
///
/// # Returns
///
/// - `Ok(Some(Track))` - Spotify's top-ranked track
/// - `Ok(None)` - The search had no results
/// - `Err(Error)` - Fetch failure; callers may treat [`crate::Error::RequestFailed`]
///   as a miss for this one query
///
/// # Example
///
/// ```ignore
/// if let Some(track) = search::search_track(&mut fetcher, api_url, "Bebot - Black Eyed Peas").await? {
///     uris.push(track.uri);
/// }
/// ```
pub async fn search_track<T: Transport, C: Clock>(
    fetcher: &mut PagedFetcher<T, C>,
    api_url: &str,
    query: &str,
) -> Result<Option<Track>> {
    let mut pages = fetcher.pages(TrackSearch::new(api_url, query), 1, None);
    let first = pages.next_page().await?;
    Ok(first.and_then(|tracks| tracks.into_iter().next()))
}

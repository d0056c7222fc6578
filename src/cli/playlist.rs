use crate::{
    config::{FetchSettings, ProviderConfig},
    error::{Error, Result},
    info,
    spotify::{playlist, search},
    success,
    types::{CreatePlaylistRequest, Track},
    warning,
};

use super::connect;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistOptions {
    pub name: String,
    pub description: String,
    pub songs: Vec<String>,
    pub public: bool,
    /// Leave an existing playlist with the same name alone instead of creating another
    pub skip_existing: bool,
}

fn describe(track: &Track) -> String {
    let artists: Vec<&str> = track.artists.iter().map(|a| a.name.as_str()).collect();
    if artists.is_empty() {
        track.name.clone()
    } else {
        format!("{} - {}", track.name, artists.join(", "))
    }
}

/// Searches every song, then creates a playlist holding the first hit of each.
pub async fn playlist(
    config: &ProviderConfig,
    settings: &FetchSettings,
    opts: &PlaylistOptions,
) -> Result<()> {
    let mut fetcher = connect(config, settings).await?;
    let api_url = config.api_url.as_str();

    let mut uris = Vec::new();
    let mut missing = Vec::new();
    for song in &opts.songs {
        match search::search_track(&mut fetcher, api_url, song).await {
            Ok(Some(track)) => {
                info!("'{}' -> {}", song, describe(&track));
                uris.push(track.uri);
            }
            Ok(None) => missing.push(song.as_str()),
            Err(Error::RequestFailed { status, body }) => {
                warning!("Search for '{}' failed with HTTP {}: {}", song, status, body);
                missing.push(song.as_str());
            }
            Err(e) => return Err(e),
        }
    }

    info!("Found: {} of {} songs", uris.len(), opts.songs.len());
    for song in &missing {
        warning!("Not found: {}", song);
    }

    if uris.is_empty() {
        return Err(Error::NoTracksFound);
    }

    let user = playlist::current_user(&mut fetcher, api_url).await?;
    info!(
        "Logged in as {}",
        user.display_name.as_deref().unwrap_or(&user.id)
    );

    if opts.skip_existing
        && let Some(existing) = playlist::find_playlist(&mut fetcher, api_url, &opts.name).await?
    {
        info!("Playlist '{}' already exists: {}", existing.name, existing.uri);
        return Ok(());
    }

    let request = CreatePlaylistRequest {
        name: opts.name.clone(),
        description: opts.description.clone(),
        public: opts.public,
        collaborative: false,
    };
    let created = playlist::create(&mut fetcher, api_url, &user.id, &request).await?;
    success!("Playlist '{}' created", created.name);

    let batches = playlist::add_tracks(&mut fetcher, api_url, &created.id, &uris).await?;
    success!("Added {} tracks in {} batch(es)", uris.len(), batches);

    if let Some(url) = &created.external_urls.spotify {
        info!("Playlist URL: {}", url);
    }
    info!("Playlist URI: {}", created.uri);
    Ok(())
}

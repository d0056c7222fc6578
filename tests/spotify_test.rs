mod common;

use chrono::Utc;
use fitplay::{
    cli,
    config::{FetchSettings, ProviderConfig},
    spotify::{playlist, search},
    types::CreatePlaylistRequest,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

use common::{MockClock, NOW};

fn track(id: &str, name: &str, artist: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "uri": format!("spotify:track:{id}"),
        "artists": [{ "id": format!("{id}-artist"), "name": artist }]
    })
}

fn playlist_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "public": true,
        "uri": format!("spotify:playlist:{id}"),
        "external_urls": { "spotify": format!("https://open.spotify.com/playlist/{id}") }
    })
}

#[tokio::test]
async fn test_search_returns_first_hit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Sweet Caroline - Neil Diamond"))
        .and(query_param("type", "track"))
        .and(query_param("limit", "1"))
        .and(query_param("offset", "0"))
        .and(header("authorization", "Bearer valid-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {
                "items": [track("t1", "Sweet Caroline", "Neil Diamond")],
                "next": "https://api.spotify.com/v1/search?offset=1",
                "offset": 0,
                "total": 300
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = common::fetcher(&server, &dir, MockClock::at(NOW));
    let found = search::search_track(&mut fetcher, &server.uri(), "Sweet Caroline - Neil Diamond")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.uri, "spotify:track:t1");
    assert_eq!(found.artists[0].name, "Neil Diamond");
}

#[tokio::test]
async fn test_search_without_hits_is_none() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [], "next": null, "offset": 0, "total": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = common::fetcher(&server, &dir, MockClock::at(NOW));
    let found = search::search_track(&mut fetcher, &server.uri(), "zzzz")
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_find_playlist_walks_offsets() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let first: Vec<Value> = (0..50)
        .map(|i| playlist_json(&format!("p{i}"), &format!("Mix {i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": first,
            "next": "https://api.spotify.com/v1/me/playlists?offset=50",
            "offset": 0,
            "total": 52
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("offset", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("p50", "Mix 50"), playlist_json("chill", "Temple of Chills")],
            "next": null,
            "offset": 50,
            "total": 52
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = common::fetcher(&server, &dir, MockClock::at(NOW));
    let found = playlist::find_playlist(&mut fetcher, &server.uri(), "Temple of Chills")
        .await
        .unwrap();

    assert_eq!(found.map(|p| p.id), Some("chill".to_string()));
}

#[tokio::test]
async fn test_create_playlist_for_current_user() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "user-1", "display_name": "Runner" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/user-1/playlists"))
        .and(body_partial_json(json!({
            "name": "Temple of Chills",
            "public": false,
            "collaborative": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(playlist_json("new", "Temple of Chills")))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = common::fetcher(&server, &dir, MockClock::at(NOW));
    let user = playlist::current_user(&mut fetcher, &server.uri()).await.unwrap();
    let request = CreatePlaylistRequest {
        name: "Temple of Chills".to_string(),
        description: "Made by the GPT playlist gods".to_string(),
        public: false,
        collaborative: false,
    };
    let created = playlist::create(&mut fetcher, &server.uri(), &user.id, &request)
        .await
        .unwrap();

    assert_eq!(created.id, "new");
    assert_eq!(
        created.external_urls.spotify.as_deref(),
        Some("https://open.spotify.com/playlist/new")
    );
}

#[tokio::test]
async fn test_tracks_are_added_in_batches_of_100() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/playlists/new/tracks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "snap" })))
        .expect(3)
        .mount(&server)
        .await;

    let uris: Vec<String> = (0..250).map(|i| format!("spotify:track:{i}")).collect();
    let mut fetcher = common::fetcher(&server, &dir, MockClock::at(NOW));
    let batches = playlist::add_tracks(&mut fetcher, &server.uri(), "new", &uris)
        .await
        .unwrap();

    assert_eq!(batches, 3);

    let requests = server.received_requests().await.unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["uris"].as_array().unwrap().len()
        })
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
}

#[tokio::test]
async fn test_playlist_command_skips_songs_without_hits() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let config = ProviderConfig {
        name: "spotify".to_string(),
        prefix: "SPOTIFY".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        auth_url: format!("{}/authorize", server.uri()),
        token_url: format!("{}/api/token", server.uri()),
        api_url: server.uri(),
        redirect_uri: "http://localhost:8888/callback".to_string(),
        scope: "playlist-modify-public".to_string(),
        credentials_path: dir.path().join(".env"),
    };
    let mut creds = common::credentials("valid-token", Utc::now().timestamp() + 3600);
    creds.client_id = "client-id".to_string();
    config.store().save(&creds).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Bebot - Black Eyed Peas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [track("t1", "Bebot", "Black Eyed Peas")], "next": null, "offset": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "No Such Song - Nobody"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [], "next": null, "offset": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "user-1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/user-1/playlists"))
        .respond_with(ResponseTemplate::new(201).set_body_json(playlist_json("new", "Temple of Chills")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/playlists/new/tracks"))
        .and(body_partial_json(json!({ "uris": ["spotify:track:t1"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "snap" })))
        .expect(1)
        .mount(&server)
        .await;

    let opts = cli::PlaylistOptions {
        name: "Temple of Chills".to_string(),
        description: "Made by the GPT playlist gods".to_string(),
        songs: vec![
            "Bebot - Black Eyed Peas".to_string(),
            "No Such Song - Nobody".to_string(),
        ],
        public: true,
        skip_existing: false,
    };

    cli::playlist(&config, &FetchSettings::default(), &opts)
        .await
        .unwrap();
}

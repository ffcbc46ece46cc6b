// src/spotify.rs

//! Glue client for the remote playback service: the authorization-code
//! handshake, the refresh-token cache, and the one currently-playing call
//! the poller needs. The core only ever sees this through `PlaybackSource`.

use crate::config::Config;
use crate::playback::{PlaybackSnapshot, PlaybackSource};
use anyhow::{bail, Context};
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";

/// Scope needed to read the player state.
pub const SCOPE_READ_PLAYBACK: &str = "user-read-playback-state";
/// Elevated scope for the playback-control variant.
pub const SCOPE_MODIFY_PLAYBACK: &str = "user-modify-playback-state";

// Native artwork size assumed when the service omits image dimensions.
const DEFAULT_ART_SIZE: u32 = 640;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenCache {
    refresh_token: String,
}

// Wire shape of the currently-playing response, reduced to what the
// snapshot needs.

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    item: Option<Item>,
    progress_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    duration_ms: u64,
    artists: Vec<Artist>,
    album: Album,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    images: Vec<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Authenticated client for the playback service.
pub struct SpotifyClient {
    http: Client,
    access_token: String,
}

impl SpotifyClient {
    /// Connects using the cached refresh token when one exists, falling back
    /// to the interactive authorization-code flow. All failures here are
    /// startup-fatal.
    pub fn connect(config: &Config, scopes: &[&str]) -> anyhow::Result<Self> {
        let http = Client::new();

        if config.token_cache.exists() {
            match refresh_from_cache(&http, config) {
                Ok(access_token) => {
                    info!("Refreshed access token from cache");
                    return Ok(SpotifyClient { http, access_token });
                }
                Err(e) => {
                    warn!("Token refresh failed ({:#}); re-authorizing", e);
                }
            }
        }

        let access_token = authorize_interactively(&http, config, scopes)?;
        Ok(SpotifyClient { http, access_token })
    }
}

impl PlaybackSource for SpotifyClient {
    fn poll(&mut self) -> anyhow::Result<Option<PlaybackSnapshot>> {
        let response = self
            .http
            .get(CURRENTLY_PLAYING_URL)
            .bearer_auth(&self.access_token)
            .send()
            .context("polling currently-playing")?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body: CurrentlyPlaying = response
            .error_for_status()
            .context("currently-playing request")?
            .json()
            .context("parsing currently-playing response")?;
        Ok(snapshot_of(body))
    }
}

/// Maps a wire response to the validated snapshot model. `None` for an
/// empty response or an item the model rejects.
fn snapshot_of(body: CurrentlyPlaying) -> Option<PlaybackSnapshot> {
    let item = body.item?;
    let cover = item.album.images.into_iter().next()?;
    PlaybackSnapshot::from_wire(
        item.name,
        item.artists.into_iter().map(|a| a.name).collect(),
        cover.url,
        cover.width.unwrap_or(DEFAULT_ART_SIZE),
        cover.height.unwrap_or(DEFAULT_ART_SIZE),
        body.progress_ms.unwrap_or(0).min(u32::MAX as u64) as u32,
        item.duration_ms.min(u32::MAX as u64) as u32,
    )
}

/// Builds the URL the user opens to grant access.
fn authorize_url(config: &Config, scopes: &[&str]) -> anyhow::Result<Url> {
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", &scopes.join(" ")),
        ],
    )
    .context("building authorize URL")
}

/// Runs the interactive half of the flow: print the authorize URL, read the
/// redirected URL back from stdin, exchange its code for tokens, and cache
/// the refresh token for the next run.
fn authorize_interactively(
    http: &Client,
    config: &Config,
    scopes: &[&str],
) -> anyhow::Result<String> {
    println!("{}", authorize_url(config, scopes)?);
    print!("Paste the URL you were redirected to: ");
    io::stdout().flush().context("flushing prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading redirect URL")?;
    let code = extract_code(line.trim())?;

    let tokens = token_request(
        http,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", &config.redirect_uri),
        ],
    )?;

    match tokens.refresh_token {
        Some(refresh_token) => save_cache(&config.token_cache, &refresh_token)?,
        None => warn!("Service returned no refresh token; next run re-authorizes"),
    }
    Ok(tokens.access_token)
}

fn refresh_from_cache(http: &Client, config: &Config) -> anyhow::Result<String> {
    let text = fs::read_to_string(&config.token_cache)
        .with_context(|| format!("reading {}", config.token_cache.display()))?;
    let cache: TokenCache = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", config.token_cache.display()))?;

    let tokens = token_request(
        http,
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", &cache.refresh_token),
        ],
    )?;
    // The service may rotate the refresh token on use.
    if let Some(rotated) = tokens.refresh_token {
        save_cache(&config.token_cache, &rotated)?;
    }
    Ok(tokens.access_token)
}

fn token_request(
    http: &Client,
    config: &Config,
    params: &[(&str, &str)],
) -> anyhow::Result<TokenResponse> {
    http.post(TOKEN_URL)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(params)
        .send()
        .context("token request")?
        .error_for_status()
        .context("token endpoint")?
        .json()
        .context("parsing token response")
}

fn save_cache(path: &Path, refresh_token: &str) -> anyhow::Result<()> {
    let cache = TokenCache {
        refresh_token: refresh_token.to_string(),
    };
    let text = serde_json::to_string_pretty(&cache).context("serializing token cache")?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Pulls the `code` query parameter out of the pasted redirect URL. A bare
/// code pasted directly is accepted too.
fn extract_code(input: &str) -> anyhow::Result<String> {
    if let Ok(url) = Url::parse(input) {
        if let Some((_, code)) = url.query_pairs().find(|(k, _)| k == "code") {
            return Ok(code.into_owned());
        }
        bail!("redirect URL carries no code parameter: {}", input);
    }
    if input.is_empty() {
        bail!("empty authorization code");
    }
    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_json(progress_ms: u64, duration_ms: u64) -> CurrentlyPlaying {
        serde_json::from_str(&format!(
            r#"{{
                "progress_ms": {progress_ms},
                "item": {{
                    "name": "Windowlicker",
                    "duration_ms": {duration_ms},
                    "artists": [{{"name": "Aphex Twin"}}],
                    "album": {{
                        "images": [
                            {{"url": "https://img.example/640.jpg", "width": 640, "height": 640}},
                            {{"url": "https://img.example/300.jpg", "width": 300, "height": 300}}
                        ]
                    }}
                }}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn snapshot_takes_the_first_listed_image() {
        let snap = snapshot_of(playing_json(30_000, 120_000)).unwrap();
        assert_eq!(snap.track_name, "Windowlicker");
        assert_eq!(snap.artist_names, vec!["Aphex Twin".to_string()]);
        assert_eq!(snap.artwork_url, "https://img.example/640.jpg");
        assert_eq!((snap.artwork_width, snap.artwork_height), (640, 640));
        assert_eq!(snap.progress_ms, 30_000);
        assert_eq!(snap.duration_ms, 120_000);
    }

    #[test]
    fn empty_item_means_nothing_playing() {
        let body: CurrentlyPlaying =
            serde_json::from_str(r#"{ "item": null, "progress_ms": null }"#).unwrap();
        assert!(snapshot_of(body).is_none());
    }

    #[test]
    fn zero_duration_item_is_rejected() {
        assert!(snapshot_of(playing_json(5_000, 0)).is_none());
    }

    #[test]
    fn overlong_progress_is_clamped() {
        let snap = snapshot_of(playing_json(999_999, 120_000)).unwrap();
        assert_eq!(snap.progress_ms, 120_000);
    }

    #[test]
    fn authorize_url_encodes_scopes() {
        let config: Config = serde_json::from_str(
            r#"{
                "client_id": "abc",
                "client_secret": "shh",
                "redirect_uri": "http://localhost:8080/callback"
            }"#,
        )
        .unwrap();
        let url = authorize_url(&config, &[SCOPE_READ_PLAYBACK, SCOPE_MODIFY_PLAYBACK]).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("client_id=abc"));
        assert!(query.contains("user-read-playback-state+user-modify-playback-state"));
    }

    #[test]
    fn extract_code_handles_full_url_and_bare_code() {
        let code =
            extract_code("http://localhost:8080/callback?code=AQDtoken&state=x").unwrap();
        assert_eq!(code, "AQDtoken");
        assert_eq!(extract_code("AQDtoken").unwrap(), "AQDtoken");
        assert!(extract_code("http://localhost:8080/callback?error=denied").is_err());
        assert!(extract_code("").is_err());
    }
}

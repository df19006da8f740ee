// Spotify Web API client (client credentials flow)

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use hackify_shared::config::Config;
use hackify_shared::errors::ResolveError;

use crate::resolver::{PlaylistPage, PlaylistSource};

/// Only the fields the resolver reads.
const PLAYLIST_FIELDS: &str = "items(track(name,artists(name))),next";
const PAGE_LIMIT: &str = "100";
/// Refresh the token this many seconds before Spotify says it expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

pub struct SpotifyClient {
    http: reqwest::Client,
    api_base: String,
    auth_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.spotify_api_base.clone(),
            auth_url: config.spotify_auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        }
    }

    /// Get an access token, reusing the cached one while it is fresh.
    async fn access_token(&self) -> Result<String, ResolveError> {
        let mut cache = self.token.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = cache.as_ref() {
            if token.expires_at > now + TOKEN_EXPIRY_MARGIN_SECS {
                debug!("Using cached Spotify access token");
                return Ok(token.access_token.clone());
            }
        }

        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(ResolveError::Auth(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set".to_string(),
            ));
        }

        info!("Fetching new Spotify access token");
        let response = self
            .http
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::Auth(format!("token request returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::Malformed(format!("token response: {}", e)))?;

        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });
        debug!("Got Spotify access token, expires in {}s", token.expires_in);
        Ok(token.access_token)
    }

    /// GET a playlist page. `query` is empty when following a `next` URL,
    /// which already carries its own.
    async fn get_page(&self, url: &str, query: &[(&str, &str)]) -> Result<PlaylistPage, ResolveError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let err = ResolveError::Api {
                status: status.as_u16(),
                message,
            };
            if err.is_auth() {
                warn!("Spotify rejected the access token, dropping it");
                *self.token.lock().await = None;
            }
            return Err(err);
        }

        response
            .json::<PlaylistPage>()
            .await
            .map_err(|e| ResolveError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn first_page(&self, playlist_id: &str) -> Result<PlaylistPage, ResolveError> {
        let url = format!("{}/playlists/{}/tracks", self.api_base, playlist_id);
        self.get_page(&url, &[("limit", PAGE_LIMIT), ("fields", PLAYLIST_FIELDS)])
            .await
    }

    async fn next_page(&self, cursor: &str) -> Result<PlaylistPage, ResolveError> {
        self.get_page(cursor, &[]).await
    }
}

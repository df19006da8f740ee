/// Playlist resolution: playlist URL -> ordered track descriptors.
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use hackify_shared::errors::ResolveError;
use hackify_shared::models::TrackDescriptor;

use crate::link_detector::{extract_playlist_id, is_valid_playlist_id};

/// One page of playlist items.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    /// Opaque cursor for the next page, `None` on the last one.
    pub next: Option<String>,
}

/// A playlist entry. `track` is null for removed or unavailable tracks.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<TrackPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPayload {
    pub name: String,
    /// Ordered, primary artist first.
    #[serde(default)]
    pub artists: Vec<ArtistPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistPayload {
    pub name: String,
}

/// Remote playlist API.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetch the first page of a playlist.
    async fn first_page(&self, playlist_id: &str) -> Result<PlaylistPage, ResolveError>;

    /// Fetch the page a previous response pointed to.
    async fn next_page(&self, cursor: &str) -> Result<PlaylistPage, ResolveError>;
}

pub struct PlaylistResolver<S> {
    source: S,
}

impl<S: PlaylistSource> PlaylistResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Walk every page of the playlist behind `playlist_url`.
    ///
    /// Any failure aborts the whole resolution; no partial list is returned.
    pub async fn resolve(&self, playlist_url: &str) -> Result<Vec<TrackDescriptor>, ResolveError> {
        let playlist_id = extract_playlist_id(playlist_url);
        if !is_valid_playlist_id(playlist_id) {
            return Err(ResolveError::InvalidPlaylistId(playlist_id.to_string()));
        }

        let mut tracks = Vec::new();
        let mut page = self.source.first_page(playlist_id).await?;
        let mut page_no = 1;
        loop {
            debug!("Playlist {} page {}: {} items", playlist_id, page_no, page.items.len());
            for item in page.items {
                // Removed tracks come back as null
                let Some(track) = item.track else { continue };
                let artist = track.artists.into_iter().next().ok_or_else(|| {
                    ResolveError::Malformed(format!("track '{}' has no artists", track.name))
                })?;
                tracks.push(TrackDescriptor::new(track.name, artist.name));
            }

            match page.next {
                Some(cursor) => {
                    page = self.source.next_page(&cursor).await?;
                    page_no += 1;
                }
                None => break,
            }
        }

        info!("Resolved {} tracks from playlist {} ({} pages)", tracks.len(), playlist_id, page_no);
        Ok(tracks)
    }
}

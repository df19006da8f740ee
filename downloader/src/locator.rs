/// Video lookup with bounded retry.
use async_trait::async_trait;
use tracing::{debug, warn};

use hackify_shared::config::SearchRetry;
use hackify_shared::errors::LocateError;

/// Remote video search.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Id of the single top result for `query`, if any.
    async fn top_result(&self, query: &str) -> Result<Option<String>, LocateError>;
}

#[async_trait]
impl<T: VideoSearch + ?Sized> VideoSearch for std::sync::Arc<T> {
    async fn top_result(&self, query: &str) -> Result<Option<String>, LocateError> {
        (**self).top_result(query).await
    }
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

pub struct VideoLocator<S> {
    search: S,
    retry: SearchRetry,
}

impl<S: VideoSearch> VideoLocator<S> {
    pub fn new(search: S, retry: SearchRetry) -> Self {
        Self { search, retry }
    }

    /// Find a video URL for `query`.
    ///
    /// Tries `retry.attempts` times in total. A pause follows every attempt
    /// except the last: `empty_delay` after no result, `error_delay` after a
    /// failed search.
    pub async fn locate(&self, query: &str) -> Result<String, LocateError> {
        let attempts = self.retry.attempts.max(1);
        for attempt in 1..=attempts {
            let delay = match self.search.top_result(query).await {
                Ok(Some(video_id)) => {
                    debug!("Found video {} for '{}' (attempt {})", video_id, query, attempt);
                    return Ok(watch_url(&video_id));
                }
                Ok(None) => {
                    debug!("No result for '{}' (attempt {}/{})", query, attempt, attempts);
                    self.retry.empty_delay
                }
                Err(e) => {
                    warn!("Error finding YouTube URL for {}: {}", query, e);
                    self.retry.error_delay
                }
            };
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }

        Err(LocateError::NotFound {
            query: query.to_string(),
            attempts,
        })
    }
}

/// Playlist run: resolve, fan the tracks out over the task queue, summarize.
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use hackify_shared::errors::HackifyResult;
use hackify_shared::models::{DownloadOutcome, RunSummary, TrackDescriptor};
use hackify_shared::task_queue::TaskQueue;

use crate::locator::VideoSearch;
use crate::resolver::{PlaylistResolver, PlaylistSource};
use crate::track_downloader::{AudioFetcher, TrackDownloader};

/// One track in, one success flag out. Failures are logged by the
/// implementation.
#[async_trait]
pub trait TrackDownload: Send + Sync + 'static {
    async fn download_track(&self, track: &TrackDescriptor) -> bool;
}

#[async_trait]
impl<S, F> TrackDownload for TrackDownloader<S, F>
where
    S: VideoSearch + 'static,
    F: AudioFetcher + 'static,
{
    async fn download_track(&self, track: &TrackDescriptor) -> bool {
        match self.download(track).await {
            Ok(status) => {
                debug!("Track {} finished: {}", track.filename(), status);
                true
            }
            Err(_) => false,
        }
    }
}

pub struct PlaylistOrchestrator<S, D> {
    resolver: PlaylistResolver<S>,
    downloader: Arc<D>,
    queue: TaskQueue,
    download_dir: PathBuf,
}

impl<S: PlaylistSource, D: TrackDownload> PlaylistOrchestrator<S, D> {
    pub fn new(
        resolver: PlaylistResolver<S>,
        downloader: Arc<D>,
        queue: TaskQueue,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            downloader,
            queue,
            download_dir: download_dir.into(),
        }
    }

    /// Download every track of one playlist.
    ///
    /// Only a failure to create the download directory is returned as an
    /// error. A playlist that cannot be resolved is logged and reported as an
    /// empty run; individual track failures only show up in the summary.
    pub async fn run(&self, playlist_url: &str) -> HackifyResult<RunSummary> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        let run_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        info!("Getting playlist tracks...");
        let tracks = match self.resolver.resolve(playlist_url).await {
            Ok(tracks) => tracks,
            Err(e) => {
                error!("Error getting playlist tracks: {}", e);
                Vec::new()
            }
        };

        if tracks.is_empty() {
            info!("No tracks found in playlist.");
            return Ok(RunSummary::empty());
        }

        info!(
            "[{}] Found {} tracks. Starting download with {} workers...",
            run_id,
            tracks.len(),
            self.queue.max_concurrent()
        );

        let filenames: Vec<String> = tracks.iter().map(|t| t.filename().to_string()).collect();
        let downloader = self.downloader.clone();
        let results = self
            .queue
            .run(tracks, move |track: TrackDescriptor| {
                let downloader = downloader.clone();
                async move { downloader.download_track(&track).await }
            })
            .await;

        // A panicked job counts as a failed track
        let outcomes: Vec<DownloadOutcome> = filenames
            .into_iter()
            .zip(results)
            .map(|(filename, result)| DownloadOutcome {
                filename,
                success: result.unwrap_or(false),
            })
            .collect();

        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            "[{}] Run finished: {}/{} tracks",
            run_id, summary.successful, summary.total
        );
        if !summary.failed_tracks.is_empty() {
            warn!("[{}] Failed tracks: {}", run_id, summary.failed_tracks.join(", "));
        }
        debug!("[{}] Queue stats: {:?}", run_id, self.queue.stats());
        Ok(summary)
    }
}

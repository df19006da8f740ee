/// Single-track download: existence check, video lookup, transcode.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use hackify_shared::config::AUDIO_EXTENSION;
use hackify_shared::errors::DownloadError;
use hackify_shared::models::{TrackDescriptor, TrackStatus};

use crate::locator::{VideoLocator, VideoSearch};

/// External download/transcode utility.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Fetch the best audio of `url` and write `<output_stem>.mp3`.
    async fn fetch_audio(&self, url: &str, output_stem: &Path) -> Result<(), DownloadError>;
}

#[async_trait]
impl<T: AudioFetcher + ?Sized> AudioFetcher for Arc<T> {
    async fn fetch_audio(&self, url: &str, output_stem: &Path) -> Result<(), DownloadError> {
        (**self).fetch_audio(url, output_stem).await
    }
}

pub struct TrackDownloader<S, F> {
    locator: VideoLocator<S>,
    fetcher: F,
    download_dir: PathBuf,
}

impl<S: VideoSearch, F: AudioFetcher> TrackDownloader<S, F> {
    pub fn new(locator: VideoLocator<S>, fetcher: F, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            locator,
            fetcher,
            download_dir: download_dir.into(),
        }
    }

    /// `<download_dir>/<filename>` without extension.
    pub fn output_stem(&self, track: &TrackDescriptor) -> PathBuf {
        self.download_dir.join(track.filename())
    }

    /// `<download_dir>/<filename>.mp3`.
    pub fn target_path(&self, track: &TrackDescriptor) -> PathBuf {
        self.download_dir
            .join(format!("{}.{}", track.filename(), AUDIO_EXTENSION))
    }

    /// Download one track unless its file is already on disk.
    ///
    /// Errors are logged here with the search query and returned; callers
    /// only need the outcome.
    pub async fn download(&self, track: &TrackDescriptor) -> Result<TrackStatus, DownloadError> {
        let target = self.target_path(track);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            info!("Skipping (already exists): {}", track.filename());
            return Ok(TrackStatus::AlreadyPresent);
        }

        match self.fetch(track, &target).await {
            Ok(()) => {
                info!("Successfully downloaded: {}", track.filename());
                Ok(TrackStatus::Downloaded)
            }
            Err(e @ DownloadError::VideoNotFound(_)) => {
                warn!("{}", e);
                Err(e)
            }
            Err(e) => {
                error!("Error downloading {}: {}", track.search_query(), e);
                Err(e)
            }
        }
    }

    async fn fetch(&self, track: &TrackDescriptor, target: &Path) -> Result<(), DownloadError> {
        let url = self.locator.locate(track.search_query()).await?;
        self.fetcher.fetch_audio(&url, &self.output_stem(track)).await?;

        if !tokio::fs::try_exists(target).await? {
            return Err(DownloadError::MissingOutput(target.to_path_buf()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::locator::tests::ScriptedSearch;
    use hackify_shared::config::SearchRetry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fetcher that writes an empty mp3 (or fails, or writes nothing).
    pub(crate) struct FakeFetcher {
        pub calls: AtomicUsize,
        pub fail: bool,
        pub write_file: bool,
    }

    impl FakeFetcher {
        pub(crate) fn working() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                write_file: true,
            }
        }
    }

    #[async_trait]
    impl AudioFetcher for FakeFetcher {
        async fn fetch_audio(&self, _url: &str, output_stem: &Path) -> Result<(), DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DownloadError::UtilityFailed {
                    code: Some(1),
                    message: "ERROR: Video unavailable".into(),
                });
            }
            if self.write_file {
                let path = format!("{}.{}", output_stem.display(), AUDIO_EXTENSION);
                tokio::fs::write(path, b"ID3").await?;
            }
            Ok(())
        }
    }

    pub(crate) fn no_wait() -> SearchRetry {
        SearchRetry {
            attempts: 3,
            empty_delay: Duration::ZERO,
            error_delay: Duration::ZERO,
        }
    }

    fn downloader(
        search: Arc<ScriptedSearch>,
        fetcher: Arc<FakeFetcher>,
        dir: &Path,
    ) -> TrackDownloader<Arc<ScriptedSearch>, Arc<FakeFetcher>> {
        TrackDownloader::new(VideoLocator::new(search, no_wait()), fetcher, dir)
    }

    #[test]
    fn test_paths() {
        let d = downloader(
            Arc::new(ScriptedSearch::always_empty()),
            Arc::new(FakeFetcher::working()),
            Path::new("downloads"),
        );
        let track = TrackDescriptor::new("Song", "Band");
        assert_eq!(d.target_path(&track), PathBuf::from("downloads/Band - Song.mp3"));
        assert_eq!(d.output_stem(&track), PathBuf::from("downloads/Band - Song"));
    }

    #[tokio::test]
    async fn test_second_run_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let search = Arc::new(ScriptedSearch::new(vec![Ok(Some("vid1".into()))]));
        let fetcher = Arc::new(FakeFetcher::working());
        let d = downloader(search.clone(), fetcher.clone(), dir.path());
        let track = TrackDescriptor::new("Song", "Band");

        assert_eq!(d.download(&track).await.unwrap(), TrackStatus::Downloaded);
        assert!(dir.path().join("Band - Song.mp3").exists());
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        assert_eq!(d.download(&track).await.unwrap(), TrackStatus::AlreadyPresent);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_video_not_found_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let search = Arc::new(ScriptedSearch::always_empty());
        let fetcher = Arc::new(FakeFetcher::working());
        let d = downloader(search.clone(), fetcher.clone(), dir.path());

        let err = d.download(&TrackDescriptor::new("Ghost", "Nobody")).await.unwrap_err();

        assert!(matches!(err, DownloadError::VideoNotFound(q) if q == "Ghost - Nobody"));
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_utility_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher {
            fail: true,
            ..FakeFetcher::working()
        });
        let d = downloader(
            Arc::new(ScriptedSearch::new(vec![Ok(Some("vid".into()))])),
            fetcher,
            dir.path(),
        );
        let err = d.download(&TrackDescriptor::new("Song", "Band")).await.unwrap_err();
        assert!(matches!(err, DownloadError::UtilityFailed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_missing_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher {
            write_file: false,
            ..FakeFetcher::working()
        });
        let d = downloader(
            Arc::new(ScriptedSearch::new(vec![Ok(Some("vid".into()))])),
            fetcher,
            dir.path(),
        );
        let err = d.download(&TrackDescriptor::new("Song", "Band")).await.unwrap_err();
        assert!(matches!(err, DownloadError::MissingOutput(_)));
    }
}

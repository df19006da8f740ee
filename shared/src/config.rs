/// Runtime configuration, read from the environment (and `.env`).
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_MAX_CONCURRENT: usize = 3;
pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
pub const DEFAULT_SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/api/token";

/// Extension of every file the downloader produces.
pub const AUDIO_EXTENSION: &str = "mp3";
/// yt-dlp `--audio-quality` value (320 kbps).
pub const AUDIO_QUALITY: &str = "320K";

/// Retry policy for the video search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRetry {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Pause after a search that returned nothing.
    pub empty_delay: Duration,
    /// Pause after a search that failed.
    pub error_delay: Duration,
}

impl Default for SearchRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            empty_delay: Duration::from_secs(1),
            error_delay: Duration::from_secs(2),
        }
    }
}

/// Everything the pipeline needs, passed explicitly to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub download_dir: PathBuf,
    pub max_concurrent: usize,
    pub ytdlp_bin: String,
    /// Extra directory holding ffmpeg, added to yt-dlp's PATH.
    pub ffmpeg_path: Option<PathBuf>,
    pub spotify_api_base: String,
    pub spotify_auth_url: String,
    /// ANSI colour in log output.
    pub color: bool,
    pub search_retry: SearchRetry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            ytdlp_bin: DEFAULT_YTDLP_BIN.to_string(),
            ffmpeg_path: None,
            spotify_api_base: DEFAULT_SPOTIFY_API_BASE.to_string(),
            spotify_auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            color: true,
            search_retry: SearchRetry::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    ///
    /// Missing credentials are not an error here: they surface when the
    /// first Spotify call fails.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let max_concurrent = match get("MAX_CONCURRENT_TASKS") {
            None => defaults.max_concurrent,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(
                        "Invalid MAX_CONCURRENT_TASKS '{}', using {}",
                        raw, DEFAULT_MAX_CONCURRENT
                    );
                    DEFAULT_MAX_CONCURRENT
                }
            },
        };

        Self {
            client_id: get("SPOTIFY_CLIENT_ID").unwrap_or_default(),
            client_secret: get("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
            download_dir: get("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            max_concurrent,
            ytdlp_bin: get("YTDLP_BIN").unwrap_or(defaults.ytdlp_bin),
            ffmpeg_path: get("FFMPEG_PATH").map(PathBuf::from),
            spotify_api_base: get("SPOTIFY_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.spotify_api_base),
            spotify_auth_url: get("SPOTIFY_AUTH_URL").unwrap_or(defaults.spotify_auth_url),
            // NO_COLOR disables colour whatever its value
            color: lookup("NO_COLOR").is_none(),
            search_retry: defaults.search_retry,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

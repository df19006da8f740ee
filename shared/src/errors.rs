/// Unified error types for the Hackify pipeline.
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Hackify.
///
/// Per-stage errors are handled inside a playlist run; only failures that
/// stop the run itself reach this type.
#[derive(Debug, Error)]
pub enum HackifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a playlist URL into tracks.
///
/// Any of these aborts the whole resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid playlist id: '{0}'")]
    InvalidPlaylistId(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed playlist response: {0}")]
    Malformed(String),
}

impl ResolveError {
    /// Whether the cached access token should be discarded.
    pub fn is_auth(&self) -> bool {
        matches!(self, ResolveError::Auth(_) | ResolveError::Api { status: 401, .. })
    }
}

/// Errors from the video search step.
#[derive(Debug, Error)]
pub enum LocateError {
    /// A single search attempt failed (spawn failure, non-zero exit, bad output).
    #[error("Search failed: {0}")]
    Search(String),

    #[error("No video found for '{query}' after {attempts} attempts")]
    NotFound { query: String, attempts: u32 },
}

/// Per-track download failures. Never propagated past the orchestrator.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Could not find YouTube URL for: {0}")]
    VideoNotFound(String),

    #[error("Video search failed: {0}")]
    Search(String),

    #[error("Failed to launch download utility: {0}")]
    SpawnFailed(String),

    #[error("Download utility exited with code {code:?}: {message}")]
    UtilityFailed { code: Option<i32>, message: String },

    #[error("Download utility produced no file at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LocateError> for DownloadError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::NotFound { query, .. } => DownloadError::VideoNotFound(query),
            LocateError::Search(message) => DownloadError::Search(message),
        }
    }
}

/// Result type alias for Hackify operations.
pub type HackifyResult<T> = Result<T, HackifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_query() {
        let err: DownloadError = LocateError::NotFound {
            query: "Song - Artist".into(),
            attempts: 3,
        }
        .into();
        assert!(matches!(&err, DownloadError::VideoNotFound(q) if q == "Song - Artist"));
        assert_eq!(err.to_string(), "Could not find YouTube URL for: Song - Artist");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "downloads");
        let err: HackifyError = io.into();
        assert_eq!(err.to_string(), "IO error: downloads");
    }

    #[test]
    fn test_missing_output_names_path() {
        let err = DownloadError::MissingOutput(PathBuf::from("downloads/x.mp3"));
        assert!(err.to_string().contains("downloads/x.mp3"));
    }

    #[test]
    fn test_auth_detection() {
        assert!(ResolveError::Auth("bad secret".into()).is_auth());
        assert!(ResolveError::Api { status: 401, message: "expired".into() }.is_auth());
        assert!(!ResolveError::Api { status: 404, message: "gone".into() }.is_auth());
        assert!(!ResolveError::Malformed("x".into()).is_auth());
    }
}

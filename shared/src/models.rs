/// Track and run models shared across Hackify crates.
use serde::{Deserialize, Serialize};

use crate::sanitize::sanitize_filename;

/// One resolved playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    name: String,
    artist: String,
    search_query: String,
    filename: String,
}

impl TrackDescriptor {
    /// Build a descriptor, deriving the search phrase and file stem.
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        let name = name.into();
        let artist = artist.into();
        let search_query = format!("{} - {}", name, artist);
        let filename = sanitize_filename(&format!("{} - {}", artist, name));
        Self {
            name,
            artist,
            search_query,
            filename,
        }
    }

    /// Track title as listed in the playlist.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary artist.
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// "name - artist", fed to the video search.
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Sanitized "artist - name", without extension.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// How a successful track download was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Downloaded,
    AlreadyPresent,
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackStatus::Downloaded => write!(f, "downloaded"),
            TrackStatus::AlreadyPresent => write!(f, "already_present"),
        }
    }
}

/// Success flag for one track of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub filename: String,
    pub success: bool,
}

/// Aggregated result of one playlist run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    /// Filenames of the tracks that failed, in playlist order.
    pub failed_tracks: Vec<String>,
}

impl RunSummary {
    /// Summary of a run that had nothing to download.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Count successes and collect failed filenames, keeping input order.
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        let successful = outcomes.iter().filter(|o| o.success).count();
        let failed_tracks = outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.filename.clone())
            .collect();
        Self {
            total: outcomes.len(),
            successful,
            failed_tracks,
        }
    }

    /// Number of tracks that did not end up on disk.
    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    /// True when the run had no tracks at all.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Lines printed to the operator at the end of a run.
    /// The failure line only appears when something failed.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Download completed!".to_string(),
            format!("Successfully downloaded: {}/{} tracks", self.successful, self.total),
        ];
        if self.failed() > 0 {
            lines.push(format!("Failed to download: {} tracks", self.failed()));
        }
        lines
    }
}

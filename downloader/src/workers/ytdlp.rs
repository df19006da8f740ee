/// yt-dlp subprocess worker.
///
/// Runs `yt-dlp` once per search and once per download. Stdout carries the
/// search JSON; stderr is forwarded to tracing under the `ytdlp` target.
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use hackify_shared::config::{Config, AUDIO_EXTENSION, AUDIO_QUALITY};
use hackify_shared::errors::{DownloadError, LocateError};

use crate::locator::VideoSearch;
use crate::track_downloader::AudioFetcher;

/// Directories to append to yt-dlp's PATH so it can find ffmpeg.
/// `FFMPEG_PATH` wins, then common install locations, then `which ffmpeg`.
fn discover_ffmpeg_dirs(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut extra = Vec::new();

    if let Some(dir) = configured {
        extra.push(dir.to_path_buf());
    }

    let binary = if cfg!(target_os = "windows") { "ffmpeg.exe" } else { "ffmpeg" };
    let common: &[&str] = if cfg!(target_os = "windows") {
        &[r"C:\ffmpeg\bin", r"C:\Program Files\ffmpeg\bin"]
    } else {
        &[
            "/usr/bin",
            "/usr/local/bin",
            "/snap/bin",
            "/opt/homebrew/bin",
            "/home/linuxbrew/.linuxbrew/bin",
        ]
    };
    for dir in common {
        let dir = PathBuf::from(dir);
        if dir.join(binary).exists() && !extra.contains(&dir) {
            extra.push(dir);
        }
    }

    if extra.is_empty() && !cfg!(target_os = "windows") {
        if let Ok(output) = std::process::Command::new("which").arg("ffmpeg").output() {
            if output.status.success() {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if let Some(parent) = Path::new(&found).parent() {
                    if !parent.as_os_str().is_empty() {
                        extra.push(parent.to_path_buf());
                    }
                }
            }
        }
    }

    extra
}

/// `PATH` for the child process: the current one plus `extra`.
fn augmented_path(extra: &[PathBuf]) -> String {
    let current = std::env::var("PATH").unwrap_or_default();
    if extra.is_empty() {
        return current;
    }
    let sep = if cfg!(target_os = "windows") { ";" } else { ":" };
    let extras: Vec<String> = extra.iter().map(|p| p.display().to_string()).collect();
    format!("{}{}{}", current, sep, extras.join(sep))
}

#[derive(Deserialize)]
struct SearchEntry {
    id: Option<String>,
}

/// First video id in `--dump-json` output (one JSON object per line).
fn parse_search_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<SearchEntry>(line).ok())
        .find_map(|entry| entry.id.filter(|id| !id.is_empty()))
}

/// Arguments for one audio download.
fn download_args(url: &str, output_stem: &Path) -> Vec<String> {
    vec![
        url.to_string(),
        "-f".into(),
        "bestaudio/best".into(),
        "-x".into(),
        "--audio-format".into(),
        AUDIO_EXTENSION.into(),
        "--audio-quality".into(),
        AUDIO_QUALITY.into(),
        "-o".into(),
        format!("{}.%(ext)s", output_stem.display()),
        "--no-playlist".into(),
        "--quiet".into(),
        "--no-warnings".into(),
    ]
}

/// Last non-empty stderr line, usually yt-dlp's `ERROR:` message.
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output")
        .to_string()
}

/// yt-dlp as both the video search and the download/transcode utility.
pub struct YtDlp {
    bin: String,
    path_env: String,
}

impl YtDlp {
    pub fn new(config: &Config) -> Self {
        let extra = discover_ffmpeg_dirs(config.ffmpeg_path.as_deref());
        if !extra.is_empty() {
            info!("Adding to yt-dlp PATH: {:?}", extra);
        }
        Self {
            bin: config.ytdlp_bin.clone(),
            path_env: augmented_path(&extra),
        }
    }

    async fn run(&self, args: &[String]) -> std::io::Result<Output> {
        debug!("Running {} {}", self.bin, args.join(" "));
        let output = Command::new(&self.bin)
            .args(args)
            .env("PATH", &self.path_env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(target: "ytdlp", "{}", line);
        }
        Ok(output)
    }
}

#[async_trait]
impl VideoSearch for YtDlp {
    async fn top_result(&self, query: &str) -> Result<Option<String>, LocateError> {
        let args = vec![
            "--dump-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            format!("ytsearch1:{}", query),
        ];
        let output = self
            .run(&args)
            .await
            .map_err(|e| LocateError::Search(format!("failed to spawn {}: {}", self.bin, e)))?;

        if !output.status.success() {
            return Err(LocateError::Search(last_error_line(&String::from_utf8_lossy(
                &output.stderr,
            ))));
        }
        Ok(parse_search_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl AudioFetcher for YtDlp {
    async fn fetch_audio(&self, url: &str, output_stem: &Path) -> Result<(), DownloadError> {
        let output = self
            .run(&download_args(url, output_stem))
            .await
            .map_err(|e| DownloadError::SpawnFailed(format!("{}: {}", self.bin, e)))?;

        if !output.status.success() {
            return Err(DownloadError::UtilityFailed {
                code: output.status.code(),
                message: last_error_line(&String::from_utf8_lossy(&output.stderr)),
            });
        }
        Ok(())
    }
}

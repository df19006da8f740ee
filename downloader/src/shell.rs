/// Interactive prompt loop over a line reader and a writer.
use std::io::Write;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hackify_shared::errors::HackifyResult;
use hackify_shared::models::RunSummary;

use crate::link_detector::{detect_playlist_url, is_playlist_url};
use crate::orchestrator::{PlaylistOrchestrator, TrackDownload};
use crate::resolver::PlaylistSource;

const URL_PROMPT: &str = "Enter Spotify playlist URL (or 'exit' to quit): ";
const AGAIN_PROMPT: &str = "Would you like to download another playlist? (y/n): ";

/// Something that downloads a whole playlist.
#[async_trait]
pub trait PlaylistRunner: Send + Sync {
    async fn run_playlist(&self, url: &str) -> HackifyResult<RunSummary>;
}

#[async_trait]
impl<S: PlaylistSource, D: TrackDownload> PlaylistRunner for PlaylistOrchestrator<S, D> {
    async fn run_playlist(&self, url: &str) -> HackifyResult<RunSummary> {
        self.run(url).await
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// Operator typed `exit`.
    Exit,
    /// Operator answered something other than `y`.
    Declined,
    /// Input reached EOF.
    InputClosed,
    Interrupted,
}

pub struct Shell<R, W, P> {
    input: R,
    output: W,
    runner: P,
    cancel: CancellationToken,
}

impl<R, W, P> Shell<R, W, P>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    P: PlaylistRunner,
{
    pub fn new(input: R, output: W, runner: P, cancel: CancellationToken) -> Self {
        Self {
            input,
            output,
            runner,
            cancel,
        }
    }

    /// Run until the operator leaves, input ends or an interrupt arrives.
    ///
    /// Interrupts stop a pending prompt right away; a playlist run in flight
    /// is allowed to finish first.
    pub async fn run(&mut self) -> anyhow::Result<ShellExit> {
        loop {
            let Some(line) = self.prompt(URL_PROMPT).await? else {
                return Ok(self.stopped());
            };
            let input = line.trim();

            if input.eq_ignore_ascii_case("exit") {
                return Ok(ShellExit::Exit);
            }
            if input.is_empty() {
                writeln!(self.output, "Please enter a valid URL")?;
                continue;
            }
            if !is_playlist_url(input) {
                writeln!(self.output, "Please enter a valid Spotify playlist URL")?;
                continue;
            }

            let url = detect_playlist_url(input).unwrap_or(input);
            debug!("Running playlist {}", url);
            let summary = self
                .runner
                .run_playlist(url)
                .await
                .context("playlist run failed")?;
            if !summary.is_empty() {
                writeln!(self.output)?;
                for line in summary.report_lines() {
                    writeln!(self.output, "{}", line)?;
                }
            }

            if self.cancel.is_cancelled() {
                return Ok(ShellExit::Interrupted);
            }

            let Some(answer) = self.prompt(AGAIN_PROMPT).await? else {
                return Ok(self.stopped());
            };
            if !answer.trim().eq_ignore_ascii_case("y") {
                return Ok(ShellExit::Declined);
            }
        }
    }

    /// Print `text` and read one line. `None` on EOF or interrupt.
    async fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(None),
            read = self.input.read_line(&mut line) => {
                if read.context("failed to read input")? == 0 {
                    Ok(None)
                } else {
                    Ok(Some(line))
                }
            }
        }
    }

    fn stopped(&self) -> ShellExit {
        if self.cancel.is_cancelled() {
            ShellExit::Interrupted
        } else {
            ShellExit::InputClosed
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Hackify - Spotify Playlist Downloader
///
/// Interactive CLI that resolves a Spotify playlist and downloads every track
/// as mp3 through yt-dlp, a few tracks at a time.
mod link_detector;
mod locator;
mod orchestrator;
mod resolver;
mod services;
mod shell;
mod track_downloader;
mod workers;

use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hackify_shared::config::Config;
use hackify_shared::task_queue::TaskQueue;
use locator::VideoLocator;
use orchestrator::PlaylistOrchestrator;
use resolver::PlaylistResolver;
use services::SpotifyClient;
use shell::{Shell, ShellExit};
use track_downloader::TrackDownloader;
use workers::ytdlp::YtDlp;

const FAREWELL: &str = "Thank you for using Spotify Playlist Downloader!";
const INTERRUPTED: &str = "Download interrupted by user";

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hackify=info".parse().unwrap())
                .add_directive("hackify_shared=info".parse().unwrap()),
        )
        .with_ansi(config.color)
        .init();

    info!("=== Hackify Playlist Downloader Starting ===");
    info!(
        "Download dir: {} | workers: {}",
        config.download_dir.display(),
        config.max_concurrent
    );
    if !config.has_credentials() {
        warn!("SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET not set, playlist lookups will fail");
    }

    // First Ctrl-C stops the loop after the current run, second one quits now
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Interrupt received, finishing the current run (Ctrl-C again to quit now)");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("\n{}", INTERRUPTED);
                println!("{}", FAREWELL);
                std::process::exit(130);
            }
        });
    }

    let ytdlp = Arc::new(YtDlp::new(&config));
    let locator = VideoLocator::new(ytdlp.clone(), config.search_retry.clone());
    let downloader = TrackDownloader::new(locator, ytdlp, config.download_dir.clone());
    let orchestrator = PlaylistOrchestrator::new(
        PlaylistResolver::new(SpotifyClient::new(&config)),
        Arc::new(downloader),
        TaskQueue::new(config.max_concurrent),
        config.download_dir.clone(),
    );

    let mut shell = Shell::new(
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        orchestrator,
        cancel,
    );

    let code = match shell.run().await {
        Ok(ShellExit::Interrupted) => {
            println!("\n{}", INTERRUPTED);
            130
        }
        Ok(exit) => {
            info!("Shell stopped: {:?}", exit);
            0
        }
        Err(e) => {
            error!("Shell failed: {:#}", e);
            println!("\nAn error occurred: {:#}", e);
            1
        }
    };

    println!("{}", FAREWELL);
    std::process::exit(code);
}

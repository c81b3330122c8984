//! Capture the screen on a timer and summarize the session with a vision
//! model.
//!
//! Reads the API key from the `OPENAI_API_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! # Defaults: capture every 300s, summarize every 3 screenshots, save
//! # under logs/<date>/<project>/
//! recap-watch my-project
//!
//! # Overrides
//! recap-watch my-project --interval 60 --batch-size 5 --save-dir ~/recaps
//!
//! # Alternate model
//! recap-watch my-project --model gpt-4o
//! ```
//!
//! While running, type `pause`, `resume`, or `stop`; Ctrl-C stops with the
//! same flush-and-reduce sequence.

use clap::Parser;
use recap_watch::{Control, Controller, PrimaryScreen, WatchConfig};
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Capture the screen on a timer and summarize the session with a vision model.
///
/// Reads the API key from the OPENAI_API_KEY environment variable.
#[derive(Parser)]
#[command(name = "recap-watch")]
struct Cli {
    /// Project name; groups this session under <save-dir>/<date>/<project>
    project: String,

    /// Base directory for screenshots and summaries (env RECAP_SAVE_DIR, default "logs")
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Seconds between screen captures (env RECAP_INTERVAL_SECS, default 300)
    #[arg(long)]
    interval: Option<u64>,

    /// Screenshots per summarization batch (env RECAP_BATCH_SIZE, default 3)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Model for summarization calls
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = WatchConfig::from_env(&cli.project);
    if let Some(dir) = cli.save_dir {
        config.save_dir = dir;
    }
    if let Some(secs) = cli.interval {
        config.interval = std::time::Duration::from_secs(secs);
    }
    if let Some(size) = cli.batch_size {
        config.batch_size = size;
    }
    config.model = cli.model;

    let client = match recap_rs::PromptClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let client = match &config.model {
        Some(model) => client.with_model(model.clone()),
        None => client,
    };

    let paths = config.session_paths(chrono::Local::now().date_naive());

    let (tx, rx) = mpsc::channel(8);

    // Supervisory stdin reader: pause / resume / stop lines.
    let stdin_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let msg = match line.trim() {
                "pause" => Control::Pause,
                "resume" => Control::Resume,
                "stop" => Control::Stop,
                "" => continue,
                other => {
                    warn!("Unknown command: {other} (expected pause, resume, or stop)");
                    continue;
                }
            };
            let stop = msg == Control::Stop;
            if stdin_tx.send(msg).await.is_err() || stop {
                break;
            }
        }
    });

    // Ctrl-C maps to the same stop sequence.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Control::Stop).await;
        }
    });

    let controller = Controller::new(config, paths, client, PrimaryScreen);
    if let Err(e) = controller.run(rx).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

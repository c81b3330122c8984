//! Screen-capture controller for recap sessions.
//!
//! `recap-watch` drives the core summarization pipeline from
//! [`recap-rs`](recap_rs): it captures the primary screen on a timer,
//! accumulates screenshots into batches, summarizes each full batch, and
//! on shutdown flushes any partial batch and reduces the whole session to
//! one final summary.
//!
//! # Library usage
//!
//! ```ignore
//! use recap_watch::{Controller, PrimaryScreen, WatchConfig};
//! use recap_rs::PromptClient;
//!
//! let config = WatchConfig::from_env("my-project");
//! let paths = config.session_paths(chrono::Local::now().date_naive());
//! let client = PromptClient::from_env()?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(8);
//! Controller::new(config, paths, client, PrimaryScreen).run(rx).await?;
//! ```
//!
//! # Binary
//!
//! ```sh
//! # Capture every 5 minutes, summarize every 3 screenshots
//! recap-watch my-project
//!
//! # Faster cadence into a custom directory
//! recap-watch my-project --interval 60 --batch-size 5 --save-dir ~/recaps
//! ```
//!
//! While running, `pause`, `resume`, and `stop` lines on stdin steer the
//! worker; Ctrl-C stops it with the same flush-and-reduce sequence.

pub mod capture;
pub mod config;
pub mod controller;

pub use capture::{PrimaryScreen, ScreenSource};
pub use config::{SessionPaths, WatchConfig};
pub use controller::{Control, Controller};

//! Controller configuration: environment defaults with CLI overrides.
//!
//! Resolution order is defaults, then environment, then CLI flags (the
//! binary applies flag overrides after [`WatchConfig::from_env`]). The API
//! credential itself is read by
//! [`PromptClient::from_env`](recap_rs::PromptClient::from_env) and is the
//! only setting whose absence is fatal.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Base directory for all sessions. Default: `"logs"`.
pub const SAVE_DIR_VAR: &str = "RECAP_SAVE_DIR";
/// Seconds between screen captures. Default: 300.
pub const INTERVAL_VAR: &str = "RECAP_INTERVAL_SECS";
/// Screenshots per summarization batch. Default: 3.
pub const BATCH_SIZE_VAR: &str = "RECAP_BATCH_SIZE";

/// Settings for one capture session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Project name; groups artifacts under `<save_dir>/<date>/<project>`.
    pub project: String,
    /// Base directory for screenshots and summaries.
    pub save_dir: PathBuf,
    /// Time between screen captures.
    pub interval: Duration,
    /// Screenshots accumulated before each summarization call.
    pub batch_size: usize,
    /// Model override for summarization calls; `None` uses the core default.
    pub model: Option<String>,
}

impl WatchConfig {
    /// Build a config for `project` from environment variables, falling
    /// back to the defaults above. Unparseable values are ignored with a
    /// warning rather than aborting the session.
    pub fn from_env(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            save_dir: std::env::var(SAVE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
            interval: Duration::from_secs(env_parsed(INTERVAL_VAR).unwrap_or(300)),
            batch_size: env_parsed(BATCH_SIZE_VAR).unwrap_or(3),
            model: None,
        }
    }

    /// Resolve the session directory layout for the given date.
    pub fn session_paths(&self, date: NaiveDate) -> SessionPaths {
        let root = self
            .save_dir
            .join(date.format("%Y-%m-%d").to_string())
            .join(&self.project);
        SessionPaths {
            image_cache: root.join(".image_cache"),
            summaries: root.join("summaries"),
            final_summary: root.join("final_summary.txt"),
            root,
        }
    }
}

/// Where one session's artifacts live.
///
/// `.image_cache/` is ephemeral (screenshots are deleted once their batch
/// is summarized); `summaries/` is an append-only artifact set; the final
/// summary is written exactly once at shutdown.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub root: PathBuf,
    pub image_cache: PathBuf,
    pub summaries: PathBuf,
    pub final_summary: PathBuf,
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    let value = std::env::var(var).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unparseable {var}={value}");
            None
        }
    }
}

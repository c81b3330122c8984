//! Incremental batch summarization with sequential context chaining.
//!
//! Each call folds one screenshot batch plus the previous summary into a
//! new summary artifact. The previous artifact's text is the *only*
//! context supplied — history survives only as far as it was absorbed into
//! that text. Artifacts are append-only files named by capture time.

use crate::{Error, PromptClient, Transport};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// System instruction for every batch call. Directs the model to carry
/// previously documented tasks forward and fold new evidence into them
/// rather than starting over.
pub const SUMMARY_SYSTEM_PROMPT: &str = "\
You are about to receive a batch of screenshots taken during someone's \
typical workday. Along with the screenshots, you may also receive a text \
summary of the tasks they have already completed or worked on. Analyze the \
information from both the images and the summary and follow these steps:
1. Retain previous task context: keep any documented tasks or updates \
unless new information directly overrides or complements them.
2. Identify and add new tasks: if the screenshots or the summary show \
tasks that have not been documented yet, add them to the task list.
3. Update ongoing tasks: if a previously documented task is still being \
worked on or shows progress, update its status with the new information, \
building on prior progress rather than replacing it.
4. Infer task progress: for each task, new and existing, infer its current \
state from the available evidence.
5. Reflect the most relevant and current information from both the \
screenshots and the summaries while keeping previous context intact.
6. Group similar activities under broad task categories; avoid breaking \
work into small sub-tasks.
Return the updates as bullet points or a numbered list. DO NOT RETURN \
ANYTHING MORE THAN THE LIST THAT YOU CREATED.";

/// User instruction presenting the batch.
pub const SUMMARY_USER_PROMPT: &str = "Attached are the current batch of screenshots";

/// Identity of one stored summary artifact.
///
/// Wraps the artifact's path; the filename is its capture timestamp. The
/// latest `SummaryId` is the sole continuity state a caller threads
/// between successive [`summarize_batch`] calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryId(PathBuf);

impl SummaryId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// The stored summary text.
    pub fn read(&self) -> Result<String, Error> {
        Ok(std::fs::read_to_string(&self.0)?)
    }
}

/// Summarize one screenshot batch into a new artifact under `output_dir`,
/// chaining onto `previous` when given. Returns the new artifact's
/// identity.
///
/// The batch fails atomically: a missing screenshot path aborts with
/// [`Error::MissingInput`] before any network call or write, and no
/// artifact exists unless the whole call succeeded. Screenshots are read
/// and encoded once, never re-read.
pub async fn summarize_batch<T: Transport>(
    client: &PromptClient<T>,
    screenshots: &[PathBuf],
    output_dir: &Path,
    previous: Option<&SummaryId>,
) -> Result<SummaryId, Error> {
    if screenshots.is_empty() {
        return Err(Error::NoData(output_dir.to_path_buf()));
    }
    // Validate the whole batch up front so a partial read never happens.
    for path in screenshots {
        if !path.exists() {
            return Err(Error::MissingInput(path.clone()));
        }
    }

    let mut images = Vec::with_capacity(screenshots.len());
    for path in screenshots {
        images.push(std::fs::read(path)?);
    }

    let context = match previous {
        Some(id) => vec![id.read()?],
        None => Vec::new(),
    };

    debug!(
        "Summarizing batch of {} screenshot(s), chained={}",
        screenshots.len(),
        previous.is_some()
    );
    let summary = client
        .complete(SUMMARY_SYSTEM_PROMPT, SUMMARY_USER_PROMPT, &context, &images)
        .await?;

    std::fs::create_dir_all(output_dir)?;
    let path = next_artifact_path(output_dir, &Local::now());
    std::fs::write(&path, &summary)?;
    info!("Summary saved at {}", path.display());

    Ok(SummaryId::new(path))
}

/// First free `<timestamp>.txt` under `dir`. Timestamps have second
/// resolution and batches can land faster, so collisions get a numeric
/// suffix instead of clobbering an existing artifact.
fn next_artifact_path(dir: &Path, now: &DateTime<Local>) -> PathBuf {
    let stamp = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    let candidate = dir.join(format!("{stamp}.txt"));
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stamp}-{n}.txt"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

// ── Tests ──────────────────────────────────────────────────────────

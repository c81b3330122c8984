//! Session reduction: every per-batch summary, one final narrative.
//!
//! The combined input body is built deterministically — artifacts sorted
//! by filename, each prefixed with a `### <filename>` header — and sent as
//! a single user message. Artifacts are self-labeled by their timestamp
//! filenames, so the reduction instruction is order-insensitive even
//! though the body itself is stable.

use crate::{Error, PromptClient, Transport};
use std::path::{Path, PathBuf};
use tracing::info;

/// System instruction for the final reduction call.
pub const REDUCE_SYSTEM_PROMPT: &str = "\
The following are timestamped summaries of screenshots taken during a \
work session. Provide a final summary of what the user was working on \
during the session.";

/// Reduce all summary artifacts under `summaries_dir` into one final
/// summary written to `final_output_path`. Returns that path.
///
/// Fails with [`Error::NoData`] — without touching `final_output_path` —
/// when no artifacts exist. Callers decide whether that is fatal.
pub async fn reduce_session<T: Transport>(
    client: &PromptClient<T>,
    summaries_dir: &Path,
    final_output_path: &Path,
) -> Result<PathBuf, Error> {
    let combined = combined_body(summaries_dir)?;
    info!(
        "Reducing {} bytes of summaries from {}",
        combined.len(),
        summaries_dir.display()
    );

    // One combined user turn, no context entries, no images.
    let final_text = client
        .complete(REDUCE_SYSTEM_PROMPT, &combined, &[], &[])
        .await?;

    if let Some(parent) = final_output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(final_output_path, &final_text)?;
    info!("Final summary saved at {}", final_output_path.display());

    Ok(final_output_path.to_path_buf())
}

/// Concatenate every `.txt` artifact, each under a header naming its
/// source file. Sorted by filename so the same artifact set always yields
/// the same body.
fn combined_body(summaries_dir: &Path) -> Result<String, Error> {
    if !summaries_dir.exists() {
        return Err(Error::NoData(summaries_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(summaries_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(Error::NoData(summaries_dir.to_path_buf()));
    }

    let mut combined = String::new();
    for path in &files {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        combined.push_str(&format!("### {name}\n"));
        combined.push_str(&std::fs::read_to_string(path)?);
        combined.push('\n');
    }
    Ok(combined)
}

// ── Tests ──────────────────────────────────────────────────────────

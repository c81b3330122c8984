//! Primary-screen capture into a session's image cache.
//!
//! The controller only ever sees paths: [`ScreenSource::capture_one`]
//! writes one PNG under the given directory and returns where it landed.
//! Tests substitute a source that writes canned files.

use chrono::{DateTime, Local};
use screenshots::Screen;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source of screenshot files.
pub trait ScreenSource {
    /// Capture one screenshot into `dir`, returning the written path.
    fn capture_one(&self, dir: &Path) -> Result<PathBuf, String>;
}

/// Captures the primary display.
pub struct PrimaryScreen;

impl ScreenSource for PrimaryScreen {
    fn capture_one(&self, dir: &Path) -> Result<PathBuf, String> {
        let screens = Screen::all().map_err(|e| format!("screen enumeration failed: {e}"))?;
        let screen = screens
            .first()
            .ok_or_else(|| "no screens found".to_string())?;

        let image = screen
            .capture()
            .map_err(|e| format!("screen capture failed: {e}"))?;

        std::fs::create_dir_all(dir).map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
        let path = next_capture_path(dir, &Local::now());
        image
            .save(&path)
            .map_err(|e| format!("failed to save screenshot: {e}"))?;

        debug!("Screenshot saved at {}", path.display());
        Ok(path)
    }
}

/// First free `<timestamp>.png` under `dir`, suffixing on collision so
/// rapid captures inside one second never overwrite each other.
fn next_capture_path(dir: &Path, now: &DateTime<Local>) -> PathBuf {
    let stamp = now.format("%Y-%m-%d_%H-%M-%S").to_string();
    let candidate = dir.join(format!("{stamp}.png"));
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stamp}-{n}.png"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_names_get_collision_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local::now();

        let first = next_capture_path(dir.path(), &now);
        std::fs::write(&first, "a").unwrap();
        let second = next_capture_path(dir.path(), &now);

        assert_ne!(first, second);
        let name = second.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("-1.png"));
    }
}

//! The capture-batch-summarize worker loop.
//!
//! One logical worker owns the whole pipeline: capture on a timer,
//! accumulate a batch, summarize when the batch is full, and
//! flush-and-reduce on shutdown. Summarization blocks the worker through
//! the retry window, so at most one summary artifact is ever in flight.
//!
//! Control is message-passing only: a supervisor (stdin reader, signal
//! handler, a future panel UI) sends [`Control`] messages over a channel
//! and the worker drives its own state machine. Supervisors never call
//! summarization routines themselves.

use crate::capture::ScreenSource;
use crate::config::{SessionPaths, WatchConfig};
use recap_rs::{Error, PromptClient, SummaryId, Transport, reduce_session, summarize_batch};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Advisory messages from a supervisor to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Suspend new captures. Already-buffered screenshots are kept.
    Pause,
    /// Resume captures after a pause.
    Resume,
    /// Flush any partial batch, reduce the session, and exit.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Running,
    Paused,
    Stopping,
}

/// The capture worker. Owns the screenshot batch and the summary chain's
/// continuity state (the latest [`SummaryId`]).
pub struct Controller<S, T> {
    config: WatchConfig,
    paths: SessionPaths,
    client: PromptClient<T>,
    source: S,
    batch: Vec<PathBuf>,
    previous: Option<SummaryId>,
    state: WorkerState,
}

impl<S: ScreenSource, T: Transport> Controller<S, T> {
    pub fn new(
        config: WatchConfig,
        paths: SessionPaths,
        client: PromptClient<T>,
        source: S,
    ) -> Self {
        Self {
            config,
            paths,
            client,
            source,
            batch: Vec::new(),
            previous: None,
            state: WorkerState::Running,
        }
    }

    /// Run until a [`Control::Stop`] arrives (or every sender is dropped),
    /// then flush any partial batch and reduce the session exactly once.
    pub async fn run(mut self, mut control: mpsc::Receiver<Control>) -> Result<(), Error> {
        let mut ticker = tokio::time::interval(self.config.interval);
        // A summarization call can outlast several intervals; don't burst
        // catch-up captures afterwards.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Session started: project={}, interval={:?}, batch_size={}",
            self.config.project, self.config.interval, self.config.batch_size
        );

        while self.state != WorkerState::Stopping {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.state == WorkerState::Running {
                        self.capture_tick().await;
                    }
                }
                msg = control.recv() => self.apply_control(msg),
            }
        }

        self.shutdown().await
    }

    fn apply_control(&mut self, msg: Option<Control>) {
        match msg {
            Some(Control::Pause) => {
                if self.state == WorkerState::Running {
                    self.state = WorkerState::Paused;
                    info!(
                        "Capture paused ({} screenshot(s) buffered)",
                        self.batch.len()
                    );
                }
            }
            Some(Control::Resume) => {
                if self.state == WorkerState::Paused {
                    self.state = WorkerState::Running;
                    info!("Capture resumed");
                }
            }
            // A closed channel means every supervisor is gone; treat it
            // as a stop so the session still gets its final summary.
            Some(Control::Stop) | None => {
                self.state = WorkerState::Stopping;
                info!("Stopping: flushing batch and reducing session");
            }
        }
    }

    async fn capture_tick(&mut self) {
        match self.source.capture_one(&self.paths.image_cache) {
            Ok(path) => {
                debug!(
                    "Captured {} ({}/{} in batch)",
                    path.display(),
                    self.batch.len() + 1,
                    self.config.batch_size
                );
                self.batch.push(path);
            }
            Err(e) => {
                warn!("Screen capture failed: {e}");
                return;
            }
        }
        if self.batch.len() >= self.config.batch_size {
            self.flush_batch().await;
        }
    }

    /// Summarize the buffered batch. On success the consumed screenshots
    /// are deleted and the new artifact becomes the chain head; on failure
    /// the batch stays buffered and the session continues.
    async fn flush_batch(&mut self) {
        match summarize_batch(
            &self.client,
            &self.batch,
            &self.paths.summaries,
            self.previous.as_ref(),
        )
        .await
        {
            Ok(id) => {
                for path in self.batch.drain(..) {
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!(
                            "Failed to remove consumed screenshot {}: {e}",
                            path.display()
                        );
                    }
                }
                self.previous = Some(id);
            }
            Err(e) => {
                warn!("Batch summarization failed, keeping batch buffered: {e}");
            }
        }
    }

    async fn shutdown(&mut self) -> Result<(), Error> {
        if !self.batch.is_empty() {
            info!("Flushing {} buffered screenshot(s)", self.batch.len());
            self.flush_batch().await;
        }

        match reduce_session(&self.client, &self.paths.summaries, &self.paths.final_summary).await {
            Ok(path) => info!("Session closed, final summary at {}", path.display()),
            Err(Error::NoData(_)) => info!("No summaries were produced; skipping final summary"),
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use recap_rs::{ChatRequest, HttpResponse};
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Screen source that writes small numbered files and counts captures.
    struct CountingSource {
        captures: Arc<AtomicU32>,
    }

    impl ScreenSource for CountingSource {
        fn capture_one(&self, dir: &Path) -> Result<PathBuf, String> {
            std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
            let n = self.captures.fetch_add(1, Ordering::SeqCst);
            let path = dir.join(format!("shot-{n:04}.png"));
            std::fs::write(&path, b"fake png").map_err(|e| e.to_string())?;
            Ok(path)
        }
    }

    /// Transport answering every request with one fixed status and body.
    struct StaticTransport {
        status: u16,
        body: String,
    }

    impl StaticTransport {
        fn ok(text: &str) -> Self {
            Self {
                status: 200,
                body: serde_json::json!({
                    "choices": [{"message": {"content": text}}]
                })
                .to_string(),
            }
        }

        fn failing() -> Self {
            Self {
                status: 400,
                body: "bad request".into(),
            }
        }
    }

    impl Transport for StaticTransport {
        async fn send(&self, _request: &ChatRequest) -> Result<HttpResponse, String> {
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    struct Harness {
        paths: SessionPaths,
        captures: Arc<AtomicU32>,
        tx: mpsc::Sender<Control>,
        handle: tokio::task::JoinHandle<Result<(), Error>>,
        _dir: tempfile::TempDir,
    }

    fn spawn_controller(batch_size: usize, transport: StaticTransport) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig {
            project: "test".into(),
            save_dir: dir.path().to_path_buf(),
            interval: Duration::from_millis(10),
            batch_size,
            model: None,
        };
        let paths = config.session_paths(chrono::NaiveDate::from_ymd_opt(2026, 8, 4).unwrap());
        let captures = Arc::new(AtomicU32::new(0));
        let source = CountingSource {
            captures: captures.clone(),
        };
        let client = PromptClient::with_transport(transport);

        let (tx, rx) = mpsc::channel(8);
        let controller = Controller::new(config, paths.clone(), client, source);
        let handle = tokio::spawn(controller.run(rx));

        Harness {
            paths,
            captures,
            tx,
            handle,
            _dir: dir,
        }
    }

    fn count_files(dir: &Path, ext: &str) -> usize {
        if !dir.exists() {
            return 0;
        }
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|x| x == ext))
            .count()
    }

    #[tokio::test]
    async fn full_batches_summarize_and_stop_reduces() {
        let h = spawn_controller(2, StaticTransport::ok("- task list"));

        tokio::time::sleep(Duration::from_millis(120)).await;
        h.tx.send(Control::Stop).await.unwrap();
        h.handle.await.unwrap().unwrap();

        assert!(count_files(&h.paths.summaries, "txt") >= 1);
        assert!(h.paths.final_summary.exists());
        assert_eq!(
            std::fs::read_to_string(&h.paths.final_summary).unwrap(),
            "- task list"
        );
        // Consumed screenshots were deleted.
        assert_eq!(count_files(&h.paths.image_cache, "png"), 0);
    }

    #[tokio::test]
    async fn stop_flushes_a_partial_batch_once() {
        // Batch threshold far above what the test will capture.
        let h = spawn_controller(100, StaticTransport::ok("- partial work"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.captures.load(Ordering::SeqCst) >= 1);
        h.tx.send(Control::Stop).await.unwrap();
        h.handle.await.unwrap().unwrap();

        // Exactly one artifact: the shutdown flush.
        assert_eq!(count_files(&h.paths.summaries, "txt"), 1);
        assert!(h.paths.final_summary.exists());
    }

    #[tokio::test]
    async fn pause_halts_capture_and_keeps_the_buffer() {
        let h = spawn_controller(100, StaticTransport::ok("- buffered work"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        h.tx.send(Control::Pause).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let paused_at = h.captures.load(Ordering::SeqCst);
        assert!(paused_at >= 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.captures.load(Ordering::SeqCst), paused_at);

        // The buffered screenshots survive the pause: stopping still
        // flushes them into an artifact.
        h.tx.send(Control::Stop).await.unwrap();
        h.handle.await.unwrap().unwrap();
        assert_eq!(count_files(&h.paths.summaries, "txt"), 1);
    }

    #[tokio::test]
    async fn resume_restarts_capture() {
        let h = spawn_controller(100, StaticTransport::ok("- resumed work"));

        tokio::time::sleep(Duration::from_millis(30)).await;
        h.tx.send(Control::Pause).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let paused_at = h.captures.load(Ordering::SeqCst);

        h.tx.send(Control::Resume).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.captures.load(Ordering::SeqCst) > paused_at);

        h.tx.send(Control::Stop).await.unwrap();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn per_batch_failure_keeps_the_session_alive() {
        let h = spawn_controller(1, StaticTransport::failing());

        tokio::time::sleep(Duration::from_millis(50)).await;
        h.tx.send(Control::Stop).await.unwrap();

        // Every summarization failed, so the shutdown reduce finds no
        // artifacts and the run still ends cleanly.
        h.handle.await.unwrap().unwrap();
        assert_eq!(count_files(&h.paths.summaries, "txt"), 0);
        assert!(!h.paths.final_summary.exists());
        // Failed batches stay buffered; their files were never deleted.
        assert!(count_files(&h.paths.image_cache, "png") >= 1);
    }

    #[tokio::test]
    async fn dropped_supervisors_stop_the_worker() {
        let h = spawn_controller(100, StaticTransport::ok("- orphaned work"));

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(h.tx);

        h.handle.await.unwrap().unwrap();
        assert!(h.paths.final_summary.exists());
    }
}

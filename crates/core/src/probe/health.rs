//! Health probe: periodically runs a fixed transform through the same
//! executor as live traffic and turns the results into a readiness signal.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::metrics::{PROBE_DURATION, PROBE_READY, PROBE_RUNS};
use crate::transform::{TransformExecutor, TransformRequest};

use super::config::ProbeConfig;
use super::error::ProbeError;
use super::state::{ProbeSnapshot, ProbeState, ReadinessState};

/// Runs the self-test transform and tracks readiness.
///
/// Probe runs are serialized: at most one is in flight at any time, whether
/// it was started by the scheduler or by a readiness check.
pub struct HealthProbe {
    config: ProbeConfig,
    executor: Arc<TransformExecutor>,
    state: RwLock<ProbeState>,
    run_lock: Mutex<()>,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl HealthProbe {
    pub fn new(config: ProbeConfig, executor: Arc<TransformExecutor>) -> Self {
        let state = ProbeState::new(
            config.min_consecutive_transforms_before_liveness_check,
            config.max_consecutive_failures_before_unready,
        );
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            executor,
            state: RwLock::new(state),
            run_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            shutdown_tx,
            scheduler: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Current state without running a probe.
    pub async fn snapshot(&self) -> ProbeSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn is_ready(&self) -> bool {
        self.state.read().await.is_ready()
    }

    /// Runs one probe, waiting for any probe already in flight first.
    pub async fn run_once(&self) -> ProbeSnapshot {
        let _guard = self.run_lock.lock().await;
        self.run_locked().await
    }

    /// Readiness check for callers: reuses the last result while it is
    /// younger than the probe interval, otherwise runs a probe.
    pub async fn check_ready(&self) -> ProbeSnapshot {
        let window = self.config.interval();
        {
            let state = self.state.read().await;
            if !state.is_stale(window) {
                return state.snapshot();
            }
        }

        let _guard = self.run_lock.lock().await;
        // A probe may have completed while we waited for the lock.
        {
            let state = self.state.read().await;
            if !state.is_stale(window) {
                return state.snapshot();
            }
        }
        self.run_locked().await
    }

    async fn run_locked(&self) -> ProbeSnapshot {
        let start = Instant::now();
        let result = self.probe_transform().await;
        let elapsed = start.elapsed();

        self.log_timing(elapsed);

        let mut state = self.state.write().await;
        let previous = state.state();
        let current = match &result {
            Ok(()) => {
                PROBE_RUNS.with_label_values(&["passed"]).inc();
                PROBE_DURATION
                    .with_label_values(&["passed"])
                    .observe(elapsed.as_secs_f64());
                state.record_success(elapsed)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    consecutive_failures = state.consecutive_failures() + 1,
                    "Health probe failed"
                );
                PROBE_RUNS.with_label_values(&["failed"]).inc();
                PROBE_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed.as_secs_f64());
                state.record_failure(elapsed, e.to_string())
            }
        };

        if current != previous {
            match current {
                ReadinessState::Warm => info!(
                    from = previous.as_str(),
                    consecutive_successes = state.consecutive_successes(),
                    "Transform engine is ready"
                ),
                ReadinessState::Unready => warn!(
                    from = previous.as_str(),
                    consecutive_failures = state.consecutive_failures(),
                    "Transform engine is not ready"
                ),
                ReadinessState::Cold => {}
            }
        }
        PROBE_READY.set(if state.is_ready() { 1 } else { 0 });

        state.snapshot()
    }

    /// Runs the fixed probe request. Any error counts as a failed probe.
    async fn probe_transform(&self) -> Result<(), ProbeError> {
        let source = &self.config.source_path;
        let meta = tokio::fs::metadata(source)
            .await
            .map_err(|e| ProbeError::SourceUnavailable {
                path: source.clone(),
                source: e,
            })?;
        if meta.len() < self.config.min_expected_source_file_size_bytes {
            return Err(ProbeError::SourceTooSmall {
                actual: meta.len(),
                minimum: self.config.min_expected_source_file_size_bytes,
            });
        }

        let run_dir = self.config.work_dir.join(format!("probe-{}", Uuid::new_v4()));
        let result = self.transform_in(&run_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&run_dir).await {
            debug!(path = %run_dir.display(), error = %e, "Failed to remove probe directory");
        }

        result
    }

    async fn transform_in(&self, run_dir: &Path) -> Result<(), ProbeError> {
        let work_dir_error = |e| ProbeError::WorkDir {
            path: run_dir.to_path_buf(),
            source: e,
        };
        tokio::fs::create_dir_all(run_dir)
            .await
            .map_err(work_dir_error)?;

        // The tool works on a copy so the fixture itself is never touched.
        let source_name = self
            .config
            .source_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "probe_source".into());
        let source_copy = run_dir.join(source_name);
        tokio::fs::copy(&self.config.source_path, &source_copy)
            .await
            .map_err(work_dir_error)?;

        let request = TransformRequest::new(
            self.config.transform_name.clone(),
            source_copy,
            run_dir.join(&self.config.target_file_name),
        )
        .with_mimetypes(
            self.config.source_mimetype.clone(),
            self.config.target_mimetype.clone(),
        )
        .with_options(self.config.options.clone());

        let report = self.executor.run(&request).await?;

        if let Some(expected) = self.config.expected_target_size_bytes {
            let tolerance = self.config.target_size_tolerance_bytes;
            if report.target_size_bytes.abs_diff(expected) > tolerance {
                return Err(ProbeError::UnexpectedTargetSize {
                    actual: report.target_size_bytes,
                    expected,
                    tolerance,
                });
            }
        }

        Ok(())
    }

    fn log_timing(&self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed_ms > self.config.max_time_ms {
            warn!(
                elapsed_ms,
                max_time_ms = self.config.max_time_ms,
                expected_time_ms = self.config.expected_time_ms,
                "Health probe exceeded maximum time"
            );
        } else if elapsed_ms > self.config.response_time_logging_threshold_ms {
            info!(
                elapsed_ms,
                expected_time_ms = self.config.expected_time_ms,
                "Health probe completed"
            );
        } else {
            debug!(elapsed_ms, "Health probe completed");
        }
    }

    /// Starts the periodic scheduler (spawns a background task).
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Health probe scheduler already running");
            return;
        }

        let probe = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.config.interval();

        let handle = tokio::spawn(async move {
            info!(interval_ms = period.as_millis() as u64, "Health probe scheduler started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Health probe scheduler received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !probe.running.load(Ordering::Relaxed) {
                            break;
                        }
                        probe.run_once().await;
                    }
                }
            }
        });

        *self.scheduler.lock().await = Some(handle);
    }

    /// Stops the scheduler and waits for it to exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Health probe scheduler not running");
            return;
        }

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.scheduler.lock().await.take() {
            let _ = handle.await;
        }
        info!("Health probe scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockRunner};
    use crate::transform::{CommandTable, WILDCARD};
    use tempfile::TempDir;

    fn probe_with(
        config: ProbeConfig,
        runner: Arc<MockRunner>,
    ) -> HealthProbe {
        let commands = CommandTable::new().with_command(WILDCARD, ["tool", "{source}", "{target}"]);
        let executor = TransformExecutor::new(commands, runner, Duration::from_secs(5));
        HealthProbe::new(config, Arc::new(executor))
    }

    async fn passing_runner() -> Arc<MockRunner> {
        let runner = Arc::new(MockRunner::new());
        runner.write_target_on_success(b"<html>Hola Probe Test</html>".to_vec()).await;
        runner
    }

    #[tokio::test]
    async fn test_passing_probe_makes_ready() {
        let dir = TempDir::new().unwrap();
        let config = fixtures::probe_config(dir.path()).unwrap();
        let probe = probe_with(config, passing_runner().await);

        assert_eq!(probe.snapshot().await.state, ReadinessState::Cold);
        let snapshot = probe.run_once().await;
        assert_eq!(snapshot.state, ReadinessState::Warm);
        assert!(snapshot.ready);
        assert!(probe.is_ready().await);
    }

    #[tokio::test]
    async fn test_probe_request_uses_fixed_options_and_copy() {
        let dir = TempDir::new().unwrap();
        let config = fixtures::probe_config(dir.path()).unwrap();
        let fixture = config.source_path.clone();
        let runner = passing_runner().await;
        let probe = probe_with(config, runner.clone());

        probe.run_once().await;

        let commands = runner.recorded_commands().await;
        assert_eq!(commands.len(), 1);
        let source_arg = &commands[0].args()[0];
        assert_ne!(Path::new(source_arg), fixture.as_path());
        assert!(source_arg.ends_with("probe_test.txt"));
        // Fixture untouched, per-run directory removed.
        assert_eq!(std::fs::read(&fixture).unwrap(), fixtures::PROBE_SOURCE);
        assert!(!Path::new(source_arg).exists());
    }

    #[tokio::test]
    async fn test_small_source_fails_without_running() {
        let dir = TempDir::new().unwrap();
        let config = ProbeConfig {
            min_expected_source_file_size_bytes: 1024,
            ..fixtures::probe_config(dir.path()).unwrap()
        };
        let runner = passing_runner().await;
        let probe = probe_with(config, runner.clone());

        let snapshot = probe.run_once().await;
        assert_eq!(snapshot.state, ReadinessState::Unready);
        assert!(snapshot.last_probe.unwrap().error.unwrap().contains("at least 1024"));
        assert_eq!(runner.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let config = ProbeConfig {
            source_path: dir.path().join("missing.txt"),
            ..fixtures::probe_config(dir.path()).unwrap()
        };
        let probe = probe_with(config, passing_runner().await);

        assert!(!probe.run_once().await.ready);
    }

    #[tokio::test]
    async fn test_unexpected_output_size_fails() {
        let dir = TempDir::new().unwrap();
        let config = ProbeConfig {
            expected_target_size_bytes: Some(180),
            target_size_tolerance_bytes: 20,
            ..fixtures::probe_config(dir.path()).unwrap()
        };
        let probe = probe_with(config, passing_runner().await);

        let snapshot = probe.run_once().await;
        assert!(!snapshot.ready);
        assert!(snapshot.last_probe.unwrap().error.unwrap().contains("expected 180"));
    }

    #[tokio::test]
    async fn test_output_size_checked_only_when_configured() {
        let dir = TempDir::new().unwrap();
        let unchecked = fixtures::probe_config(dir.path()).unwrap();
        assert_eq!(unchecked.expected_target_size_bytes, None);
        let probe = probe_with(unchecked.clone(), passing_runner().await);
        assert!(probe.run_once().await.ready);

        // The mock writes 28 bytes.
        let within = ProbeConfig {
            expected_target_size_bytes: Some(40),
            target_size_tolerance_bytes: 12,
            ..unchecked
        };
        let probe = probe_with(within, passing_runner().await);
        assert!(probe.run_once().await.ready);
    }

    #[tokio::test]
    async fn test_failures_then_recovery() {
        let dir = TempDir::new().unwrap();
        let config = fixtures::probe_config(dir.path())
            .unwrap()
            .with_thresholds(2, 2);
        let runner = passing_runner().await;
        let probe = probe_with(config, runner.clone());

        probe.run_once().await;
        assert_eq!(probe.run_once().await.state, ReadinessState::Warm);

        runner.set_next_result(1, "invalid input").await;
        runner.set_next_launch_failure().await;
        assert_eq!(probe.run_once().await.state, ReadinessState::Warm);
        assert_eq!(probe.run_once().await.state, ReadinessState::Unready);

        assert_eq!(probe.run_once().await.state, ReadinessState::Unready);
        assert_eq!(probe.run_once().await.state, ReadinessState::Warm);
    }

    #[tokio::test]
    async fn test_check_ready_reuses_fresh_result() {
        let dir = TempDir::new().unwrap();
        let config = ProbeConfig {
            interval_ms: 60_000,
            ..fixtures::probe_config(dir.path()).unwrap()
        };
        let runner = passing_runner().await;
        let probe = probe_with(config, runner.clone());

        assert!(probe.check_ready().await.ready);
        assert!(probe.check_ready().await.ready);
        assert_eq!(runner.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_checks_run_one_probe() {
        let dir = TempDir::new().unwrap();
        let config = ProbeConfig {
            interval_ms: 60_000,
            ..fixtures::probe_config(dir.path()).unwrap()
        };
        let runner = passing_runner().await;
        runner.set_delay(Duration::from_millis(100)).await;
        let probe = Arc::new(probe_with(config, runner.clone()));

        let checks: Vec<_> = (0..5)
            .map(|_| {
                let probe = Arc::clone(&probe);
                tokio::spawn(async move { probe.check_ready().await })
            })
            .collect();
        for check in checks {
            assert!(check.await.unwrap().ready);
        }
        assert_eq!(runner.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_scheduler_start_stop() {
        let dir = TempDir::new().unwrap();
        let config = fixtures::probe_config(dir.path()).unwrap();
        let runner = passing_runner().await;
        let probe = Arc::new(probe_with(config, runner.clone()));

        probe.start().await;
        assert!(probe.is_running());
        tokio::time::sleep(Duration::from_millis(200)).await;
        probe.stop().await;
        assert!(!probe.is_running());

        let runs = runner.call_count().await;
        assert!(runs >= 2, "expected several scheduled runs, got {}", runs);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runner.call_count().await, runs);
        assert!(probe.is_ready().await);
    }
}

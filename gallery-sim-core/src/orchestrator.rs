//! Cycle orchestration across simulated users

use crate::action::ActionExecutor;
use crate::report::StatsReport;
use crate::stats::{StatCounters, StatKey, StatsSnapshot};
use crate::worker::{UserWorker, WorkerReport};
use gallery_sim_config::WorkloadConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Timing and population of a run
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub users: usize,
    pub cycle_duration: Duration,
    /// Unbounded when `None`
    pub max_cycles: Option<u32>,
    pub action_interval: Duration,
    pub inter_cycle_pause: Duration,
    pub seed: Option<u64>,
    /// How long an interrupted run waits for each worker before abandoning it
    pub join_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&WorkloadConfig::default())
    }
}

impl From<&WorkloadConfig> for OrchestratorSettings {
    fn from(workload: &WorkloadConfig) -> Self {
        Self {
            users: workload.users.max(1),
            cycle_duration: workload.cycle_duration,
            max_cycles: workload.max_cycles,
            action_interval: workload.action_interval,
            inter_cycle_pause: workload.inter_cycle_pause,
            seed: workload.seed,
            join_timeout: Duration::from_secs(2),
        }
    }
}

/// Receives the report printed at the end of every cycle
pub type ReportSink = Arc<dyn Fn(&StatsReport) + Send + Sync>;

/// Writes each cycle report to stdout, whatever the log level
pub fn stdout_report_sink() -> ReportSink {
    Arc::new(|report: &StatsReport| println!("\n{}", report))
}

/// How a run ended
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub cycles_completed: u32,
    pub interrupted: bool,
    pub stats: StatsSnapshot,
}

enum CycleEnd {
    Completed(Vec<WorkerReport>),
    Interrupted,
}

/// Runs cycles of concurrent users with a full barrier and a single cleanup
/// between them. Cycles never overlap: the next one starts only after the
/// previous cleanup has returned.
pub struct CycleOrchestrator {
    settings: OrchestratorSettings,
    executor: ActionExecutor,
    rng: StdRng,
    report_sink: ReportSink,
}

impl CycleOrchestrator {
    /// A population of zero is run as a single user
    pub fn new(mut settings: OrchestratorSettings, executor: ActionExecutor) -> Self {
        if settings.users == 0 {
            warn!("User count of 0 requested, running with 1 user");
            settings.users = 1;
        }
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            settings,
            executor,
            rng,
            report_sink: stdout_report_sink(),
        }
    }

    /// Send cycle reports somewhere other than stdout
    pub fn with_report_sink(mut self, sink: ReportSink) -> Self {
        self.report_sink = sink;
        self
    }

    pub fn stats(&self) -> &Arc<StatCounters> {
        self.executor.stats()
    }

    /// Run until `max_cycles` cycles have completed or `shutdown` is
    /// cancelled. Errors inside cycles never end the run.
    pub async fn run(&mut self, shutdown: CancellationToken) -> RunSummary {
        info!(
            users = self.settings.users,
            cycle_duration = ?self.settings.cycle_duration,
            max_cycles = ?self.settings.max_cycles,
            "Starting simulation"
        );

        info!("Initial cleanup before simulation begins");
        self.clear_remote_state().await;

        let mut completed = 0u32;
        let mut interrupted = false;

        loop {
            if matches!(self.settings.max_cycles, Some(max) if completed >= max) {
                info!(max_cycles = completed, "Reached maximum cycles");
                break;
            }
            if shutdown.is_cancelled() {
                interrupted = true;
                break;
            }

            let number = completed + 1;
            let end = if self.settings.users == 1 {
                self.run_inline_cycle(number, &shutdown).await
            } else {
                self.run_concurrent_cycle(number, &shutdown).await
            };

            let reports = match end {
                CycleEnd::Completed(reports) => reports,
                CycleEnd::Interrupted => {
                    interrupted = true;
                    break;
                }
            };
            let actions: u64 = reports.iter().map(|r| r.actions).sum();
            let successes: u64 = reports.iter().map(|r| r.successes).sum();
            info!(cycle = number, users = reports.len(), actions, successes, "All users completed the cycle");

            info!(cycle = number, "Post-cycle cleanup");
            self.cleanup().await;
            completed += 1;

            let last = matches!(self.settings.max_cycles, Some(max) if completed >= max);
            if !last && !self.settings.inter_cycle_pause.is_zero() {
                info!(pause = ?self.settings.inter_cycle_pause, "Pausing between cycles");
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        interrupted = true;
                        break;
                    }
                    _ = sleep(self.settings.inter_cycle_pause) => {}
                }
            }
        }

        if interrupted {
            warn!(cycles_completed = completed, "Simulation stopped by interrupt");
        } else {
            info!(cycles_completed = completed, "Simulation finished");
        }

        RunSummary {
            cycles_completed: completed,
            interrupted,
            stats: self.executor.stats().snapshot(),
        }
    }

    /// Single user: same loop as the concurrent path, run on the
    /// orchestrator's own task.
    async fn run_inline_cycle(&mut self, number: u32, shutdown: &CancellationToken) -> CycleEnd {
        info!(cycle = number, "Starting cycle");
        let cycle_token = shutdown.child_token();
        let deadline = Instant::now() + self.settings.cycle_duration;

        let mut worker = self.new_worker(1);
        let report = worker
            .run_cycle(self.settings.cycle_duration, &cycle_token)
            .instrument(tracing::info_span!("user", user_id = 1))
            .await;

        let end = if self.hold_until(deadline, shutdown).await {
            CycleEnd::Completed(vec![report])
        } else {
            CycleEnd::Interrupted
        };
        cycle_token.cancel();
        end
    }

    /// One task per user. Completion reports arrive over a channel sized to
    /// the population, which acts as a counting barrier.
    async fn run_concurrent_cycle(&mut self, number: u32, shutdown: &CancellationToken) -> CycleEnd {
        let users = self.settings.users;
        info!(cycle = number, users, "Starting cycle");

        let cycle_token = shutdown.child_token();
        let deadline = Instant::now() + self.settings.cycle_duration;
        let (tx, mut rx) = mpsc::channel::<WorkerReport>(users);

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(users);
        for user_id in 1..=users {
            let mut worker = self.new_worker(user_id);
            let token = cycle_token.clone();
            let tx = tx.clone();
            let duration = self.settings.cycle_duration;

            handles.push(tokio::spawn(
                async move {
                    let report = worker.run_cycle(duration, &token).await;
                    // Receiver is gone only when the cycle was abandoned
                    let _ = tx.send(report).await;
                }
                .instrument(tracing::info_span!("user", user_id)),
            ));
        }
        drop(tx);

        info!("Waiting for all users to complete their cycles");
        let mut reports = Vec::with_capacity(users);
        let mut interrupted = false;
        while reports.len() < users {
            tokio::select! {
                report = rx.recv() => match report {
                    Some(report) => reports.push(report),
                    // Every sender dropped early: some worker panicked
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    interrupted = true;
                    break;
                }
            }
        }

        if !interrupted {
            interrupted = !self.hold_until(deadline, shutdown).await;
        }

        // Stops any worker still sleeping; finished workers ignore it
        cycle_token.cancel();

        if interrupted {
            self.drain_workers(handles).await;
            return CycleEnd::Interrupted;
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("User task failed: {}", e);
            }
        }
        if reports.len() < users {
            warn!(
                reported = reports.len(),
                users, "Some users did not report completion"
            );
        }

        reports.sort_by_key(|r| r.user_id);
        CycleEnd::Completed(reports)
    }

    fn new_worker(&mut self, user_id: usize) -> UserWorker {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        UserWorker::new(
            user_id,
            self.executor.clone(),
            rng,
            self.settings.action_interval,
        )
    }

    /// Keep the cycle window open until its deadline so a cycle never ends
    /// early. Returns `false` when interrupted.
    async fn hold_until(&self, deadline: Instant, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = sleep_until(deadline) => true,
        }
    }

    /// Join live workers with a bounded wait each, abandoning stragglers
    async fn drain_workers(&self, handles: Vec<JoinHandle<()>>) {
        for mut handle in handles {
            if handle.is_finished() {
                continue;
            }
            match timeout(self.settings.join_timeout, &mut handle).await {
                Ok(Err(e)) => error!("User task failed: {}", e),
                Ok(Ok(())) => {}
                Err(_) => {
                    warn!(timeout = ?self.settings.join_timeout, "User did not stop in time, aborting");
                    handle.abort();
                }
            }
        }
    }

    /// Clear the remote repository and reset the local mirrors of its state.
    /// The local gauges are reset even when the clear request fails.
    async fn clear_remote_state(&self) -> bool {
        let cleared = match self.executor.clear_repository().await {
            Ok(()) => {
                info!("Repository cleared");
                true
            }
            Err(e) => {
                error!("Repository clear failed: {}", e);
                false
            }
        };

        let stats = self.executor.stats();
        stats.set(StatKey::RepositorySize, 0);
        stats.set(StatKey::SuccessfulUploadsInCycle, 0);
        cleared
    }

    /// End-of-cycle cleanup: clear, count the cycle, hand a report to the
    /// sink. Safe to call repeatedly.
    pub async fn cleanup(&self) -> bool {
        let cleared = self.clear_remote_state().await;
        self.executor.stats().increment(StatKey::CyclesCompleted, 1);

        let report = self.report("Cycle statistics");
        (self.report_sink)(&report);
        cleared
    }

    pub fn report(&self, title: &str) -> StatsReport {
        StatsReport::new(
            title,
            self.executor.stats().snapshot(),
            self.executor.transport().pool_stats(),
        )
    }
}

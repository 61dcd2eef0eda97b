//! One simulated user

use crate::action::ActionExecutor;
use rand::rngs::StdRng;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What a worker did during one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerReport {
    pub user_id: usize,
    pub actions: u64,
    pub successes: u64,
    pub elapsed: Duration,
    /// Whether the worker stopped because the cycle was cancelled
    pub cancelled: bool,
}

/// Runs actions back to back, one interval apart, until the cycle deadline
/// gets closer than one interval or the cycle is cancelled.
///
/// Cancellation is only observed between actions and while sleeping; an
/// in-flight request always completes or times out first.
pub struct UserWorker {
    user_id: usize,
    executor: ActionExecutor,
    rng: StdRng,
    action_interval: Duration,
}

impl UserWorker {
    pub fn new(user_id: usize, executor: ActionExecutor, rng: StdRng, action_interval: Duration) -> Self {
        Self {
            user_id,
            executor,
            rng,
            action_interval,
        }
    }

    /// Run one cycle of `duration`. The worker never touches shared remote
    /// state beyond its own actions; cleanup belongs to the orchestrator.
    pub async fn run_cycle(&mut self, duration: Duration, cancel: &CancellationToken) -> WorkerReport {
        let started = Instant::now();
        let deadline = started + duration;
        let mut actions = 0u64;
        let mut successes = 0u64;
        let mut cancelled = false;

        debug!(
            user_id = self.user_id,
            ?duration,
            expected_actions = expected_actions(duration, self.action_interval),
            "Cycle started"
        );

        while Instant::now() < deadline {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let outcome = self.executor.execute(&mut self.rng).await;
            actions += 1;
            if outcome.success {
                successes += 1;
            }
            debug!(
                user_id = self.user_id,
                action = actions,
                kind = %outcome.kind,
                success = outcome.success,
                "Action finished"
            );

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining <= self.action_interval {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = sleep(self.action_interval) => {}
            }
        }

        let report = WorkerReport {
            user_id: self.user_id,
            actions,
            successes,
            elapsed: started.elapsed(),
            cancelled,
        };

        info!(
            user_id = report.user_id,
            actions = report.actions,
            successes = report.successes,
            elapsed = ?report.elapsed,
            cancelled = report.cancelled,
            "Cycle completed"
        );

        report
    }
}

fn expected_actions(duration: Duration, interval: Duration) -> u64 {
    if interval.is_zero() {
        return 0;
    }
    (duration.as_secs_f64() / interval.as_secs_f64()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_actions() {
        assert_eq!(expected_actions(Duration::from_secs(10), Duration::from_secs(1)), 10);
        assert_eq!(expected_actions(Duration::from_secs(10), Duration::from_secs(3)), 3);
        assert_eq!(expected_actions(Duration::from_secs(10), Duration::ZERO), 0);
    }
}

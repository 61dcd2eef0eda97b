//! Cycle orchestration on a paused clock

mod common;

use common::{executor, image_dir, path_of, response, FakeTransport};
use gallery_sim_core::{
    CycleOrchestrator, ImageCatalog, OrchestratorSettings, ReportSink, StatKey, StatsReport,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Sink that keeps every report it receives as rendered text
fn collecting_sink() -> (ReportSink, Arc<Mutex<Vec<String>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::clone(&reports);
    let sink: ReportSink = Arc::new(move |report: &StatsReport| {
        store.lock().push(report.to_string());
    });
    (sink, reports)
}

fn settings(users: usize, max_cycles: Option<u32>) -> OrchestratorSettings {
    OrchestratorSettings {
        users,
        cycle_duration: Duration::from_secs(5),
        max_cycles,
        action_interval: Duration::from_secs(1),
        inter_cycle_pause: Duration::ZERO,
        seed: Some(42),
        join_timeout: Duration::from_secs(2),
    }
}

#[tokio::test(start_paused = true)]
async fn test_empty_image_dir_makes_no_action_requests() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), ImageCatalog::default(), 1.0);
    let mut orchestrator = CycleOrchestrator::new(settings(3, Some(1)), executor);

    let summary = orchestrator.run(CancellationToken::new()).await;

    assert_eq!(summary.cycles_completed, 1);
    assert!(!summary.interrupted);
    assert!(transport.action_paths().is_empty());
    // Startup clear plus one cleanup
    assert_eq!(transport.clear_count(), 2);

    let stats = summary.stats;
    assert!(stats.uploads_attempted > 0);
    assert_eq!(stats.uploads_successful, 0);
    assert_eq!(stats.uploads_attempted, stats.uploads_failed);
    assert_eq!(stats.repository_size, 0);
    assert_eq!(stats.cycles_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_lasts_at_least_its_duration() {
    let (_dir, catalog) = image_dir(2);
    let transport = FakeTransport::accepting();
    let executor = executor(transport, catalog, 0.5);
    let mut orchestrator = CycleOrchestrator::new(settings(4, Some(1)), executor);

    let started = Instant::now();
    orchestrator.run(CancellationToken::new()).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(5), "cycle ended early: {:?}", elapsed);
    assert!(elapsed <= Duration::from_secs(6), "cycle overran: {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_cycles_are_separated_by_pause() {
    let (_dir, catalog) = image_dir(2);
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), catalog, 0.5);
    let mut config = settings(2, Some(3));
    config.inter_cycle_pause = Duration::from_secs(12);
    let mut orchestrator = CycleOrchestrator::new(config, executor);

    let started = Instant::now();
    let summary = orchestrator.run(CancellationToken::new()).await;
    let elapsed = started.elapsed();

    assert_eq!(summary.cycles_completed, 3);
    assert_eq!(summary.stats.cycles_completed, 3);
    assert_eq!(transport.clear_count(), 4);
    // Three cycles and two pauses; no pause after the last cycle
    assert!(elapsed >= Duration::from_secs(39));
    assert!(elapsed < Duration::from_secs(40));
}

#[tokio::test(start_paused = true)]
async fn test_single_user_runs_inline() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), ImageCatalog::default(), 0.0);
    let mut orchestrator = CycleOrchestrator::new(settings(1, Some(1)), executor);

    let summary = orchestrator.run(CancellationToken::new()).await;

    // Actions at 0s..4s; at 4s less than one interval remains
    assert_eq!(summary.stats.total_actions, 5);
    assert_eq!(summary.stats.browse_requests, 5);
    assert!(transport.action_paths().is_empty());
    assert_eq!(summary.cycles_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_seeded_runs_repeat() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let (_dir, catalog) = image_dir(3);
        let transport = FakeTransport::accepting();
        let executor = executor(transport.clone(), catalog, 0.5);
        let mut orchestrator = CycleOrchestrator::new(settings(1, Some(2)), executor);
        orchestrator.run(CancellationToken::new()).await;

        let requests: Vec<(String, Option<String>)> = transport
            .requests()
            .iter()
            .map(|r| (path_of(r), r.query_value("page").map(String::from)))
            .collect();
        runs.push(requests);
    }

    assert!(!runs[0].is_empty());
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_pause_stops_the_run() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), ImageCatalog::default(), 0.0);
    let mut config = settings(2, None);
    config.inter_cycle_pause = Duration::from_secs(12);
    let mut orchestrator = CycleOrchestrator::new(config, executor);

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let summary = orchestrator.run(shutdown).await;

    assert!(summary.interrupted);
    assert_eq!(summary.cycles_completed, 1);
    assert_eq!(transport.clear_count(), 2);
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_mid_cycle_skips_cleanup() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), ImageCatalog::default(), 0.0);
    let mut orchestrator = CycleOrchestrator::new(settings(3, None), executor);

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        trigger.cancel();
    });

    let summary = orchestrator.run(shutdown).await;

    assert!(summary.interrupted);
    assert_eq!(summary.cycles_completed, 0);
    assert_eq!(summary.stats.cycles_completed, 0);
    // Only the startup clear happened
    assert_eq!(transport.clear_count(), 1);
}

#[tokio::test]
async fn test_cleanup_resets_gauges_and_is_idempotent() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), ImageCatalog::default(), 0.0);
    let orchestrator = CycleOrchestrator::new(settings(2, Some(1)), executor);
    let stats = Arc::clone(orchestrator.stats());

    stats.set(StatKey::RepositorySize, 7);
    stats.set(StatKey::SuccessfulUploadsInCycle, 3);
    stats.set(StatKey::UploadsSuccessful, 3);

    assert!(orchestrator.cleanup().await);
    assert_eq!(stats.get(StatKey::RepositorySize), 0);
    assert_eq!(stats.get(StatKey::SuccessfulUploadsInCycle), 0);

    assert!(orchestrator.cleanup().await);
    assert_eq!(stats.get(StatKey::RepositorySize), 0);
    assert_eq!(stats.get(StatKey::SuccessfulUploadsInCycle), 0);

    // Run totals survive cleanup
    assert_eq!(stats.get(StatKey::UploadsSuccessful), 3);
    assert_eq!(stats.get(StatKey::CyclesCompleted), 2);
    assert_eq!(transport.clear_count(), 2);
}

#[tokio::test]
async fn test_failed_clear_still_resets_local_state() {
    let transport = FakeTransport::new(|request| {
        if path_of(request) == "/admin/clear-repository" {
            Ok(response(500, b"boom"))
        } else {
            Ok(response(200, b""))
        }
    });
    let executor = executor(transport, ImageCatalog::default(), 0.0);
    let orchestrator = CycleOrchestrator::new(settings(2, Some(1)), executor);
    orchestrator.stats().set(StatKey::RepositorySize, 12);

    assert!(!orchestrator.cleanup().await);
    assert_eq!(orchestrator.stats().get(StatKey::RepositorySize), 0);
    assert_eq!(orchestrator.stats().get(StatKey::CyclesCompleted), 1);
}

#[tokio::test(start_paused = true)]
async fn test_every_cycle_emits_a_report() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport, ImageCatalog::default(), 0.0);
    let (sink, reports) = collecting_sink();
    let mut orchestrator =
        CycleOrchestrator::new(settings(2, Some(2)), executor).with_report_sink(sink);

    orchestrator.run(CancellationToken::new()).await;

    let reports = reports.lock();
    assert_eq!(reports.len(), 2);
    assert!(reports[0].starts_with("Cycle statistics"));
    assert!(reports[0].ends_with("Cycles completed: 1"));
    assert!(reports[1].ends_with("Cycles completed: 2"));
}

#[tokio::test]
async fn test_cycle_report_ignores_log_level() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = FakeTransport::accepting();
    let executor = executor(transport, ImageCatalog::default(), 0.0);
    let (sink, reports) = collecting_sink();
    let orchestrator =
        CycleOrchestrator::new(settings(2, Some(1)), executor).with_report_sink(sink);

    orchestrator.cleanup().await;

    let reports = reports.lock();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("Total actions: 0"));
    assert!(reports[0].ends_with("Cycles completed: 1"));
}

#[tokio::test(start_paused = true)]
async fn test_zero_users_runs_as_single_user() {
    let transport = FakeTransport::accepting();
    let executor = executor(transport.clone(), ImageCatalog::default(), 0.0);
    let mut orchestrator = CycleOrchestrator::new(settings(0, Some(1)), executor);

    let summary = orchestrator.run(CancellationToken::new()).await;

    assert_eq!(summary.cycles_completed, 1);
    assert_eq!(summary.stats.total_actions, 5);
    assert_eq!(transport.clear_count(), 2);
}

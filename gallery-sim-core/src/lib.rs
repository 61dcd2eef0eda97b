//! Simulation core for the gallery load simulator
//!
//! A run is a sequence of cycles. In each cycle every simulated user
//! ([`UserWorker`]) repeatedly performs an action ([`ActionExecutor`]):
//! either an image upload or a gallery browse that downloads every image on
//! the page. The [`CycleOrchestrator`] waits for all users to finish, clears
//! the remote repository once, reports, pauses and starts the next cycle.
//! All users share one transport and one set of [`StatCounters`].

pub mod action;
pub mod error;
pub mod images;
pub mod links;
pub mod orchestrator;
pub mod report;
pub mod stats;
pub mod worker;

// Re-export main types
pub use action::{ActionExecutor, ActionKind, ActionOutcome, Endpoints, UPLOAD_ACCEPTED};
pub use error::{SimulationError, SimulationResult};
pub use images::ImageCatalog;
pub use links::{ImageLinkExtractor, LinkError, RegexLinkExtractor};
pub use orchestrator::{
    stdout_report_sink, CycleOrchestrator, OrchestratorSettings, ReportSink, RunSummary,
};
pub use report::StatsReport;
pub use stats::{available_pages, StatCounters, StatKey, StatsSnapshot, TimingKey, PAGE_SIZE};
pub use worker::{UserWorker, WorkerReport};

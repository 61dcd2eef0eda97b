//! Logging initialization for the gallery load simulator
//!
//! Every crate in the workspace logs through `tracing` (or `log`, which the
//! subscriber installed here also captures). The binary calls
//! `init_logging_from_config` once at startup.

pub mod init;

pub use gallery_sim_config::domains::logging::{LogFormat, LogLevel, LoggingConfig};
pub use init::{build_env_filter, init_logging_from_config};

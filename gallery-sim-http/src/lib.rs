//! HTTP plumbing for the gallery load simulator
//!
//! All simulated users share one [`ConnectionPool`]: a keep-alive
//! `reqwest` client with a bounded idle pool, default headers, and a
//! status/transport-error retry policy with exponential backoff. The core
//! depends only on the [`HttpTransport`] trait so tests can substitute an
//! in-process fake.

pub mod config;
pub mod errors;
pub mod pool;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::ConnectionPoolConfig;
pub use errors::HttpError;
pub use pool::ConnectionPool;
pub use transport::{HttpTransport, PoolStats};
pub use types::{HttpMethod, PoolRequest, PoolResponse, RequestBody, UploadPart};

//! Transport seam between the simulation core and the network

use crate::errors::HttpError;
use crate::types::{PoolRequest, PoolResponse};
use serde::Serialize;

/// Snapshot of pool configuration and usage for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub max_retries: u32,
    pub backoff_factor: f64,
    /// Requests put on the wire, retries included
    pub requests_sent: u64,
    pub retries_performed: u64,
    pub closed: bool,
}

/// Something that can carry a request to the gallery service.
///
/// Implementations must be safe to share between every simulated user
/// without external locking.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: PoolRequest) -> Result<PoolResponse, HttpError>;

    /// Pool configuration and usage, when the transport is pooled
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

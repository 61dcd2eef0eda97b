//! Shared connection pool

use crate::config::ConnectionPoolConfig;
use crate::errors::HttpError;
use crate::transport::{HttpTransport, PoolStats};
use crate::types::{PoolRequest, PoolResponse, RequestBody};
use gallery_sim_resilience::{RetryError, RetryExecutor};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static SHARED_POOL: OnceCell<Arc<ConnectionPool>> = OnceCell::new();

/// Keep-alive connection pool shared by every simulated user.
///
/// `reqwest::Client` synchronizes its own connection reuse; the lock here
/// only guards the handle so `close` can drop it exactly once.
pub struct ConnectionPool {
    config: ConnectionPoolConfig,
    client: RwLock<Option<Client>>,
    retry: RetryExecutor,
    closed: AtomicBool,
    requests_sent: AtomicU64,
    retries_performed: AtomicU64,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConnectionPool {
    /// Build a pool owned by the caller
    pub fn new(config: ConnectionPoolConfig) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        // Redirects are reported to the caller; an upload answered with
        // 302/303 counts as accepted.
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .pool_max_idle_per_host(config.capacity)
            .pool_idle_timeout(config.idle_timeout)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        info!(
            capacity = config.capacity,
            max_retries = config.max_retries,
            backoff_factor = config.backoff_factor,
            "Connection pool initialized"
        );

        Ok(Self {
            retry: RetryExecutor::new(config.retry_policy()),
            config,
            client: RwLock::new(Some(client)),
            closed: AtomicBool::new(false),
            requests_sent: AtomicU64::new(0),
            retries_performed: AtomicU64::new(0),
        })
    }

    /// Process-wide pool. The first call creates it; later calls return the
    /// same instance and ignore their configuration.
    pub fn shared(config: ConnectionPoolConfig) -> Result<Arc<Self>, HttpError> {
        let pool = SHARED_POOL.get_or_try_init(|| Self::new(config.clone()).map(Arc::new))?;
        if pool.config.capacity != config.capacity
            || pool.config.max_retries != config.max_retries
            || pool.config.backoff_factor != config.backoff_factor
        {
            debug!("Shared connection pool already exists, keeping its configuration");
        }
        Ok(Arc::clone(pool))
    }

    pub fn config(&self) -> &ConnectionPoolConfig {
        &self.config
    }

    /// Handle to the underlying client
    pub fn client(&self) -> Result<Client, HttpError> {
        self.client.read().clone().ok_or(HttpError::PoolClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Release pooled connections. Returns `true` for the call that actually
    /// closed the pool; later calls do nothing.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        // Connections are released once in-flight requests drop their clones
        self.client.write().take();
        info!(
            requests_sent = self.requests_sent.load(Ordering::Relaxed),
            "Connection pool closed"
        );
        true
    }

    async fn send_once(
        &self,
        client: &Client,
        request: &PoolRequest,
        retry_eligible: bool,
    ) -> Result<PoolResponse, HttpError> {
        let started = Instant::now();
        self.requests_sent.fetch_add(1, Ordering::Relaxed);

        let mut builder = client
            .request(request.method.into(), &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let RequestBody::Multipart(upload) = &request.body {
            // Form bodies are consumed by send, so every attempt rebuilds one
            let part = Part::bytes(upload.bytes.clone())
                .file_name(upload.file_name.clone())
                .mime_str(&upload.content_type)?;
            builder = builder.multipart(Form::new().part(upload.field_name.clone(), part));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::from_transport(e, retry_eligible))?;

        let status = response.status().as_u16();
        if retry_eligible && self.config.retry_statuses.contains(&status) {
            return Err(HttpError::RetryableStatus {
                status,
                retry_after: retry_after(response.headers()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::from_transport(e, retry_eligible))?;

        Ok(PoolResponse {
            status,
            body: body.to_vec(),
            elapsed: started.elapsed(),
        })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ConnectionPool {
    async fn send(&self, request: PoolRequest) -> Result<PoolResponse, HttpError> {
        let client = self.client()?;
        let retry_eligible = self.config.retry_methods.contains(&request.method);
        let request = &request;

        debug!(method = %request.method, url = %request.url, "Sending request");

        let result = self
            .retry
            .execute_with_context(|attempt| {
                let client = client.clone();
                async move {
                    if attempt > 1 {
                        self.retries_performed.fetch_add(1, Ordering::Relaxed);
                    }
                    self.send_once(&client, request, retry_eligible).await
                }
            })
            .await;

        result.map_err(|err| match err {
            RetryError::MaxAttemptsExceeded {
                attempts,
                last_error,
            } => {
                warn!(url = %request.url, attempts, "Request failed after retries: {}", last_error);
                HttpError::RetriesExhausted {
                    attempts,
                    last_error: Box::new(last_error),
                }
            }
            RetryError::NonRetryableError(error) => error,
        })
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(PoolStats {
            capacity: self.config.capacity,
            max_retries: self.config.max_retries,
            backoff_factor: self.config.backoff_factor,
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            retries_performed: self.retries_performed.load(Ordering::Relaxed),
            closed: self.is_closed(),
        })
    }
}

/// `Retry-After` in delta-seconds form
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

//! One simulated user action: an upload, or a gallery browse that
//! downloads every image on the page

use crate::error::{SimulationError, SimulationResult};
use crate::images::ImageCatalog;
use crate::links::ImageLinkExtractor;
use crate::stats::{available_pages, StatCounters, StatKey, TimingKey};
use gallery_sim_config::TargetConfig;
use gallery_sim_http::{HttpTransport, PoolRequest, UploadPart};
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Statuses meaning the service accepted an upload. The service redirects
/// back to the gallery after storing the file.
pub const UPLOAD_ACCEPTED: &[u16] = &[200, 302, 303];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Upload,
    Browse,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Upload => f.write_str("UPLOAD"),
            ActionKind::Browse => f.write_str("BROWSE"),
        }
    }
}

/// Result of one action, already folded into the shared counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub success: bool,
    /// Bytes received (browse) or sent (upload)
    pub bytes: Option<u64>,
    pub elapsed: Option<Duration>,
}

impl ActionOutcome {
    fn failed(kind: ActionKind) -> Self {
        Self {
            kind,
            success: false,
            bytes: None,
            elapsed: None,
        }
    }
}

/// Resolved service addresses and per-request timeouts
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub base: Url,
    pub upload: Url,
    pub gallery: Url,
    pub clear: Url,
    pub upload_timeout: Duration,
    pub page_timeout: Duration,
    pub image_timeout: Duration,
    pub clear_timeout: Duration,
}

impl Endpoints {
    pub fn from_target(target: &TargetConfig) -> SimulationResult<Self> {
        let invalid = |source| SimulationError::InvalidBaseUrl {
            url: target.base_url.clone(),
            source,
        };
        let base = Url::parse(&target.base_url).map_err(invalid)?;

        Ok(Self {
            upload: base.join("/upload").map_err(invalid)?,
            gallery: base.join("/").map_err(invalid)?,
            clear: base.join("/admin/clear-repository").map_err(invalid)?,
            base,
            upload_timeout: target.upload_timeout,
            page_timeout: target.page_timeout,
            image_timeout: target.image_timeout,
            clear_timeout: target.clear_timeout,
        })
    }
}

/// Stateless action logic shared by all workers. Cloning is cheap; every
/// clone talks to the same transport and counters.
#[derive(Clone)]
pub struct ActionExecutor {
    transport: Arc<dyn HttpTransport>,
    stats: Arc<StatCounters>,
    catalog: Arc<ImageCatalog>,
    extractor: Arc<dyn ImageLinkExtractor>,
    endpoints: Arc<Endpoints>,
    upload_probability: f64,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("endpoints", &self.endpoints)
            .field("images", &self.catalog.len())
            .field("upload_probability", &self.upload_probability)
            .finish()
    }
}

impl ActionExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        stats: Arc<StatCounters>,
        catalog: Arc<ImageCatalog>,
        extractor: Arc<dyn ImageLinkExtractor>,
        endpoints: Endpoints,
        upload_probability: f64,
    ) -> Self {
        Self {
            transport,
            stats,
            catalog,
            extractor,
            endpoints: Arc::new(endpoints),
            upload_probability: upload_probability.clamp(0.0, 1.0),
        }
    }

    pub fn stats(&self) -> &Arc<StatCounters> {
        &self.stats
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Draw an action kind and run it. Never fails: errors become failed
    /// outcomes and are counted.
    pub async fn execute<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> ActionOutcome {
        self.stats.increment(StatKey::TotalActions, 1);

        if rng.gen::<f64>() < self.upload_probability {
            self.upload(rng).await
        } else {
            self.browse(rng).await
        }
    }

    /// Upload one randomly chosen local image
    pub async fn upload<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> ActionOutcome {
        let Some(path) = self.catalog.pick(rng) else {
            warn!("{}", SimulationError::NoImages);
            self.stats
                .increment_all(&[StatKey::UploadsAttempted, StatKey::UploadsFailed]);
            return ActionOutcome::failed(ActionKind::Upload);
        };

        let started = Instant::now();
        match self.send_upload(path).await {
            Ok(bytes) => {
                let elapsed = started.elapsed();
                self.stats.increment_all(&[
                    StatKey::UploadsAttempted,
                    StatKey::UploadsSuccessful,
                    StatKey::SuccessfulUploadsInCycle,
                    StatKey::RepositorySize,
                ]);
                self.stats.add_duration(TimingKey::Upload, elapsed);
                info!(image = %display_name(path), "Upload successful");
                ActionOutcome {
                    kind: ActionKind::Upload,
                    success: true,
                    bytes: Some(bytes),
                    elapsed: Some(elapsed),
                }
            }
            Err(e) => {
                self.stats
                    .increment_all(&[StatKey::UploadsAttempted, StatKey::UploadsFailed]);
                warn!(image = %display_name(path), "Upload failed: {}", e);
                ActionOutcome {
                    elapsed: Some(started.elapsed()),
                    ..ActionOutcome::failed(ActionKind::Upload)
                }
            }
        }
    }

    async fn send_upload(&self, path: &Path) -> SimulationResult<u64> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SimulationError::ImageRead {
                path: path.to_path_buf(),
                source,
            })?;
        let size = bytes.len() as u64;

        debug!(image = %display_name(path), size, "Uploading");
        let request = PoolRequest::post(self.endpoints.upload.as_str())
            .with_timeout(self.endpoints.upload_timeout)
            .with_multipart(UploadPart {
                field_name: "file".to_string(),
                file_name: display_name(path),
                content_type: "image/jpeg".to_string(),
                bytes,
            });

        let response = self.transport.send(request).await?;
        if UPLOAD_ACCEPTED.contains(&response.status) {
            Ok(size)
        } else {
            Err(SimulationError::UnexpectedStatus {
                status: response.status,
                url: self.endpoints.upload.to_string(),
            })
        }
    }

    /// Fetch a random gallery page, then every same-origin image on it.
    /// An empty gallery counts as a successful browse.
    pub async fn browse<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> ActionOutcome {
        let pages = available_pages(self.stats.get(StatKey::RepositorySize));
        let Some(page) = pages.clone().choose(rng) else {
            debug!("No pages available to browse yet");
            self.stats.increment(StatKey::BrowseRequests, 1);
            return ActionOutcome {
                kind: ActionKind::Browse,
                success: true,
                bytes: Some(0),
                elapsed: Some(Duration::ZERO),
            };
        };

        debug!(page, available = pages.end, "Browsing gallery page");
        let started = Instant::now();
        let result = self.browse_page(page).await;

        match result {
            Ok(bytes) => {
                self.stats.increment(StatKey::BrowseRequests, 1);
                ActionOutcome {
                    kind: ActionKind::Browse,
                    success: true,
                    bytes: Some(bytes),
                    elapsed: Some(started.elapsed()),
                }
            }
            Err(e) => {
                self.stats
                    .increment_all(&[StatKey::BrowseRequests, StatKey::BrowseFailures]);
                warn!(page, "Browse failed: {}", e);
                ActionOutcome {
                    elapsed: Some(started.elapsed()),
                    ..ActionOutcome::failed(ActionKind::Browse)
                }
            }
        }
    }

    /// Returns the total bytes received for the page and its images
    async fn browse_page(&self, page: u64) -> SimulationResult<u64> {
        let request = PoolRequest::get(self.endpoints.gallery.as_str())
            .with_query("page", page)
            .with_timeout(self.endpoints.page_timeout);

        let started = Instant::now();
        let response = self.transport.send(request).await?;
        let elapsed = started.elapsed();

        if !response.is_ok() {
            return Err(SimulationError::UnexpectedStatus {
                status: response.status,
                url: format!("{}?page={}", self.endpoints.gallery, page),
            });
        }

        let html_size = response.body.len() as u64;
        self.stats.record_download(
            StatKey::HtmlPagesFetched,
            TimingKey::HtmlDownload,
            html_size,
            elapsed,
        );
        debug!(page, bytes = html_size, ?elapsed, "Page downloaded");

        let images = self
            .extractor
            .extract(&response.body, &self.endpoints.base)?;
        if images.is_empty() {
            debug!(page, "No images found on page");
            return Ok(html_size);
        }

        debug!(page, count = images.len(), "Downloading page images");
        let mut total = html_size;
        for image in &images {
            total += self.download_image(image).await;
        }

        Ok(total)
    }

    /// Download one image, recording the outcome. Returns bytes received.
    async fn download_image(&self, url: &Url) -> u64 {
        let request = PoolRequest::get(url.as_str()).with_timeout(self.endpoints.image_timeout);

        let started = Instant::now();
        match self.transport.send(request).await {
            Ok(response) if response.is_ok() => {
                let size = response.body.len() as u64;
                let elapsed = started.elapsed();
                self.stats.record_download(
                    StatKey::ImagesDownloaded,
                    TimingKey::ImageDownload,
                    size,
                    elapsed,
                );
                debug!(url = %url, bytes = size, ?elapsed, "Image downloaded");
                size
            }
            Ok(response) => {
                self.stats.increment(StatKey::ImageDownloadFailures, 1);
                warn!(url = %url, status = response.status, "Image download failed");
                0
            }
            Err(e) => {
                self.stats.increment(StatKey::ImageDownloadFailures, 1);
                warn!(url = %url, "Image download error: {}", e);
                0
            }
        }
    }

    /// Ask the service to drop every stored image
    pub async fn clear_repository(&self) -> SimulationResult<()> {
        let request =
            PoolRequest::post(self.endpoints.clear.as_str()).with_timeout(self.endpoints.clear_timeout);

        let response = self.transport.send(request).await?;
        if response.is_ok() {
            Ok(())
        } else {
            Err(SimulationError::UnexpectedStatus {
                status: response.status,
                url: self.endpoints.clear.to_string(),
            })
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

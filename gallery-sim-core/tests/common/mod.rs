//! In-process transport fake shared by the integration tests

#![allow(dead_code)]

use gallery_sim_config::TargetConfig;
use gallery_sim_core::{
    ActionExecutor, Endpoints, ImageCatalog, RegexLinkExtractor, StatCounters,
};
use gallery_sim_http::{HttpError, HttpMethod, HttpTransport, PoolRequest, PoolResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "http://gallery.test";

type Responder = dyn Fn(&PoolRequest) -> Result<PoolResponse, HttpError> + Send + Sync;

/// Records every request and answers from a closure, without touching the
/// network
pub struct FakeTransport {
    requests: Mutex<Vec<PoolRequest>>,
    responder: Box<Responder>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&PoolRequest) -> Result<PoolResponse, HttpError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Accepts uploads, clears, and serves empty pages
    pub fn accepting() -> Arc<Self> {
        Self::new(|request| {
            if path_of(request) == "/upload" {
                Ok(response(303, b""))
            } else {
                Ok(response(200, b""))
            }
        })
    }

    pub fn requests(&self) -> Vec<PoolRequest> {
        self.requests.lock().clone()
    }

    /// Paths of every request except repository clears
    pub fn action_paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(path_of)
            .filter(|path| path != "/admin/clear-repository")
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == HttpMethod::Post && path_of(r) == "/admin/clear-repository")
            .count()
    }

    /// `page` query values of every gallery fetch
    pub fn pages_requested(&self) -> Vec<u64> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.query_value("page"))
            .map(|page| page.parse().unwrap())
            .collect()
    }
}

#[async_trait::async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: PoolRequest) -> Result<PoolResponse, HttpError> {
        self.requests.lock().push(request.clone());
        (self.responder)(&request)
    }
}

pub fn path_of(request: &PoolRequest) -> String {
    Url::parse(&request.url).unwrap().path().to_string()
}

pub fn response(status: u16, body: &[u8]) -> PoolResponse {
    PoolResponse {
        status,
        body: body.to_vec(),
        elapsed: Duration::ZERO,
    }
}

pub fn endpoints(base_url: &str) -> Endpoints {
    Endpoints::from_target(&TargetConfig {
        base_url: base_url.to_string(),
        ..TargetConfig::default()
    })
    .unwrap()
}

pub fn executor(
    transport: Arc<dyn HttpTransport>,
    catalog: ImageCatalog,
    upload_probability: f64,
) -> ActionExecutor {
    executor_for(transport, catalog, upload_probability, BASE_URL)
}

pub fn executor_for(
    transport: Arc<dyn HttpTransport>,
    catalog: ImageCatalog,
    upload_probability: f64,
    base_url: &str,
) -> ActionExecutor {
    ActionExecutor::new(
        transport,
        Arc::new(StatCounters::new()),
        Arc::new(catalog),
        Arc::new(RegexLinkExtractor::new().unwrap()),
        endpoints(base_url),
        upload_probability,
    )
}

/// A directory holding `count` small JPEG-looking files
pub fn image_dir(count: usize) -> (tempfile::TempDir, ImageCatalog) {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..count {
        std::fs::write(dir.path().join(format!("image-{}.jpg", i)), [0xFF, 0xD8, 0xFF, 0xE0, i as u8]).unwrap();
    }
    let catalog = ImageCatalog::scan(dir.path()).unwrap();
    (dir, catalog)
}

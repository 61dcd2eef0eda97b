//! Local images available for upload

use crate::error::{SimulationError, SimulationResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Image files found in the images directory at startup.
/// Read-only afterwards, so every worker shares one catalog.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    images: Vec<PathBuf>,
}

impl ImageCatalog {
    /// Scan `dir` (not recursively) for image files
    pub fn scan(dir: &Path) -> SimulationResult<Self> {
        let scan_error = |source| SimulationError::ImageScan {
            path: dir.to_path_buf(),
            source,
        };

        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(scan_error)? {
            let path = entry.map_err(scan_error)?.path();
            if path.is_file() && is_image(&path) {
                images.push(path);
            }
        }
        // Directory order is platform dependent; sorting keeps seeded runs reproducible
        images.sort();

        if images.is_empty() {
            warn!(dir = %dir.display(), "No images found, uploads will fail");
        } else {
            let examples: Vec<_> = images
                .iter()
                .take(3)
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            info!(dir = %dir.display(), count = images.len(), ?examples, "Found images");
        }

        Ok(Self { images })
    }

    pub fn from_paths(images: Vec<PathBuf>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// Pick one image uniformly at random
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Path> {
        self.images.choose(rng).map(PathBuf::as_path)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

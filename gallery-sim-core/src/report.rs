//! Human-readable statistics report

use crate::stats::StatsSnapshot;
use chrono::{DateTime, Local};
use gallery_sim_http::PoolStats;
use serde::Serialize;
use std::fmt;

/// Statistics for the end of a cycle or of the whole run
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub stats: StatsSnapshot,
    pub pool: Option<PoolStats>,
}

impl StatsReport {
    pub fn new(title: impl Into<String>, stats: StatsSnapshot, pool: Option<PoolStats>) -> Self {
        Self {
            title: title.into(),
            generated_at: Local::now(),
            stats,
            pool,
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;

        writeln!(f, "{} ({})", self.title, self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "Total actions: {}", s.total_actions)?;
        writeln!(f, "Uploads attempted: {}", s.uploads_attempted)?;
        writeln!(
            f,
            "Uploads successful: {} ({:.1}%)",
            s.uploads_successful,
            s.upload_success_rate()
        )?;
        writeln!(
            f,
            "Avg upload time: {:.2}s",
            s.average_upload_time().as_secs_f64()
        )?;
        writeln!(f, "Browse requests: {}", s.browse_requests)?;
        writeln!(f, "Browse failures: {}", s.browse_failures)?;
        writeln!(f, "Images in repository: {}", s.repository_size)?;
        writeln!(f)?;

        writeln!(f, "Browser simulation")?;
        writeln!(f, "HTML pages fetched: {}", s.html_pages_fetched)?;
        writeln!(f, "Images downloaded: {}", s.images_downloaded)?;
        writeln!(f, "Image download failures: {}", s.image_download_failures)?;
        writeln!(f, "Image success rate: {:.1}%", s.image_success_rate())?;
        writeln!(f, "Total data downloaded: {:.2} MB", s.megabytes_downloaded())?;
        writeln!(
            f,
            "Avg HTML download time: {:.2}s",
            s.average_html_time().as_secs_f64()
        )?;
        writeln!(
            f,
            "Avg image download time: {:.2}s",
            s.average_image_time().as_secs_f64()
        )?;

        let pages = s.available_pages();
        if pages.is_empty() {
            writeln!(f, "Available gallery pages: 0 (none)")?;
        } else {
            writeln!(
                f,
                "Available gallery pages: {} ({}..={})",
                pages.end,
                pages.start,
                pages.end - 1
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Connection pool")?;
        match &self.pool {
            Some(pool) => {
                writeln!(f, "Pool size: {}", pool.capacity)?;
                writeln!(f, "Max retries: {}", pool.max_retries)?;
                writeln!(f, "Backoff factor: {}", pool.backoff_factor)?;
                writeln!(f, "Pool requests: {}", pool.requests_sent)?;
                writeln!(f, "Retries performed: {}", pool.retries_performed)?;
            }
            None => writeln!(f, "Pool size: N/A")?,
        }
        write!(f, "Cycles completed: {}", s.cycles_completed)
    }
}

//! Shared statistics for one simulation run

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::time::Duration;

/// Items shown on one gallery page
pub const PAGE_SIZE: u64 = 4;

/// Integer counters tracked for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    CyclesCompleted,
    TotalActions,
    UploadsAttempted,
    UploadsSuccessful,
    UploadsFailed,
    SuccessfulUploadsInCycle,
    /// Local mirror of how many images the service is believed to hold
    RepositorySize,
    BrowseRequests,
    BrowseFailures,
    HtmlPagesFetched,
    ImagesDownloaded,
    ImageDownloadFailures,
    BytesDownloaded,
}

impl StatKey {
    pub const ALL: [StatKey; 13] = [
        StatKey::CyclesCompleted,
        StatKey::TotalActions,
        StatKey::UploadsAttempted,
        StatKey::UploadsSuccessful,
        StatKey::UploadsFailed,
        StatKey::SuccessfulUploadsInCycle,
        StatKey::RepositorySize,
        StatKey::BrowseRequests,
        StatKey::BrowseFailures,
        StatKey::HtmlPagesFetched,
        StatKey::ImagesDownloaded,
        StatKey::ImageDownloadFailures,
        StatKey::BytesDownloaded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::CyclesCompleted => "cycles_completed",
            StatKey::TotalActions => "total_actions",
            StatKey::UploadsAttempted => "uploads_attempted",
            StatKey::UploadsSuccessful => "uploads_successful",
            StatKey::UploadsFailed => "uploads_failed",
            StatKey::SuccessfulUploadsInCycle => "successful_uploads_in_cycle",
            StatKey::RepositorySize => "repository_size",
            StatKey::BrowseRequests => "browse_requests",
            StatKey::BrowseFailures => "browse_failures",
            StatKey::HtmlPagesFetched => "html_pages_fetched",
            StatKey::ImagesDownloaded => "images_downloaded",
            StatKey::ImageDownloadFailures => "image_download_failures",
            StatKey::BytesDownloaded => "bytes_downloaded",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated wall time, summed over successful requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingKey {
    HtmlDownload,
    ImageDownload,
    Upload,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub cycles_completed: u64,
    pub total_actions: u64,
    pub uploads_attempted: u64,
    pub uploads_successful: u64,
    pub uploads_failed: u64,
    pub successful_uploads_in_cycle: u64,
    pub repository_size: u64,
    pub browse_requests: u64,
    pub browse_failures: u64,
    pub html_pages_fetched: u64,
    pub images_downloaded: u64,
    pub image_download_failures: u64,
    pub bytes_downloaded: u64,
    pub html_download_time: Duration,
    pub image_download_time: Duration,
    pub upload_time: Duration,
}

impl StatsSnapshot {
    pub fn get(&self, key: StatKey) -> u64 {
        match key {
            StatKey::CyclesCompleted => self.cycles_completed,
            StatKey::TotalActions => self.total_actions,
            StatKey::UploadsAttempted => self.uploads_attempted,
            StatKey::UploadsSuccessful => self.uploads_successful,
            StatKey::UploadsFailed => self.uploads_failed,
            StatKey::SuccessfulUploadsInCycle => self.successful_uploads_in_cycle,
            StatKey::RepositorySize => self.repository_size,
            StatKey::BrowseRequests => self.browse_requests,
            StatKey::BrowseFailures => self.browse_failures,
            StatKey::HtmlPagesFetched => self.html_pages_fetched,
            StatKey::ImagesDownloaded => self.images_downloaded,
            StatKey::ImageDownloadFailures => self.image_download_failures,
            StatKey::BytesDownloaded => self.bytes_downloaded,
        }
    }

    fn counter_mut(&mut self, key: StatKey) -> &mut u64 {
        match key {
            StatKey::CyclesCompleted => &mut self.cycles_completed,
            StatKey::TotalActions => &mut self.total_actions,
            StatKey::UploadsAttempted => &mut self.uploads_attempted,
            StatKey::UploadsSuccessful => &mut self.uploads_successful,
            StatKey::UploadsFailed => &mut self.uploads_failed,
            StatKey::SuccessfulUploadsInCycle => &mut self.successful_uploads_in_cycle,
            StatKey::RepositorySize => &mut self.repository_size,
            StatKey::BrowseRequests => &mut self.browse_requests,
            StatKey::BrowseFailures => &mut self.browse_failures,
            StatKey::HtmlPagesFetched => &mut self.html_pages_fetched,
            StatKey::ImagesDownloaded => &mut self.images_downloaded,
            StatKey::ImageDownloadFailures => &mut self.image_download_failures,
            StatKey::BytesDownloaded => &mut self.bytes_downloaded,
        }
    }

    pub fn timing(&self, key: TimingKey) -> Duration {
        match key {
            TimingKey::HtmlDownload => self.html_download_time,
            TimingKey::ImageDownload => self.image_download_time,
            TimingKey::Upload => self.upload_time,
        }
    }

    fn timing_mut(&mut self, key: TimingKey) -> &mut Duration {
        match key {
            TimingKey::HtmlDownload => &mut self.html_download_time,
            TimingKey::ImageDownload => &mut self.image_download_time,
            TimingKey::Upload => &mut self.upload_time,
        }
    }

    /// Percentage of upload attempts the service accepted
    pub fn upload_success_rate(&self) -> f64 {
        percentage(self.uploads_successful, self.uploads_attempted)
    }

    /// Percentage of image downloads that succeeded
    pub fn image_success_rate(&self) -> f64 {
        percentage(
            self.images_downloaded,
            self.images_downloaded + self.image_download_failures,
        )
    }

    pub fn average_html_time(&self) -> Duration {
        average(self.timing(TimingKey::HtmlDownload), self.html_pages_fetched)
    }

    pub fn average_image_time(&self) -> Duration {
        average(self.timing(TimingKey::ImageDownload), self.images_downloaded)
    }

    pub fn average_upload_time(&self) -> Duration {
        average(self.timing(TimingKey::Upload), self.uploads_successful)
    }

    pub fn megabytes_downloaded(&self) -> f64 {
        self.bytes_downloaded as f64 / (1024.0 * 1024.0)
    }

    /// Gallery pages that should exist for the current repository size
    pub fn available_pages(&self) -> Range<u64> {
        available_pages(self.repository_size)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn average(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(count) => total / count,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}

/// Zero-based page indices for a repository holding `repository_size` images
pub fn available_pages(repository_size: u64) -> Range<u64> {
    if repository_size == 0 {
        0..0
    } else {
        0..(repository_size - 1) / PAGE_SIZE + 1
    }
}

/// Thread-safe counters shared by every worker of a run.
///
/// Each operation takes the lock once and never performs I/O while holding
/// it, so readers never observe a half-applied update.
#[derive(Debug, Default)]
pub struct StatCounters {
    inner: Mutex<StatsSnapshot>,
}

impl StatCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, key: StatKey, amount: u64) {
        let mut stats = self.inner.lock();
        let counter = stats.counter_mut(key);
        *counter = counter.saturating_add(amount);
    }

    /// Increment several counters by one in a single critical section
    pub fn increment_all(&self, keys: &[StatKey]) {
        let mut stats = self.inner.lock();
        for key in keys {
            let counter = stats.counter_mut(*key);
            *counter = counter.saturating_add(1);
        }
    }

    pub fn set(&self, key: StatKey, value: u64) {
        *self.inner.lock().counter_mut(key) = value;
    }

    pub fn get(&self, key: StatKey) -> u64 {
        self.inner.lock().get(key)
    }

    pub fn add_duration(&self, key: TimingKey, elapsed: Duration) {
        let mut stats = self.inner.lock();
        let total = stats.timing_mut(key);
        *total = total.saturating_add(elapsed);
    }

    /// Record a downloaded body: one counter bump, its size and its time
    pub fn record_download(&self, key: StatKey, timing: TimingKey, bytes: u64, elapsed: Duration) {
        let mut stats = self.inner.lock();
        let counter = stats.counter_mut(key);
        *counter = counter.saturating_add(1);
        stats.bytes_downloaded = stats.bytes_downloaded.saturating_add(bytes);
        let total = stats.timing_mut(timing);
        *total = total.saturating_add(elapsed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().clone()
    }
}

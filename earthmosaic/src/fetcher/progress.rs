//! Fetch progress reporting.
//!
//! Counters are atomic so a UI thread can poll them while the fetch pass runs.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress callback invoked after every slot.
///
/// # Arguments
///
/// * `completed` - Slots present on disk so far (downloaded or skipped)
/// * `total` - Slots in the grid
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Shared progress counters for one fetch pass.
#[derive(Debug, Default)]
pub struct FetchProgress {
    total: AtomicUsize,
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
}

/// Point-in-time copy of [`FetchProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
}

impl ProgressSnapshot {
    pub fn completed(&self) -> usize {
        self.downloaded + self.skipped
    }
}

impl FetchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pass over `total` slots.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.downloaded.store(0, Ordering::SeqCst);
        self.skipped.store(0, Ordering::SeqCst);
    }

    pub fn record_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst) + self.skipped.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::SeqCst),
            downloaded: self.downloaded.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
        }
    }
}

//! Patch acquisition.
//!
//! The fetcher walks a [`SampleGrid`] in row-major order and stores each patch
//! in its [`TileSlot`]. Requests are strictly sequential and paced by a
//! [`RateLimiter`].
//!
//! # Failure policy
//!
//! The first rejected request ends the pass. Providers tend to throttle or
//! ban a client after a bad request, and hammering on makes that worse.
//! Everything fetched so far stays on disk and the next pass skips it, so a
//! rejected pass is resumed simply by running it again. A [`RetryPolicy`]
//! can add bounded backoff per patch before giving up.

mod progress;
mod rate_limit;
mod types;

pub use progress::{FetchProgress, ProgressCallback, ProgressSnapshot};
pub use rate_limit::{
    RateLimiter, RetryPolicy, Sleeper, ThreadSleeper, DEFAULT_JITTER, DEFAULT_MIN_DELAY,
    MAX_BACKOFF,
};
pub use types::{FetchError, FetchReport};

#[cfg(test)]
pub use rate_limit::tests::RecordingSleeper;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::provider::{HttpClient, ProviderError, TileProvider};
use crate::sampler::SampleGrid;
use crate::slot::{SlotStore, TileSlot};

/// Number of leading bytes inspected when sniffing for an HTML body.
const SNIFF_LEN: usize = 64;

/// Rejects bodies that cannot be tile imagery.
///
/// The imagery service answers quota and key problems with an HTML page and
/// a success status, so the body itself has to be checked.
pub fn validate_tile_body(bytes: &[u8]) -> Result<(), ProviderError> {
    if bytes.is_empty() {
        return Err(ProviderError::InvalidResponse("empty body".to_string()));
    }

    let head: Vec<u8> = bytes
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .take(SNIFF_LEN)
        .map(|b| b.to_ascii_lowercase())
        .collect();
    if head.starts_with(b"<html") || head.starts_with(b"<!doctype html") {
        return Err(ProviderError::InvalidResponse(
            "HTML error page instead of image data".to_string(),
        ));
    }

    Ok(())
}

/// Downloads the patches of a sample grid into tile slots.
pub struct TileFetcher<C: HttpClient> {
    provider: Arc<dyn TileProvider>,
    http_client: C,
    store: SlotStore,
    limiter: RateLimiter,
    retry: RetryPolicy,
    progress: Arc<FetchProgress>,
    callback: Option<ProgressCallback>,
}

impl<C: HttpClient> TileFetcher<C> {
    /// Creates a fetcher with the default pacing and fail-fast retry policy.
    pub fn new(provider: Arc<dyn TileProvider>, http_client: C, store: SlotStore) -> Self {
        Self {
            provider,
            http_client,
            store,
            limiter: RateLimiter::default(),
            retry: RetryPolicy::default(),
            progress: Arc::new(FetchProgress::new()),
            callback: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the sleeper used for pacing and backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.limiter = self.limiter.with_sleeper(sleeper);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Shared progress counters, updated while [`TileFetcher::fetch`] runs.
    pub fn progress(&self) -> Arc<FetchProgress> {
        Arc::clone(&self.progress)
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn http_client(&self) -> &C {
        &self.http_client
    }

    /// Fetches every missing slot of `grid` for `location` at `zoom`.
    ///
    /// # Errors
    ///
    /// * [`FetchError::Rejected`] on the first failed patch; remaining patches
    ///   are not requested.
    /// * [`FetchError::Provider`] if the provider does not serve `zoom`.
    /// * [`FetchError::Io`] if a slot cannot be written.
    pub fn fetch(
        &self,
        grid: &SampleGrid,
        location: &str,
        zoom: u8,
    ) -> Result<FetchReport, FetchError> {
        if !self.provider.supports_zoom(zoom) {
            return Err(ProviderError::UnsupportedZoom(zoom).into());
        }

        let mut report = FetchReport {
            total: grid.len(),
            ..FetchReport::default()
        };
        self.progress.reset(grid.len());

        let mut pause_before_next = false;
        for (index, center) in grid.iter() {
            let slot = TileSlot::new(location, zoom, index);

            if self.store.contains(&slot) {
                debug!(location, zoom, index, "Tile slot present, skipping");
                report.skipped += 1;
                self.progress.record_skipped();
                self.notify();
                continue;
            }

            if pause_before_next {
                self.limiter.pause();
            }

            let url = self.provider.tile_url(center, zoom);
            let bytes = match self.download(&url) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        location,
                        index,
                        url = %url,
                        error = %e,
                        "Tile request rejected, aborting fetch pass"
                    );
                    return Err(FetchError::Rejected {
                        index,
                        url,
                        reason: e.to_string(),
                    });
                }
            };

            let path = self
                .store
                .write(&slot, &bytes)
                .map_err(|source| FetchError::Io {
                    path: self.store.path(&slot),
                    source,
                })?;
            debug!(index, bytes = bytes.len(), path = %path.display(), "Tile saved");

            pause_before_next = true;
            report.downloaded += 1;
            self.progress.record_downloaded();
            self.notify();
        }

        info!(
            location,
            zoom,
            total = report.total,
            downloaded = report.downloaded,
            skipped = report.skipped,
            "Fetch pass complete"
        );
        Ok(report)
    }

    /// Requests one patch, backing off between attempts per the retry policy.
    fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let mut attempt = 0;
        loop {
            let result = self.http_client.get(url).and_then(|bytes| {
                validate_tile_body(&bytes)?;
                Ok(bytes)
            });

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        url,
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Tile request failed, backing off"
                    );
                    self.limiter.sleeper().sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn notify(&self) {
        if let Some(callback) = &self.callback {
            callback(self.progress.completed(), self.progress.total());
        }
    }
}

//! Mapping run configuration.
//!
//! [`MosaicConfig`] is threaded explicitly through the pipeline; there is no
//! global state. It can be built in code with the `with_*` setters or loaded
//! from an INI file with [`MosaicConfig::load_from`].

mod file;

pub use file::{config_file_path, expand_tilde, ConfigFileError};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::{RateLimiter, RetryPolicy};
use crate::mosaic::OutputFormat;
use crate::provider::{
    BingStaticProvider, DEFAULT_BASE_URL, DEFAULT_HEADER_CROP, DEFAULT_HEADER_PADDING,
    DEFAULT_TILE_SIZE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

/// Name of the quarantine directory created inside the output directory.
pub const QUARANTINE_DIR_NAME: &str = "quarantine";

/// Default base delay of the retry backoff.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Settings for mapping runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicConfig {
    /// Directory receiving tile slots and finished mosaics
    pub output_dir: PathBuf,
    /// Where corrupt tiles are moved; `None` means `<output_dir>/quarantine`
    pub quarantine_dir: Option<PathBuf>,
    /// Patch edge length in pixels
    pub tile_size: u32,
    /// Rows cut from the top of every patch
    pub header_crop: u32,
    /// Extra rows requested per patch
    pub header_padding: u32,
    pub output_format: OutputFormat,
    /// Return early when the mosaic of a location already exists
    pub skip_existing: bool,
    pub min_request_delay: Duration,
    pub request_jitter: Duration,
    /// Retries per patch before a pass aborts; 0 aborts on the first failure
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub api_key: String,
    pub base_url: String,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            quarantine_dir: None,
            tile_size: DEFAULT_TILE_SIZE,
            header_crop: DEFAULT_HEADER_CROP,
            header_padding: DEFAULT_HEADER_PADDING,
            output_format: OutputFormat::default(),
            skip_existing: true,
            min_request_delay: crate::fetcher::DEFAULT_MIN_DELAY,
            request_jitter: crate::fetcher::DEFAULT_JITTER,
            max_retries: 0,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl MosaicConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_quarantine_dir(mut self, quarantine_dir: impl Into<PathBuf>) -> Self {
        self.quarantine_dir = Some(quarantine_dir.into());
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Sets the header geometry: rows cropped and extra rows requested.
    pub fn with_header(mut self, crop: u32, padding: u32) -> Self {
        self.header_crop = crop;
        self.header_padding = padding;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Sets the pause between requests: `min_delay + uniform(0, jitter)`.
    pub fn with_request_delay(mut self, min_delay: Duration, jitter: Duration) -> Self {
        self.min_request_delay = min_delay;
        self.request_jitter = jitter;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Effective quarantine directory.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.quarantine_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(QUARANTINE_DIR_NAME))
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.min_request_delay, self.request_jitter)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay)
    }

    /// Builds the imagery provider described by this configuration.
    pub fn bing_provider(&self) -> BingStaticProvider {
        BingStaticProvider::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_tile_size(self.tile_size)
            .with_header(self.header_crop, self.header_padding)
    }

    /// Checks settings that would otherwise produce unusable patches.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if self.tile_size == 0 {
            return Err(invalid("tiles", "size", self.tile_size, "must be positive"));
        }
        if self.header_crop > self.header_padding {
            return Err(invalid(
                "tiles",
                "header_crop",
                self.header_crop,
                "cannot exceed header_padding",
            ));
        }
        Ok(())
    }

    /// Loads the configuration from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the configuration from `path`, overlaying present keys on the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        file::load_from(path)
    }
}

fn invalid(section: &str, key: &str, value: impl ToString, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

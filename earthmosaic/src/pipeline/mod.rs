//! End-to-end mapping of one named location.
//!
//! A run resolves the area to map, samples it into a patch grid, fetches the
//! patches and stitches them:
//!
//! ```text
//! MapRequest ──► bounds ──► SampleGrid ──► TileFetcher ──► MosaicAssembler ──► map_<loc>_z<zoom>.jpg
//!                               │               │
//!                               ▼               ▼
//!                           EmptyGrid        Aborted (slots kept, rerun to resume)
//! ```

mod batch;

pub use batch::CountryReport;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bounds::{define_bounding_box, shrink_bounding_box, ImageSize};
use crate::config::MosaicConfig;
use crate::coord::{BoundingBox, GeoPoint};
use crate::error::{Error, Result};
use crate::fetcher::{FetchError, ProgressCallback, ProgressSnapshot, Sleeper, TileFetcher};
use crate::mosaic::{MosaicAssembler, StitchReport};
use crate::provider::{HttpClient, ProviderError, ReqwestClient, TileProvider};
use crate::sampler::grid_dimensions;
use crate::slot::{sanitize_location_name, SlotStore};

/// What to map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    /// Centre of the area; the mosaic is centred here when a size is given
    pub center: GeoPoint,
    /// Area to cover
    pub bbox: Option<BoundingBox>,
    /// Name used in slot and mosaic file names
    pub location_name: String,
    pub zoom: u8,
    /// Upper bound on the mosaic footprint in pixels
    pub max_image_size: Option<ImageSize>,
}

impl MapRequest {
    pub fn new(location_name: impl Into<String>, center: GeoPoint, zoom: u8) -> Self {
        Self {
            center,
            bbox: None,
            location_name: location_name.into(),
            zoom,
            max_image_size: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_max_image_size(mut self, size: ImageSize) -> Self {
        self.max_image_size = Some(size);
        self
    }
}

/// How a mapping run ended.
#[derive(Debug)]
pub enum MapOutcome {
    /// The mosaic was written.
    Completed(StitchReport),
    /// The area sampled to zero patches; nothing was fetched or written.
    EmptyGrid { width: usize, height: usize },
    /// The provider rejected a request. Fetched slots are kept and a rerun
    /// resumes where this one stopped. No mosaic was written.
    Aborted {
        error: FetchError,
        progress: ProgressSnapshot,
    },
    /// The mosaic already existed and the run was skipped.
    AlreadyExists(PathBuf),
}

impl MapOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, MapOutcome::Completed(_))
    }

    /// Path of the mosaic, if one exists after the run.
    pub fn output(&self) -> Option<&Path> {
        match self {
            MapOutcome::Completed(report) => Some(&report.output),
            MapOutcome::AlreadyExists(path) => Some(path),
            MapOutcome::EmptyGrid { .. } | MapOutcome::Aborted { .. } => None,
        }
    }
}

/// Maps named locations into mosaic images.
pub struct MapPipeline<C: HttpClient> {
    config: MosaicConfig,
    provider: Arc<dyn TileProvider>,
    fetcher: TileFetcher<C>,
    assembler: MosaicAssembler,
}

impl MapPipeline<ReqwestClient> {
    /// Builds a pipeline for the Bing static imagery service over HTTP.
    pub fn from_config(config: MosaicConfig) -> Result<Self> {
        let provider = Arc::new(config.bing_provider());
        let client = ReqwestClient::with_settings(config.http_timeout, &config.user_agent)?;
        Self::new(config, provider, client)
    }
}

impl<C: HttpClient> MapPipeline<C> {
    /// Builds a pipeline around any provider and HTTP client.
    ///
    /// Patch geometry (tile size, header crop) is taken from `provider`.
    pub fn new(
        config: MosaicConfig,
        provider: Arc<dyn TileProvider>,
        http_client: C,
    ) -> Result<Self> {
        config.validate()?;

        let store = SlotStore::new(&config.output_dir);
        let fetcher = TileFetcher::new(Arc::clone(&provider), http_client, store.clone())
            .with_rate_limiter(config.rate_limiter())
            .with_retry_policy(config.retry_policy());
        let assembler = MosaicAssembler::new(
            store,
            config.quarantine_dir(),
            provider.tile_size(),
            provider.header_crop(),
        )
        .with_format(config.output_format);

        Ok(Self {
            config,
            provider,
            fetcher,
            assembler,
        })
    }

    /// Replaces the sleeper used between requests.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.fetcher = self.fetcher.with_sleeper(sleeper);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.fetcher = self.fetcher.with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn TileProvider {
        self.provider.as_ref()
    }

    pub fn fetcher(&self) -> &TileFetcher<C> {
        &self.fetcher
    }

    /// Maps one location.
    ///
    /// Rejections by the provider are not errors: they end the run with
    /// [`MapOutcome::Aborted`] so the caller can retry later.
    ///
    /// # Errors
    ///
    /// Unsupported zoom, coordinates outside the projection, a request with
    /// neither a bounding box nor a size, a grid too large to stitch (checked
    /// before anything is fetched), and filesystem or encoding failures.
    pub fn map(&self, request: &MapRequest) -> Result<MapOutcome> {
        let location = sanitize_location_name(&request.location_name);
        let zoom = request.zoom;

        if !self.provider.supports_zoom(zoom) {
            return Err(ProviderError::UnsupportedZoom(zoom).into());
        }

        let output = self.assembler.output_path(&location, zoom);
        if self.config.skip_existing && output.is_file() {
            info!(location = %location, path = %output.display(), "Mosaic exists, skipping");
            return Ok(MapOutcome::AlreadyExists(output));
        }

        let bbox = self.resolve_bounds(request, &location)?;
        let (columns, rows) = grid_dimensions(self.provider.as_ref(), &bbox, zoom)?;
        if columns == 0 || rows == 0 {
            warn!(
                location = %location,
                width = columns,
                height = rows,
                "Bounding box samples to an empty grid, nothing to map"
            );
            return Ok(MapOutcome::EmptyGrid {
                width: columns,
                height: rows,
            });
        }
        // Oversized grids are refused before any request
        self.assembler.canvas_size(columns, rows)?;

        let grid = self.provider.sample(&bbox, zoom)?;

        info!(
            location = %location,
            zoom,
            provider = self.provider.name(),
            patches = grid.len(),
            columns = grid.width(),
            rows = grid.height(),
            "Mapping location"
        );

        match self.fetcher.fetch(&grid, &location, zoom) {
            Ok(report) => {
                debug!(downloaded = report.downloaded, skipped = report.skipped, "Patches ready");
            }
            Err(error @ FetchError::Rejected { .. }) => {
                let progress = self.fetcher.progress().snapshot();
                warn!(
                    location = %location,
                    completed = progress.completed(),
                    total = progress.total,
                    "Mapping aborted, rerun to resume"
                );
                return Ok(MapOutcome::Aborted { error, progress });
            }
            Err(e) => return Err(e.into()),
        }

        let report = self
            .assembler
            .stitch(grid.width(), grid.height(), &location, zoom)?;
        Ok(MapOutcome::Completed(report))
    }

    fn resolve_bounds(&self, request: &MapRequest, location: &str) -> Result<BoundingBox> {
        let provider = self.provider.as_ref();
        let bbox = match (request.bbox, request.max_image_size) {
            (Some(bbox), Some(size)) => {
                shrink_bounding_box(provider, request.center, &bbox, size, request.zoom)?
            }
            (None, Some(size)) => {
                define_bounding_box(provider, request.center, size, request.zoom)?
            }
            (Some(bbox), None) => bbox,
            (None, None) => return Err(Error::MissingExtent(location.to_string())),
        };
        debug!(
            south = bbox.south,
            north = bbox.north,
            west = bbox.west,
            east = bbox.east,
            "Resolved bounding box"
        );
        Ok(bbox)
    }
}

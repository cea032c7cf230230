//! Provider types and traits

use thiserror::Error;

use crate::coord::{self, BoundingBox, CoordError, GeoPoint, PixelPoint};
use crate::sampler::{self, SampleGrid};

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Zoom level not supported by this provider
    #[error("Zoom level {0} not supported by provider")]
    UnsupportedZoom(u8),

    /// Response arrived but is not tile imagery
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Capabilities of a map imagery provider.
///
/// A provider knows its projection, how large one requested patch is, and how
/// to address a patch centred on a coordinate. The projection and sampling
/// methods default to the spherical Mercator variant in [`crate::coord`].
pub trait TileProvider: Send + Sync {
    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Edge length in pixels of one patch after the header strip is cropped.
    fn tile_size(&self) -> u32;

    /// Height in pixels of the strip the provider adds on top of each patch.
    fn header_crop(&self) -> u32 {
        0
    }

    /// Builds the URL of the patch centred on `center` at `zoom`.
    fn tile_url(&self, center: GeoPoint, zoom: u8) -> String;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8 {
        0
    }

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }

    /// Projects a geographic coordinate into world pixel space.
    fn world_to_pixel(&self, point: GeoPoint, zoom: u8) -> Result<PixelPoint, CoordError> {
        coord::world_to_pixel(point, zoom)
    }

    /// Inverse of [`TileProvider::world_to_pixel`].
    fn pixel_to_world(&self, pixel: PixelPoint, zoom: u8) -> GeoPoint {
        coord::pixel_to_world(pixel, zoom)
    }

    /// Lays a grid of patches over `bbox`.
    fn sample(&self, bbox: &BoundingBox, zoom: u8) -> Result<SampleGrid, CoordError> {
        sampler::sample(self, bbox, zoom)
    }
}

//! Bing Maps static aerial imagery provider.
//!
//! Each patch is requested from the Imagery REST service as a static map
//! centred on a coordinate:
//!
//! `https://dev.virtualearth.net/REST/v1/Imagery/Map/Aerial/{lat},{lon}/{zoom}?mapSize={w},{h}&key={key}`
//!
//! The service stamps a logo strip onto the rendered image, so patches are
//! requested taller than needed (`tile_size + header_padding`) and the mosaic
//! crops `header_crop` rows off the top of each one.

use super::types::TileProvider;
use crate::coord::GeoPoint;

/// Default Imagery REST endpoint for aerial static maps.
pub const DEFAULT_BASE_URL: &str = "https://dev.virtualearth.net/REST/v1/Imagery/Map/Aerial";

/// Default patch edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default number of rows cropped from the top of each patch.
pub const DEFAULT_HEADER_CROP: u32 = 30;

/// Default extra height requested per patch. Twice the crop keeps the
/// kept band vertically centred on the requested coordinate.
pub const DEFAULT_HEADER_PADDING: u32 = 2 * DEFAULT_HEADER_CROP;

/// Bing Maps static imagery provider.
///
/// # Example
///
/// ```
/// use earthmosaic::coord::GeoPoint;
/// use earthmosaic::provider::{BingStaticProvider, TileProvider};
///
/// let provider = BingStaticProvider::new("MY_KEY".to_string());
/// let url = provider.tile_url(GeoPoint::new(48.8566, 2.3522), 16);
/// assert!(url.contains("mapSize=256,316"));
/// ```
#[derive(Debug, Clone)]
pub struct BingStaticProvider {
    api_key: String,
    base_url: String,
    tile_size: u32,
    header_crop: u32,
    header_padding: u32,
}

impl BingStaticProvider {
    /// Creates a provider with default patch geometry.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            tile_size: DEFAULT_TILE_SIZE,
            header_crop: DEFAULT_HEADER_CROP,
            header_padding: DEFAULT_HEADER_PADDING,
        }
    }

    /// Sets the patch edge length (e.g. 768 for high-density output).
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Sets the header strip geometry.
    pub fn with_header(mut self, crop: u32, padding: u32) -> Self {
        self.header_crop = crop;
        self.header_padding = padding;
        self
    }

    /// Points the provider at another endpoint. Useful for testing.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Height in pixels of each requested patch.
    pub fn requested_height(&self) -> u32 {
        self.tile_size + self.header_padding
    }
}

impl TileProvider for BingStaticProvider {
    fn name(&self) -> &str {
        "Bing Maps"
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn header_crop(&self) -> u32 {
        self.header_crop
    }

    fn tile_url(&self, center: GeoPoint, zoom: u8) -> String {
        format!(
            "{}/{},{}/{}?mapSize={},{}&key={}",
            self.base_url,
            center.latitude,
            center.longitude,
            zoom,
            self.tile_size,
            self.requested_height(),
            self.api_key
        )
    }

    fn min_zoom(&self) -> u8 {
        1
    }

    fn max_zoom(&self) -> u8 {
        21
    }
}

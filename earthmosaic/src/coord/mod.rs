//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and spherical Mercator world pixel coordinates at a fixed zoom level.
//!
//! The projection compresses latitude with
//! `y = (0.5 − ln((1+sinφ)/(1−sinφ))/(4π)) · size`, where
//! `size = 256 · 2^zoom` is the edge length of the world in pixels.

mod types;

pub use types::{
    BoundingBox, CoordError, GeoPoint, PixelBox, PixelPoint, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, PIXELS_PER_TILE,
};

use std::f64::consts::PI;

/// Edge length of the world in pixels at the given zoom level.
#[inline]
pub fn map_size(zoom: u8) -> f64 {
    PIXELS_PER_TILE * 2.0_f64.powi(zoom as i32)
}

/// Converts a geographic coordinate to world pixel coordinates.
///
/// # Arguments
///
/// * `point` - Latitude must be within [`MIN_LAT`, `MAX_LAT`]
/// * `zoom` - Zoom level (0 to [`MAX_ZOOM`])
///
/// # Errors
///
/// Returns [`CoordError::OutOfRange`] for latitudes the projection cannot
/// represent instead of producing infinite or NaN pixel values.
#[inline]
pub fn world_to_pixel(point: GeoPoint, zoom: u8) -> Result<PixelPoint, CoordError> {
    // NaN fails both range checks
    if !(MIN_LAT..=MAX_LAT).contains(&point.latitude) {
        return Err(CoordError::OutOfRange {
            latitude: point.latitude,
        });
    }
    if !(MIN_LON..=MAX_LON).contains(&point.longitude) {
        return Err(CoordError::InvalidLongitude(point.longitude));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let size = map_size(zoom);
    let sin_lat = point.latitude.to_radians().sin();

    let x = (point.longitude + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;

    Ok(PixelPoint { x, y })
}

/// Converts world pixel coordinates back to a geographic coordinate.
///
/// Exact inverse of [`world_to_pixel`] within floating-point precision.
#[inline]
pub fn pixel_to_world(pixel: PixelPoint, zoom: u8) -> GeoPoint {
    let size = map_size(zoom);

    let z = (4.0 * PI * (0.5 - pixel.y / size)).exp();
    let latitude = -((1.0 - z) / (1.0 + z)).asin().to_degrees();
    let longitude = pixel.x / size * 360.0 - 180.0;

    GeoPoint {
        latitude,
        longitude,
    }
}

/// Degrees of latitude covered by one pixel, averaged over the projectable range.
pub fn latitude_per_pixel(zoom: u8) -> f64 {
    2.0 * MAX_LAT / map_size(zoom)
}

/// Degrees of longitude covered by one pixel.
pub fn longitude_per_pixel(zoom: u8) -> f64 {
    360.0 / map_size(zoom)
}

/// Returns the `(col, row)` of the `patch_size`-pixel grid cell containing a pixel.
#[inline]
pub fn pixel_to_grid(pixel: PixelPoint, patch_size: u32) -> (u32, u32) {
    let patch = patch_size.max(1) as f64;
    (
        (pixel.x / patch).floor().max(0.0) as u32,
        (pixel.y / patch).floor().max(0.0) as u32,
    )
}

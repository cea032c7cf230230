//! Coordinate type definitions

use thiserror::Error;

/// Spherical Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Highest zoom level the projection math accepts.
///
/// Individual providers usually stop earlier, see
/// [`TileProvider::max_zoom`](crate::provider::TileProvider::max_zoom).
pub const MAX_ZOOM: u8 = 23;

/// Edge length of one zoom-0 tile in world pixel space.
///
/// The world is `PIXELS_PER_TILE * 2^zoom` pixels wide at every zoom level,
/// independent of the patch size used when requesting imagery.
pub const PIXELS_PER_TILE: f64 = 256.0;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude, positive north
    pub latitude: f64,
    /// Longitude, positive east
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns this point with latitude clamped into the projectable range.
    ///
    /// Callers holding coordinates from external sources (geocoders report
    /// polar bounding boxes for some regions) use this before projecting.
    pub fn clamped(self) -> Self {
        Self {
            latitude: self.latitude.clamp(MIN_LAT, MAX_LAT),
            longitude: self.longitude.clamp(MIN_LON, MAX_LON),
        }
    }
}

/// A geographic rectangle in degrees.
///
/// Boxes crossing the antimeridian are not supported: `west < east` is assumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Creates a bounding box, swapping `south`/`north` if given in the wrong order.
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        Self {
            south: south.min(north),
            north: south.max(north),
            west,
            east,
        }
    }

    /// North-west corner (top-left in pixel space).
    pub fn north_west(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.west)
    }

    /// South-east corner (bottom-right in pixel space).
    pub fn south_east(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.east)
    }

    /// Midpoint of the box in degrees.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Returns true if `other` lies entirely within this box, allowing `tolerance` degrees.
    pub fn contains_box(&self, other: &BoundingBox, tolerance: f64) -> bool {
        other.south >= self.south - tolerance
            && other.north <= self.north + tolerance
            && other.west >= self.west - tolerance
            && other.east <= self.east + tolerance
    }
}

/// A position in world pixel space at some zoom level.
///
/// Origin is the top-left (north-west) corner of the world; `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in world pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PixelBox {
    /// Builds the box spanned by a top-left and a bottom-right corner.
    pub fn from_corners(top_left: PixelPoint, bottom_right: PixelPoint) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: bottom_right.x,
            max_y: bottom_right.y,
        }
    }

    /// Builds a `width × height` box centred on `center`.
    pub fn centered(center: PixelPoint, width: f64, height: f64) -> Self {
        Self {
            min_x: center.x - width / 2.0,
            min_y: center.y - height / 2.0,
            max_x: center.x + width / 2.0,
            max_y: center.y + height / 2.0,
        }
    }

    /// Intersection of two boxes. Edges only ever move inward.
    pub fn intersect(&self, other: &PixelBox) -> Self {
        Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }

    pub fn top_left(&self) -> PixelPoint {
        PixelPoint::new(self.min_x, self.min_y)
    }

    pub fn bottom_right(&self) -> PixelPoint {
        PixelPoint::new(self.max_x, self.max_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the range the projection can represent
    #[error(
        "Latitude out of range: {latitude} (must be between {min} and {max})",
        min = MIN_LAT,
        max = MAX_LAT
    )]
    OutOfRange { latitude: f64 },

    /// Longitude is outside valid range (-180.0 to 180.0)
    #[error(
        "Invalid longitude: {0} (must be between {min} and {max})",
        min = MIN_LON,
        max = MAX_LON
    )]
    InvalidLongitude(f64),

    /// Zoom level is beyond what the projection supports
    #[error("Invalid zoom level: {0} (must be at most {max})", max = MAX_ZOOM)]
    InvalidZoom(u8),
}

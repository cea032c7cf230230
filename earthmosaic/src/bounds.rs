//! Bounding box resolution in pixel space.
//!
//! Both operations work in world pixel space at a fixed zoom so that the
//! resulting box has a predictable footprint in the final mosaic.

use crate::coord::{BoundingBox, CoordError, GeoPoint, PixelBox};
use crate::error::Error;
use crate::provider::TileProvider;

/// Requested output footprint in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub height: u32,
    pub width: u32,
}

impl ImageSize {
    /// Creates a size; both dimensions must be positive.
    pub fn new(height: u32, width: u32) -> Result<Self, Error> {
        if height == 0 || width == 0 {
            return Err(Error::InvalidImageSize { height, width });
        }
        Ok(Self { height, width })
    }
}

fn to_geographic<P: TileProvider + ?Sized>(
    provider: &P,
    pixels: &PixelBox,
    zoom: u8,
) -> BoundingBox {
    let north_west = provider.pixel_to_world(pixels.top_left(), zoom);
    let south_east = provider.pixel_to_world(pixels.bottom_right(), zoom);
    BoundingBox {
        south: south_east.latitude,
        north: north_west.latitude,
        west: north_west.longitude,
        east: south_east.longitude,
    }
}

/// Builds the box of exactly `size` pixels centred on `center`.
pub fn define_bounding_box<P: TileProvider + ?Sized>(
    provider: &P,
    center: GeoPoint,
    size: ImageSize,
    zoom: u8,
) -> Result<BoundingBox, CoordError> {
    let center_px = provider.world_to_pixel(center, zoom)?;
    let window = PixelBox::centered(center_px, size.width as f64, size.height as f64);
    Ok(to_geographic(provider, &window, zoom))
}

/// Shrinks `bbox` to at most `size` pixels around `center`.
///
/// Geocoded boxes usually enclose far more than the built-up area of a place.
/// Each edge of the box is clamped toward `center` so the result never exceeds
/// `size` and never grows beyond `bbox`. Axes already narrower than the window
/// are left as they are.
pub fn shrink_bounding_box<P: TileProvider + ?Sized>(
    provider: &P,
    center: GeoPoint,
    bbox: &BoundingBox,
    size: ImageSize,
    zoom: u8,
) -> Result<BoundingBox, CoordError> {
    let center_px = provider.world_to_pixel(center, zoom)?;
    let extent = PixelBox::from_corners(
        provider.world_to_pixel(bbox.north_west(), zoom)?,
        provider.world_to_pixel(bbox.south_east(), zoom)?,
    );
    let window = PixelBox::centered(center_px, size.width as f64, size.height as f64);

    let clamped = extent.intersect(&window);
    if clamped == extent {
        return Ok(*bbox);
    }

    let mut shrunk = to_geographic(provider, &clamped, zoom);
    // Untouched edges keep their exact input value
    if clamped.min_x == extent.min_x {
        shrunk.west = bbox.west;
    }
    if clamped.max_x == extent.max_x {
        shrunk.east = bbox.east;
    }
    if clamped.min_y == extent.min_y {
        shrunk.north = bbox.north;
    }
    if clamped.max_y == extent.max_y {
        shrunk.south = bbox.south;
    }
    Ok(shrunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::world_to_pixel;
    use crate::provider::BingStaticProvider;

    const ZOOM: u8 = 16;

    fn provider() -> BingStaticProvider {
        BingStaticProvider::new("test".to_string())
    }

    fn pixel_extent(bbox: &BoundingBox) -> PixelBox {
        PixelBox::from_corners(
            world_to_pixel(bbox.north_west(), ZOOM).unwrap(),
            world_to_pixel(bbox.south_east(), ZOOM).unwrap(),
        )
    }

    #[test]
    fn test_image_size_rejects_zero() {
        assert!(ImageSize::new(0, 10).is_err());
        assert!(ImageSize::new(10, 0).is_err());
        assert_eq!(
            ImageSize::new(512, 768).unwrap(),
            ImageSize {
                height: 512,
                width: 768
            }
        );
    }

    #[test]
    fn test_define_bounding_box_has_requested_footprint() {
        let center = GeoPoint::new(52.52, 13.405);
        let size = ImageSize::new(1024, 2048).unwrap();
        let bbox = define_bounding_box(&provider(), center, size, ZOOM).unwrap();

        let extent = pixel_extent(&bbox);
        assert!((extent.width() - 2048.0).abs() < 1e-6);
        assert!((extent.height() - 1024.0).abs() < 1e-6);
        assert!(bbox.south < center.latitude && center.latitude < bbox.north);
        assert!(bbox.west < center.longitude && center.longitude < bbox.east);
    }

    #[test]
    fn test_define_bounding_box_rejects_polar_center() {
        let size = ImageSize::new(256, 256).unwrap();
        let result = define_bounding_box(&provider(), GeoPoint::new(88.0, 0.0), size, ZOOM);
        assert!(matches!(result, Err(CoordError::OutOfRange { .. })));
    }

    #[test]
    fn test_shrink_large_box_to_window() {
        // Roughly the administrative extent of Dublin
        let bbox = BoundingBox::new(53.2, 53.45, -6.45, -6.05);
        let center = GeoPoint::new(53.3498, -6.2603);
        let size = ImageSize::new(2048, 2048).unwrap();

        let shrunk = shrink_bounding_box(&provider(), center, &bbox, size, ZOOM).unwrap();
        let extent = pixel_extent(&shrunk);

        assert!(bbox.contains_box(&shrunk, 1e-9));
        assert!((extent.width() - 2048.0).abs() < 1e-6);
        assert!((extent.height() - 2048.0).abs() < 1e-6);
    }

    #[test]
    fn test_shrink_leaves_small_axis_unchanged() {
        // Narrow in longitude, tall in latitude
        let bbox = BoundingBox::new(53.0, 54.0, -6.2610, -6.2600);
        let center = GeoPoint::new(53.5, -6.2605);
        let size = ImageSize::new(1024, 4096).unwrap();

        let shrunk = shrink_bounding_box(&provider(), center, &bbox, size, ZOOM).unwrap();

        assert_eq!(shrunk.west, bbox.west);
        assert_eq!(shrunk.east, bbox.east);
        assert!(shrunk.north < bbox.north);
        assert!(shrunk.south > bbox.south);
    }

    #[test]
    fn test_shrink_small_box_is_identity() {
        let bbox = BoundingBox::new(40.70, 40.71, -74.01, -74.00);
        let center = GeoPoint::new(40.705, -74.005);
        let size = ImageSize::new(100_000, 100_000).unwrap();

        let shrunk = shrink_bounding_box(&provider(), center, &bbox, size, ZOOM).unwrap();
        assert_eq!(shrunk, bbox);
    }

    #[test]
    fn test_shrink_off_center_clamps_only_near_edges() {
        // Centre sits close to the west edge: only the east edge moves
        let bbox = BoundingBox::new(45.0, 45.02, 7.0, 7.5);
        let center = GeoPoint::new(45.01, 7.001);
        let size = ImageSize::new(100_000, 2048).unwrap();

        let shrunk = shrink_bounding_box(&provider(), center, &bbox, size, ZOOM).unwrap();
        assert_eq!(shrunk.west, bbox.west);
        assert!(shrunk.east < bbox.east);
        assert_eq!(shrunk.north, bbox.north);
        assert_eq!(shrunk.south, bbox.south);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_case() -> impl Strategy<Value = (BoundingBox, GeoPoint, ImageSize)> {
            (
                -60.0..60.0_f64,
                -170.0..170.0_f64,
                0.001..2.0_f64,
                0.001..2.0_f64,
                0.0..1.0_f64,
                0.0..1.0_f64,
                1u32..20_000,
                1u32..20_000,
            )
                .prop_map(|(south, west, dlat, dlon, fy, fx, h, w)| {
                    let bbox = BoundingBox::new(south, south + dlat, west, west + dlon);
                    let center = GeoPoint::new(south + fy * dlat, west + fx * dlon);
                    let size = ImageSize {
                        height: h,
                        width: w,
                    };
                    (bbox, center, size)
                })
        }

        proptest! {
            #[test]
            fn test_shrink_is_contained_and_bounded((bbox, center, size) in arb_case()) {
                let shrunk = shrink_bounding_box(&provider(), center, &bbox, size, ZOOM)?;
                let extent = pixel_extent(&shrunk);

                prop_assert!(
                    bbox.contains_box(&shrunk, 1e-9),
                    "{:?} not inside {:?}",
                    shrunk,
                    bbox
                );
                prop_assert!(extent.width() <= size.width as f64 + 1e-6);
                prop_assert!(extent.height() <= size.height as f64 + 1e-6);
            }

            #[test]
            fn test_shrink_is_idempotent((bbox, center, size) in arb_case()) {
                let once = shrink_bounding_box(&provider(), center, &bbox, size, ZOOM)?;
                let twice = shrink_bounding_box(&provider(), center, &once, size, ZOOM)?;

                prop_assert!((once.south - twice.south).abs() < 1e-9);
                prop_assert!((once.north - twice.north).abs() < 1e-9);
                prop_assert!((once.west - twice.west).abs() < 1e-9);
                prop_assert!((once.east - twice.east).abs() < 1e-9);
            }
        }
    }
}

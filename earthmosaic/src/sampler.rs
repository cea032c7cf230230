//! Bounding box to patch grid sampling.
//!
//! The sampler lays a grid of `tile_size`-pixel patches over a bounding box in
//! world pixel space and reports the geographic centre of each patch. Patch
//! centres are what the static imagery endpoint is addressed by.

use crate::coord::{BoundingBox, CoordError, GeoPoint, PixelPoint};
use crate::error::Error;
use crate::provider::TileProvider;

/// A rectangular grid of patch centres in row-major order.
///
/// `samples[row * width + col]` is the centre of the patch at `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    width: usize,
    height: usize,
    samples: Vec<GeoPoint>,
}

impl SampleGrid {
    /// Number of patch columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of patch rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of patches.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the grid has zero area and nothing should be fetched.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Patch centres in row-major order.
    pub fn samples(&self) -> &[GeoPoint] {
        &self.samples
    }

    /// Centre of the patch at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<GeoPoint> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.samples.get(row * self.width + col).copied()
    }

    /// Iterates `(index, centre)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, GeoPoint)> + '_ {
        self.samples.iter().copied().enumerate()
    }

    /// Returns an [`Error::InvalidGrid`] for zero-area grids.
    pub fn require_non_empty(&self) -> Result<&Self, Error> {
        if self.is_empty() {
            return Err(Error::InvalidGrid {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Converts a pixel span into a whole number of patches.
///
/// Rounds to nearest with ties away from zero (`2.5 → 3`). Empty, inverted or
/// non-finite spans yield zero.
pub fn patch_count(span_pixels: f64, tile_size: u32) -> usize {
    if tile_size == 0 {
        return 0;
    }
    let count = (span_pixels / tile_size as f64).round();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}

/// Number of patch columns and rows `bbox` samples to at `zoom`.
///
/// Allocates nothing, so callers can vet the grid before [`sample`] builds it.
pub fn grid_dimensions<P: TileProvider + ?Sized>(
    provider: &P,
    bbox: &BoundingBox,
    zoom: u8,
) -> Result<(usize, usize), CoordError> {
    let top_left = provider.world_to_pixel(bbox.north_west(), zoom)?;
    let bottom_right = provider.world_to_pixel(bbox.south_east(), zoom)?;

    let tile_size = provider.tile_size();
    Ok((
        patch_count(bottom_right.x - top_left.x, tile_size),
        patch_count(bottom_right.y - top_left.y, tile_size),
    ))
}

/// Samples `bbox` into a grid of patch centres at `zoom`.
///
/// The grid is anchored at the box's north-west corner; its extent is the
/// box's pixel span rounded to whole patches, so the covered area can differ
/// from the box by up to half a patch on the south and east edges.
pub fn sample<P: TileProvider + ?Sized>(
    provider: &P,
    bbox: &BoundingBox,
    zoom: u8,
) -> Result<SampleGrid, CoordError> {
    let (width, height) = grid_dimensions(provider, bbox, zoom)?;
    let top_left = provider.world_to_pixel(bbox.north_west(), zoom)?;

    let patch = provider.tile_size() as f64;
    let mut samples = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let center = PixelPoint::new(
                top_left.x + (col as f64 + 0.5) * patch,
                top_left.y + (row as f64 + 0.5) * patch,
            );
            samples.push(provider.pixel_to_world(center, zoom));
        }
    }

    Ok(SampleGrid {
        width,
        height,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{define_bounding_box, ImageSize};
    use crate::coord::world_to_pixel;
    use crate::provider::BingStaticProvider;

    fn provider(tile_size: u32) -> BingStaticProvider {
        BingStaticProvider::new("test".to_string()).with_tile_size(tile_size)
    }

    #[test]
    fn test_patch_count_rounds_half_away_from_zero() {
        assert_eq!(patch_count(256.0 * 2.5, 256), 3);
        assert_eq!(patch_count(256.0 * 2.49, 256), 2);
        assert_eq!(patch_count(256.0 * 0.5, 256), 1);
        assert_eq!(patch_count(256.0 * 0.49, 256), 0);
    }

    #[test]
    fn test_patch_count_degenerate_spans() {
        assert_eq!(patch_count(0.0, 256), 0);
        assert_eq!(patch_count(-900.0, 256), 0);
        assert_eq!(patch_count(f64::NAN, 256), 0);
        assert_eq!(patch_count(512.0, 0), 0);
    }

    #[test]
    fn test_grid_size_matches_defined_box() {
        let provider = provider(256);
        let center = GeoPoint::new(48.8566, 2.3522);

        for (rows, cols) in [(1, 1), (2, 3), (4, 1), (5, 7)] {
            let size = ImageSize::new(rows * 256, cols * 256).unwrap();
            let bbox = define_bounding_box(&provider, center, size, 16).unwrap();
            let grid = sample(&provider, &bbox, 16).unwrap();

            assert_eq!(grid.width(), cols as usize);
            assert_eq!(grid.height(), rows as usize);
            assert_eq!(grid.len(), (rows * cols) as usize);
            assert_eq!(
                grid_dimensions(&provider, &bbox, 16).unwrap(),
                (grid.width(), grid.height())
            );
        }
    }

    #[test]
    fn test_grid_dimensions_of_large_box() {
        let provider = provider(256);
        // Most of Europe at zoom 18 is hundreds of millions of patches
        let bbox = BoundingBox::new(36.0, 60.0, -10.0, 30.0);

        let (columns, rows) = grid_dimensions(&provider, &bbox, 18).unwrap();

        assert!(columns > 20_000);
        assert!(rows > 20_000);
    }

    #[test]
    fn test_samples_are_row_major_patch_centres() {
        let provider = provider(256);
        let size = ImageSize::new(512, 768).unwrap();
        let bbox = define_bounding_box(&provider, GeoPoint::new(40.0, -74.0), size, 16).unwrap();
        let grid = sample(&provider, &bbox, 16).unwrap();
        let origin = world_to_pixel(bbox.north_west(), 16).unwrap();

        for (index, point) in grid.iter() {
            let (row, col) = (index / grid.width(), index % grid.width());
            let pixel = world_to_pixel(point, 16).unwrap();
            assert!((pixel.x - (origin.x + (col as f64 + 0.5) * 256.0)).abs() < 1e-6);
            assert!((pixel.y - (origin.y + (row as f64 + 0.5) * 256.0)).abs() < 1e-6);
            assert_eq!(grid.get(row, col), Some(point));
        }

        // Longitude grows along a row, latitude shrinks down a column
        assert!(grid.get(0, 1).unwrap().longitude > grid.get(0, 0).unwrap().longitude);
        assert!(grid.get(1, 0).unwrap().latitude < grid.get(0, 0).unwrap().latitude);
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 3), None);
    }

    #[test]
    fn test_large_patches_cover_fewer_cells() {
        let size = ImageSize::new(768 * 2, 768 * 2).unwrap();
        let center = GeoPoint::new(53.35, -6.26);
        let bbox = define_bounding_box(&provider(256), center, size, 16).unwrap();

        let grid = sample(&provider(768), &bbox, 16).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 2));
    }

    #[test]
    fn test_point_box_yields_empty_grid() {
        let bbox = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let grid = sample(&provider(256), &bbox, 16).unwrap();

        assert!(grid.is_empty());
        assert_eq!(grid.width() * grid.height(), 0);
        assert!(matches!(
            grid.require_non_empty(),
            Err(Error::InvalidGrid {
                width: 0,
                height: 0
            })
        ));
    }

    #[test]
    fn test_polar_box_is_out_of_range() {
        let bbox = BoundingBox::new(80.0, 89.0, 0.0, 10.0);
        let result = sample(&provider(256), &bbox, 10);
        assert!(matches!(result, Err(CoordError::OutOfRange { .. })));
    }

    #[test]
    fn test_trait_sample_delegates() {
        let provider = provider(256);
        let bbox = BoundingBox::new(10.0, 10.5, 20.0, 20.5);
        assert_eq!(provider.sample(&bbox, 10), sample(&provider, &bbox, 10));
    }
}

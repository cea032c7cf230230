//! Integration tests for the mapping pipeline.
//!
//! These tests run complete mapping flows against an in-process tile server:
//! - sample → fetch → stitch for a 3x2 grid at zoom 16
//! - missing slots tolerated by the mosaic
//! - aborted runs resumed without refetching
//!
//! Run with: `cargo test --test pipeline_integration`

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use earthmosaic::bounds::{define_bounding_box, ImageSize};
use earthmosaic::config::MosaicConfig;
use earthmosaic::coord::{BoundingBox, GeoPoint};
use earthmosaic::fetcher::{FetchError, RateLimiter, Sleeper, TileFetcher};
use earthmosaic::mosaic::{MosaicAssembler, TileDiagnostic};
use earthmosaic::pipeline::{MapOutcome, MapPipeline, MapRequest};
use earthmosaic::provider::{
    BingStaticProvider, HttpClient, ProviderError, TileProvider, DEFAULT_HEADER_CROP,
};
use earthmosaic::slot::{SlotStore, TileSlot};

// ============================================================================
// Helper Functions
// ============================================================================

const TILE_COLOR: [u8; 3] = [200, 180, 160];

/// Centre of Galway, Ireland.
fn galway() -> GeoPoint {
    GeoPoint::new(53.2707, -9.0568)
}

/// A 256x316 JPEG patch, as the static imagery endpoint would serve it.
fn served_patch() -> Vec<u8> {
    let image = RgbImage::from_pixel(256, 316, Rgb(TILE_COLOR));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

/// Serves the same patch for every request, except that the request numbers
/// in `reject` (0-based) get an HTML error page.
struct TileServer {
    patch: Vec<u8>,
    reject: Vec<usize>,
    requests: AtomicUsize,
}

impl TileServer {
    fn new() -> Self {
        Self::rejecting(Vec::new())
    }

    fn rejecting(reject: Vec<usize>) -> Self {
        Self {
            patch: served_patch(),
            reject,
            requests: AtomicUsize::new(0),
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl HttpClient for TileServer {
    fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        if self.reject.contains(&n) {
            return Ok(b"<html><body>Access denied</body></html>".to_vec());
        }
        Ok(self.patch.clone())
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn config(dir: &TempDir) -> MosaicConfig {
    MosaicConfig::new(dir.path())
        .with_api_key("integration")
        .with_request_delay(Duration::ZERO, Duration::ZERO)
}

fn pipeline(dir: &TempDir, server: &Arc<TileServer>) -> MapPipeline<Arc<TileServer>> {
    let config = config(dir);
    let provider = Arc::new(config.bing_provider());
    MapPipeline::new(config, provider, Arc::clone(server))
        .unwrap()
        .with_sleeper(Arc::new(NoSleep))
}

/// Request covering a 3x2 patch grid (768x512 px) at zoom 16.
fn three_by_two() -> MapRequest {
    MapRequest::new("loc", galway(), 16).with_max_image_size(ImageSize::new(512, 768).unwrap())
}

fn is_tile_color(pixel: &Rgb<u8>) -> bool {
    pixel
        .0
        .iter()
        .zip(TILE_COLOR.iter())
        .all(|(a, b)| (*a as i32 - *b as i32).abs() <= 8)
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_maps_three_by_two_grid() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(TileServer::new());
    let pipeline = pipeline(&dir, &server);

    let outcome = pipeline.map(&three_by_two()).unwrap();

    let report = match outcome {
        MapOutcome::Completed(report) => report,
        other => panic!("Expected Completed, got {:?}", other),
    };
    assert_eq!(server.requests(), 6);
    assert_eq!(report.output, dir.path().join("map_loc_z16.jpg"));
    assert_eq!((report.width, report.height), (768, 512));
    assert_eq!(report.placed, 6);
    assert!(report.is_complete());

    let mosaic = image::open(&report.output).unwrap().to_rgb8();
    assert_eq!(mosaic.dimensions(), (768, 512));
    assert!(is_tile_color(mosaic.get_pixel(128, 128)));
    assert!(is_tile_color(mosaic.get_pixel(640, 384)));

    // Consumed slots are gone once the mosaic is saved
    let store = SlotStore::new(dir.path());
    for index in 0..6 {
        assert!(!store.contains(&TileSlot::new("loc", 16, index)));
    }
}

#[test]
fn test_second_run_skips_existing_mosaic() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(TileServer::new());
    let pipeline = pipeline(&dir, &server);

    assert!(pipeline.map(&three_by_two()).unwrap().is_completed());
    let outcome = pipeline.map(&three_by_two()).unwrap();

    assert!(matches!(outcome, MapOutcome::AlreadyExists(_)));
    assert_eq!(server.requests(), 6);
}

// ============================================================================
// Missing Tiles
// ============================================================================

#[test]
fn test_missing_slot_leaves_blank_cell() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(TileServer::new());
    let provider: Arc<dyn TileProvider> = Arc::new(BingStaticProvider::new("k".to_string()));
    let store = SlotStore::new(dir.path());

    let bbox =
        define_bounding_box(provider.as_ref(), galway(), ImageSize::new(512, 768).unwrap(), 16)
            .unwrap();
    let grid = provider.sample(&bbox, 16).unwrap();
    assert_eq!((grid.width(), grid.height()), (3, 2));

    let fetcher = TileFetcher::new(Arc::clone(&provider), Arc::clone(&server), store.clone())
        .with_rate_limiter(RateLimiter::unlimited());
    let fetched = fetcher.fetch(&grid, "loc", 16).unwrap();
    assert_eq!(fetched.downloaded, 6);
    for index in 0..6 {
        assert!(dir.path().join(format!("tmp_loc_16_{}.jpg", index)).is_file());
    }

    store.remove(&TileSlot::new("loc", 16, 4)).unwrap();

    let assembler = MosaicAssembler::new(
        store.clone(),
        dir.path().join("quarantine"),
        provider.tile_size(),
        DEFAULT_HEADER_CROP,
    );
    let report = assembler.stitch(3, 2, "loc", 16).unwrap();

    assert_eq!(report.output, dir.path().join("map_loc_z16.jpg"));
    assert_eq!((report.width, report.height), (768, 512));
    assert_eq!(report.placed, 5);
    assert_eq!(
        report.diagnostics,
        vec![TileDiagnostic::Missing {
            index: 4,
            path: dir.path().join("tmp_loc_16_4.jpg"),
        }]
    );

    let mosaic = image::open(&report.output).unwrap().to_rgb8();
    // Cell 4 is row 1, column 1
    let blank = mosaic.get_pixel(384, 384);
    assert!(blank.0.iter().all(|c| *c < 16), "cell 4 should be blank, got {:?}", blank);
    assert!(is_tile_color(mosaic.get_pixel(128, 384)));
    assert!(is_tile_color(mosaic.get_pixel(640, 128)));
}

// ============================================================================
// Abort and Resume
// ============================================================================

#[test]
fn test_aborted_run_resumes_without_refetching() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(TileServer::rejecting(vec![3]));
    let pipeline = pipeline(&dir, &server);

    let first = pipeline.map(&three_by_two()).unwrap();
    match first {
        MapOutcome::Aborted { error, progress } => {
            assert!(matches!(error, FetchError::Rejected { index: 3, .. }));
            assert_eq!(progress.downloaded, 3);
        }
        other => panic!("Expected Aborted, got {:?}", other),
    }
    assert_eq!(server.requests(), 4);
    assert!(!dir.path().join("map_loc_z16.jpg").exists());

    let second = pipeline.map(&three_by_two()).unwrap();

    assert!(second.is_completed());
    // Only slots 3, 4 and 5 were requested again
    assert_eq!(server.requests(), 7);
}

#[test]
fn test_fetch_with_all_slots_present_makes_no_requests() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(TileServer::new());
    let provider: Arc<dyn TileProvider> = Arc::new(BingStaticProvider::new("k".to_string()));
    let store = SlotStore::new(dir.path());
    let bbox =
        define_bounding_box(provider.as_ref(), galway(), ImageSize::new(512, 768).unwrap(), 16)
            .unwrap();
    let grid = provider.sample(&bbox, 16).unwrap();
    let fetcher = TileFetcher::new(Arc::clone(&provider), Arc::clone(&server), store)
        .with_rate_limiter(RateLimiter::unlimited());

    fetcher.fetch(&grid, "loc", 16).unwrap();
    let again = fetcher.fetch(&grid, "loc", 16).unwrap();

    assert_eq!(server.requests(), 6);
    assert_eq!(again.skipped, 6);
    assert_eq!(again.downloaded, 0);
}

// ============================================================================
// Degenerate Areas
// ============================================================================

#[test]
fn test_zero_area_box_is_terminal_no_op() {
    let dir = TempDir::new().unwrap();
    let server = Arc::new(TileServer::new());
    let pipeline = pipeline(&dir, &server);
    let center = galway();
    let point = BoundingBox::new(
        center.latitude,
        center.latitude,
        center.longitude,
        center.longitude,
    );
    let request = MapRequest::new("loc", center, 16).with_bbox(point);

    let outcome = pipeline.map(&request).unwrap();

    assert!(matches!(outcome, MapOutcome::EmptyGrid { .. }));
    assert_eq!(server.requests(), 0);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

//! EarthMosaic - stitched aerial imagery for an area of interest
//!
//! Converts a point plus a size, or an explicit bounding box, into a single
//! mosaic image assembled from many static map patches fetched one by one
//! from an imagery provider.
//!
//! ```no_run
//! use earthmosaic::bounds::ImageSize;
//! use earthmosaic::config::MosaicConfig;
//! use earthmosaic::coord::GeoPoint;
//! use earthmosaic::pipeline::{MapPipeline, MapRequest};
//!
//! # fn main() -> earthmosaic::Result<()> {
//! let config = MosaicConfig::new("maps").with_api_key("MY_KEY");
//! let pipeline = MapPipeline::from_config(config)?;
//!
//! let request = MapRequest::new("Galway", GeoPoint::new(53.2707, -9.0568), 16)
//!     .with_max_image_size(ImageSize::new(256 * 12, 256 * 12)?);
//! let outcome = pipeline.map(&request)?;
//! println!("{:?}", outcome.output());
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod config;
pub mod coord;
pub mod error;
pub mod fetcher;
pub mod geocode;
pub mod logging;
pub mod mosaic;
pub mod pipeline;
pub mod provider;
pub mod sampler;
pub mod slot;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

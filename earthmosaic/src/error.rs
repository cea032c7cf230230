//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::coord::CoordError;
use crate::fetcher::FetchError;
use crate::geocode::GeocodeError;
use crate::mosaic::MosaicError;
use crate::provider::ProviderError;

/// Errors returned by mapping operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    #[error(transparent)]
    Config(#[from] ConfigFileError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// The sampled grid has no patches.
    #[error("Sample grid is empty ({width}x{height} patches)")]
    InvalidGrid { width: usize, height: usize },

    /// An image size with a zero dimension.
    #[error("Invalid image size {height}x{width}: both dimensions must be positive")]
    InvalidImageSize { height: u32, width: u32 },

    /// Neither a bounding box nor a maximum image size was given.
    #[error("No extent for '{0}': provide a bounding box, a maximum image size, or both")]
    MissingExtent(String),
}

/// Result alias for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

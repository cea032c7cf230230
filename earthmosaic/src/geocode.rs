//! Place name resolution.
//!
//! Mapping a city or a whole country needs coordinates for names. That
//! lookup is done by an external geocoding service; this module only defines
//! the interface the batch operations consume.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::coord::{BoundingBox, GeoPoint};

/// Geocoding failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// The service could not be reached or answered with an error
    #[error("Geocoding service error: {0}")]
    Service(String),

    /// The service knows nothing about the place
    #[error("Place not found: {0}")]
    NotFound(String),
}

/// Resolves place names to coordinates.
pub trait Geocoder: Send + Sync {
    /// Bounding box of `city` in `country`, if the service has one.
    fn resolve_city_bounding_box(
        &self,
        city: &str,
        country: &str,
    ) -> Result<Option<BoundingBox>, GeocodeError>;

    /// Centre of every city of `country`, keyed by city name.
    fn resolve_cities_in_country(
        &self,
        country: &str,
    ) -> Result<BTreeMap<String, GeoPoint>, GeocodeError>;
}

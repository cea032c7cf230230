//! Mapping by place name through a [`Geocoder`].

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use super::{MapOutcome, MapPipeline, MapRequest};
use crate::bounds::ImageSize;
use crate::error::{Error, Result};
use crate::geocode::{GeocodeError, Geocoder};
use crate::provider::HttpClient;

/// Outcome of mapping every city of a country.
#[derive(Debug, Default)]
pub struct CountryReport {
    /// Cities that were mapped, skipped as existing, or sampled empty
    pub outcomes: BTreeMap<String, MapOutcome>,
    /// Cities whose run failed with an error
    pub failures: BTreeMap<String, Error>,
    /// Cities not attempted because the provider started rejecting requests
    pub remaining: Vec<String>,
}

impl CountryReport {
    /// Number of cities with a mosaic on disk.
    pub fn mapped(&self) -> usize {
        self.outcomes.values().filter(|o| o.output().is_some()).count()
    }
}

impl<C: HttpClient> MapPipeline<C> {
    /// Maps `city` using the bounding box the geocoder reports for it.
    ///
    /// The mosaic is centred on the middle of that box. With `max_image_size`
    /// the box is shrunk to at most that footprint.
    pub fn map_city(
        &self,
        geocoder: &dyn Geocoder,
        city: &str,
        country: &str,
        zoom: u8,
        max_image_size: Option<ImageSize>,
    ) -> Result<MapOutcome> {
        let bbox = geocoder
            .resolve_city_bounding_box(city, country)?
            .ok_or_else(|| GeocodeError::NotFound(format!("{}, {}", city, country)))?;

        let mut request = MapRequest::new(city, bbox.center(), zoom).with_bbox(bbox);
        if let Some(size) = max_image_size {
            request = request.with_max_image_size(size);
        }
        self.map(&request)
    }

    /// Maps every city the geocoder lists for `country`, each centred on its
    /// reported position and `size` pixels large.
    ///
    /// Errors for single cities are logged and collected. A rejection by the
    /// provider stops the batch; the cities left over are listed in
    /// [`CountryReport::remaining`].
    pub fn map_country(
        &self,
        geocoder: &dyn Geocoder,
        country: &str,
        zoom: u8,
        size: ImageSize,
    ) -> Result<CountryReport> {
        let cities = geocoder.resolve_cities_in_country(country)?;
        info!(country, cities = cities.len(), "Mapping cities");

        let mut report = CountryReport::default();
        let mut cities = cities.into_iter();
        while let Some((city, center)) = cities.next() {
            let request = MapRequest::new(city.as_str(), center, zoom).with_max_image_size(size);
            match self.map(&request) {
                Ok(outcome @ MapOutcome::Aborted { .. }) => {
                    report.outcomes.insert(city, outcome);
                    report.remaining = cities.by_ref().map(|(name, _)| name).collect();
                    warn!(
                        country,
                        remaining = report.remaining.len(),
                        "Provider rejected a request, stopping country run"
                    );
                    break;
                }
                Ok(outcome) => {
                    report.outcomes.insert(city, outcome);
                }
                Err(e) => {
                    error!(city = %city, error = %e, "Failed to map city");
                    report.failures.insert(city, e);
                }
            }
        }

        info!(
            country,
            mapped = report.mapped(),
            failed = report.failures.len(),
            "Country run finished"
        );
        Ok(report)
    }
}

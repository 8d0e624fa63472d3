// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use irea_app::{AppError, Coordinate, GeocodeHit, Region, StreetView};
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REGION_QUALIFIER: &str = ", Boston, MA";
pub const MISSING_KEY_REASON: &str = "missing maps access key";

pub const STREET_VIEW_RADIUS_METERS: u32 = 60;
pub const STREET_VIEW_SIZE: &str = "640x360";
pub const STREET_VIEW_FOV: u32 = 80;
pub const STREET_VIEW_PITCH: i32 = 0;

/// Everything needed to talk to the mapping provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub region: Region,
    /// Appended to queries that do not already name the region.
    pub region_qualifier: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MAPS_BASE_URL.to_owned(),
            api_key: None,
            region: Region::default(),
            region_qualifier: DEFAULT_REGION_QUALIFIER.to_owned(),
            timeout: DEFAULT_GEOCODE_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    base_url: String,
    api_key: String,
    region: Region,
    region_qualifier: String,
    timeout: Duration,
    http: HttpClient,
}

#[derive(Debug, Default, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct GeocodeCandidate {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct Geometry {
    #[serde(default)]
    location: Option<Location>,
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct StreetViewMetadata {
    #[serde(default)]
    status: String,
}

impl GeocodeClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let Some(api_key) = config.api_key() else {
            bail!("{MISSING_KEY_REASON} -- set maps.api_key or IREA_MAPS_API_KEY");
        };
        let base_url = config.base_url.trim().trim_end_matches('/').to_owned();
        Url::parse(&base_url)
            .with_context(|| format!("maps.base_url {base_url:?} is not a URL"))?;
        if !config.region.is_well_formed() {
            bail!("region {:?} has inverted or non-finite bounds", config.region.name);
        }

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key.to_owned(),
            region: config.region.clone(),
            region_qualifier: config.region_qualifier.clone(),
            timeout: config.timeout,
            http,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Biases free-text queries toward the region unless they already name it.
    pub fn qualify(&self, query: &str) -> String {
        let query = query.trim();
        let names_region = query
            .to_lowercase()
            .contains(&self.region.name.to_lowercase());
        if names_region || self.region_qualifier.trim().is_empty() {
            query.to_owned()
        } else {
            format!("{query}{}", self.region_qualifier)
        }
    }

    pub fn resolve(&self, query: &str) -> Result<GeocodeHit, AppError> {
        let failure = |reason: String| AppError::geocode(self.region.name.clone(), reason);

        if query.trim().is_empty() {
            return Err(failure("blank query".to_owned()));
        }
        let address = self.qualify(query);
        let bounds = self.region.bounds_hint();
        let url = self
            .endpoint(
                "geocode/json",
                &[
                    ("address", address.as_str()),
                    ("bounds", bounds.as_str()),
                    ("region", "us"),
                ],
            )
            .map_err(failure)?;

        let response: GeocodeResponse = self.fetch(url).map_err(failure)?;
        let Some(top) = response.results.into_iter().next() else {
            return Err(failure(format!("no results (status {})", response.status)));
        };
        let location = top
            .geometry
            .and_then(|geometry| geometry.location)
            .unwrap_or_default();
        let coordinate = match (location.lat, location.lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => return Err(failure("result has no location".to_owned())),
        };
        if !coordinate.is_finite() {
            return Err(failure("result location is not finite".to_owned()));
        }
        let coordinate = self.region.check(coordinate)?;

        let display_label = top
            .formatted_address
            .filter(|address| !address.trim().is_empty())
            .unwrap_or_else(|| coordinate.label());
        debug!(label = %display_label, "address resolved");
        Ok(GeocodeHit {
            coordinate,
            display_label,
        })
    }

    /// Reverse geocode. Never fails: any problem yields `coordinate.label()`.
    pub fn describe(&self, coordinate: Coordinate) -> String {
        let latlng = latlng(coordinate);
        let looked_up = self
            .endpoint("geocode/json", &[("latlng", latlng.as_str())])
            .and_then(|url| self.fetch::<GeocodeResponse>(url));
        match looked_up {
            Ok(response) => response
                .results
                .into_iter()
                .find_map(|candidate| candidate.formatted_address)
                .filter(|address| !address.trim().is_empty())
                .unwrap_or_else(|| coordinate.label()),
            Err(reason) => {
                debug!(%reason, "reverse geocode failed, using coordinates");
                coordinate.label()
            }
        }
    }

    pub fn street_view(&self, coordinate: Coordinate) -> StreetView {
        let location = latlng(coordinate);
        let radius = STREET_VIEW_RADIUS_METERS.to_string();
        let probed = self
            .endpoint(
                "streetview/metadata",
                &[("location", location.as_str()), ("radius", radius.as_str())],
            )
            .and_then(|url| self.fetch::<StreetViewMetadata>(url));
        match probed {
            Ok(metadata) if metadata.status == "OK" => self
                .street_view_url(coordinate)
                .map_or(StreetView::Missing, StreetView::Available),
            Ok(metadata) => {
                debug!(status = %metadata.status, "no street view panorama");
                StreetView::Missing
            }
            Err(reason) => {
                debug!(%reason, "street view probe failed");
                StreetView::Missing
            }
        }
    }

    /// Static photo URL for a location. Carries the access key.
    pub fn street_view_url(&self, coordinate: Coordinate) -> Option<String> {
        let location = latlng(coordinate);
        let fov = STREET_VIEW_FOV.to_string();
        let pitch = STREET_VIEW_PITCH.to_string();
        self.endpoint(
            "streetview",
            &[
                ("size", STREET_VIEW_SIZE),
                ("location", location.as_str()),
                ("fov", fov.as_str()),
                ("pitch", pitch.as_str()),
            ],
        )
        .ok()
        .map(String::from)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, String> {
        let base = format!("{}/{path}", self.base_url);
        let pairs = params
            .iter()
            .copied()
            .chain(std::iter::once(("key", self.api_key.as_str())));
        Url::parse_with_params(&base, pairs).map_err(|error| error.to_string())
    }

    fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, String> {
        let path = url.path().to_owned();
        debug!(%path, "calling maps provider");
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .map_err(|error| {
                warn!(%path, error = %error.without_url(), "maps provider unreachable");
                format!("request to {path} failed")
            })?;
        let status = response.status();
        if !status.is_success() {
            warn!(%path, status = status.as_u16(), "maps provider returned an error status");
            return Err(format!("{path} returned {}", status.as_u16()));
        }
        response
            .json::<T>()
            .map_err(|error| format!("decode {path}: {}", error.without_url()))
    }
}

fn latlng(coordinate: Coordinate) -> String {
    format!("{},{}", coordinate.latitude, coordinate.longitude)
}

#[cfg(test)]
mod tests {
    use super::{GeocodeClient, ProviderConfig, latlng};
    use irea_app::{Coordinate, Region};

    fn client() -> GeocodeClient {
        GeocodeClient::new(&ProviderConfig {
            api_key: Some("test-key".to_owned()),
            ..ProviderConfig::default()
        })
        .expect("client builds with a key")
    }

    #[test]
    fn new_requires_a_key() {
        let error = GeocodeClient::new(&ProviderConfig::default())
            .expect_err("missing key must fail")
            .to_string();
        assert!(error.contains("IREA_MAPS_API_KEY"));

        let blank = ProviderConfig {
            api_key: Some("   ".to_owned()),
            ..ProviderConfig::default()
        };
        assert!(GeocodeClient::new(&blank).is_err());
    }

    #[test]
    fn new_rejects_malformed_region() {
        let config = ProviderConfig {
            api_key: Some("k".to_owned()),
            region: Region {
                lat_min: 50.0,
                ..Region::boston()
            },
            ..ProviderConfig::default()
        };
        assert!(GeocodeClient::new(&config).is_err());
    }

    #[test]
    fn queries_are_qualified_unless_they_name_the_region() {
        let client = client();
        assert_eq!(client.qualify("12 Hull St"), "12 Hull St, Boston, MA");
        assert_eq!(client.qualify("  12 Hull St  "), "12 Hull St, Boston, MA");
        assert_eq!(client.qualify("12 Hull St, BOSTON"), "12 Hull St, BOSTON");
    }

    #[test]
    fn street_view_url_has_fixed_framing() {
        let url = client()
            .street_view_url(Coordinate::new(42.36, -71.05))
            .expect("url builds");
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/streetview?"));
        assert!(url.contains("size=640x360"));
        assert!(url.contains("location=42.36%2C-71.05"));
        assert!(url.contains("fov=80"));
        assert!(url.contains("pitch=0"));
        assert!(url.ends_with("key=test-key"));
    }

    #[test]
    fn latlng_is_comma_joined() {
        assert_eq!(latlng(Coordinate::new(42.5, -71.25)), "42.5,-71.25");
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Seismic catalog client (FDSN event web service, GeoJSON output)

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::CatalogConfig;
use crate::event::Event;
use crate::{QuakeGuardError, Result};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Longest accepted lookback window (one year)
pub const MAX_LOOKBACK_HOURS: u32 = 8760;

/// Rectangular geographic filter in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64, limit: f64| v.is_finite() && v.abs() <= limit;

        if !in_range(self.min_lon, 180.0) || !in_range(self.max_lon, 180.0) {
            return Err(QuakeGuardError::InvalidQuery(format!(
                "longitude out of range in {}", self
            )));
        }
        if !in_range(self.min_lat, 90.0) || !in_range(self.max_lat, 90.0) {
            return Err(QuakeGuardError::InvalidQuery(format!(
                "latitude out of range in {}", self
            )));
        }
        if self.min_lon > self.max_lon || self.min_lat > self.max_lat {
            return Err(QuakeGuardError::InvalidQuery(format!(
                "minimum exceeds maximum in {}", self
            )));
        }
        Ok(())
    }

}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }
}

/// Parameters of one catalog fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    pub min_magnitude: f64,
    /// Lookback window ending now
    pub hours: u32,
    pub region: Option<BoundingBox>,
    pub limit: u32,
}

impl EventQuery {
    pub fn validate(&self) -> Result<()> {
        if !self.min_magnitude.is_finite() || self.min_magnitude < 0.0 {
            return Err(QuakeGuardError::InvalidQuery(format!(
                "minimum magnitude must be non-negative, got {}", self.min_magnitude
            )));
        }
        if self.hours == 0 {
            return Err(QuakeGuardError::InvalidQuery("lookback window must be at least 1 hour".to_string()));
        }
        if self.hours > MAX_LOOKBACK_HOURS {
            return Err(QuakeGuardError::InvalidQuery(format!(
                "lookback window must be at most {} hours, got {}", MAX_LOOKBACK_HOURS, self.hours
            )));
        }
        if self.limit == 0 {
            return Err(QuakeGuardError::InvalidQuery("limit must be at least 1".to_string()));
        }
        if let Some(region) = &self.region {
            region.validate()?;
        }
        Ok(())
    }

    /// Query-string parameters for a window ending at `end`
    pub fn params(&self, end: DateTime<Utc>) -> Result<Vec<(&'static str, String)>> {
        let start = end
            .checked_sub_signed(ChronoDuration::hours(i64::from(self.hours)))
            .ok_or_else(|| {
                QuakeGuardError::InvalidQuery(format!("lookback of {} hours is out of range", self.hours))
            })?;

        let mut params = vec![
            ("format", "geojson".to_string()),
            ("starttime", start.format(TIME_FORMAT).to_string()),
            ("endtime", end.format(TIME_FORMAT).to_string()),
            ("minmagnitude", self.min_magnitude.to_string()),
            ("orderby", "time".to_string()),
            ("limit", self.limit.to_string()),
        ];

        if let Some(r) = &self.region {
            params.push(("minlatitude", r.min_lat.to_string()));
            params.push(("maxlatitude", r.max_lat.to_string()));
            params.push(("minlongitude", r.min_lon.to_string()));
            params.push(("maxlongitude", r.max_lon.to_string()));
        }

        Ok(params)
    }
}

/// Anything that can produce a window of events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Name of this source
    fn name(&self) -> &str;

    /// Fetch events matching `query`
    async fn fetch(&self, query: &EventQuery) -> Result<Vec<Event>>;

    /// Fetch, logging and swallowing any failure
    async fn fetch_or_empty(&self, query: &EventQuery) -> Vec<Event> {
        match self.fetch(query).await {
            Ok(events) => events,
            Err(e) => {
                error!("Fetch from {} failed: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

/// HTTP client for the catalog endpoint
pub struct CatalogClient {
    client: Client,
    url: String,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("quakeguard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch one window; a single attempt, no retry
    pub async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        query.validate()?;

        let params = query.params(Utc::now())?;
        debug!("Querying catalog {} with {:?}", self.url, params);

        let response = self.client.get(&self.url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(QuakeGuardError::CatalogStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        let events = parse_feature_collection(&body)?;
        info!("Fetched {} events (min magnitude {}, last {}h)", events.len(), query.min_magnitude, query.hours);

        Ok(events)
    }
}

#[async_trait]
impl EventSource for CatalogClient {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn fetch(&self, query: &EventQuery) -> Result<Vec<Event>> {
        self.fetch_events(query).await
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct Feature {
    properties: Properties,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Properties {
    time: Option<i64>,
    place: Option<String>,
    mag: Option<f64>,
    url: Option<String>,
    tsunami: Option<i64>,
    sig: Option<u32>,
    felt: Option<u32>,
    alert: Option<String>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<Option<f64>>,
}

/// Parse a GeoJSON feature collection, skipping features that lack a time,
/// magnitude or three coordinates
pub fn parse_feature_collection(body: &str) -> Result<Vec<Event>> {
    let collection: FeatureCollection = serde_json::from_str(body)?;

    let total = collection.features.len();
    let events: Vec<Event> = collection
        .features
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Feature>(value) {
            Ok(feature) => feature_to_event(feature),
            Err(e) => {
                debug!("Skipping malformed feature: {}", e);
                None
            }
        })
        .collect();

    if events.len() < total {
        debug!("Dropped {} of {} features", total - events.len(), total);
    }

    Ok(events)
}

fn feature_to_event(feature: Feature) -> Option<Event> {
    let p = feature.properties;
    let time = DateTime::<Utc>::from_timestamp_millis(p.time?)?;
    let magnitude = p.mag?;

    let coords = feature.geometry.coordinates;
    let (longitude, latitude, depth) = match coords.as_slice() {
        [Some(lon), Some(lat), Some(depth), ..] => (*lon, *lat, *depth),
        _ => return None,
    };

    Some(Event {
        time,
        place: p.place.unwrap_or_default(),
        magnitude,
        longitude,
        latitude,
        depth,
        url: p.url,
        tsunami: p.tsunami.unwrap_or(0) != 0,
        significance: p.sig,
        felt: p.felt,
        alert: p.alert.filter(|a| !a.is_empty()),
        status: p.status,
        kind: p.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"mag": 5.8, "place": "45 km SW of Town", "time": 1740830400000,
                               "url": "https://example.org/ev1", "tsunami": 1, "sig": 518,
                               "felt": null, "alert": "green", "status": "reviewed", "type": "earthquake"},
                "geometry": {"type": "Point", "coordinates": [142.3, 38.1, 35.2]}
            },
            {
                "type": "Feature",
                "properties": {"mag": null, "place": "no magnitude", "time": 1740830400000},
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0, 10.0]}
            },
            {
                "type": "Feature",
                "properties": {"mag": 3.1, "place": null, "time": 1740826800000},
                "geometry": {"type": "Point", "coordinates": [-117.5, 35.7, 8.0]}
            },
            {
                "type": "Feature",
                "properties": {"mag": 4.0, "place": "short coords", "time": 1740826800000},
                "geometry": {"type": "Point", "coordinates": [10.0, 20.0]}
            },
            {"type": "Feature", "properties": {"mag": "bad"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_parse_keeps_complete_features() {
        let events = parse_feature_collection(SAMPLE).unwrap();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.time, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(first.magnitude, 5.8);
        assert_eq!(first.longitude, 142.3);
        assert_eq!(first.latitude, 38.1);
        assert_eq!(first.depth, 35.2);
        assert!(first.tsunami);
        assert_eq!(first.significance, Some(518));
        assert_eq!(first.alert.as_deref(), Some("green"));

        assert_eq!(events[1].place, "");
        assert!(!events[1].tsunami);
    }

    #[test]
    fn test_parse_missing_features_is_empty() {
        assert!(parse_feature_collection("{}").unwrap().is_empty());
        assert!(parse_feature_collection("not json").is_err());
    }

    #[test]
    fn test_query_params() {
        let end = Utc.with_ymd_and_hms(2025, 3, 2, 6, 30, 0).unwrap();
        let query = EventQuery {
            min_magnitude: 2.5,
            hours: 24,
            region: Some(BoundingBox { min_lon: -124.5, min_lat: 32.5, max_lon: -114.0, max_lat: 42.0 }),
            limit: 500,
        };

        let params = query.params(end).unwrap();
        let get = |k: &str| params.iter().find(|(key, _)| *key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("format"), Some("geojson"));
        assert_eq!(get("starttime"), Some("2025-03-01T06:30:00"));
        assert_eq!(get("endtime"), Some("2025-03-02T06:30:00"));
        assert_eq!(get("minmagnitude"), Some("2.5"));
        assert_eq!(get("orderby"), Some("time"));
        assert_eq!(get("limit"), Some("500"));
        assert_eq!(get("minlatitude"), Some("32.5"));
        assert_eq!(get("maxlongitude"), Some("-114"));
    }

    #[test]
    fn test_query_without_region_has_no_bbox() {
        let query = EventQuery { min_magnitude: 4.0, hours: 1, region: None, limit: 200 };
        let params = query.params(Utc::now()).unwrap();
        assert!(params.iter().all(|(k, _)| !k.ends_with("latitude") && !k.ends_with("longitude")));
    }

    #[test]
    fn test_query_validation() {
        let ok = EventQuery { min_magnitude: 2.5, hours: 24, region: None, limit: 500 };
        assert!(ok.validate().is_ok());

        assert!(EventQuery { min_magnitude: -1.0, ..ok.clone() }.validate().is_err());
        assert!(EventQuery { hours: 0, ..ok.clone() }.validate().is_err());

        let flipped = BoundingBox { min_lon: 10.0, min_lat: 0.0, max_lon: 5.0, max_lat: 1.0 };
        assert!(EventQuery { region: Some(flipped), ..ok }.validate().is_err());
    }

    #[test]
    fn test_oversized_lookback_is_rejected() {
        let query = EventQuery { min_magnitude: 2.5, hours: u32::MAX, region: None, limit: 500 };
        assert!(matches!(query.validate(), Err(QuakeGuardError::InvalidQuery(_))));

        let year = EventQuery { hours: MAX_LOOKBACK_HOURS, ..query.clone() };
        assert!(year.validate().is_ok());
        assert!(EventQuery { hours: MAX_LOOKBACK_HOURS + 1, ..query.clone() }.validate().is_err());
    }

    #[test]
    fn test_params_out_of_range_start_is_an_error() {
        let query = EventQuery { min_magnitude: 2.5, hours: 24, region: None, limit: 500 };
        assert!(matches!(
            query.params(DateTime::<Utc>::MIN_UTC),
            Err(QuakeGuardError::InvalidQuery(_))
        ));
    }
}

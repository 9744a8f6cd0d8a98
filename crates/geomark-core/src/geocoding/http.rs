// crates/geomark-core/src/geocoding/http.rs

//! geocode.maps.co backend (Nominatim-compatible JSON API).

use super::{GeocodeCandidate, GeocodeClient, Suggestion, SuggestionId};
use crate::error::{MapError, Result};
use crate::geo::{Coordinate, SearchBias};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://geocode.maps.co";
const USER_AGENT: &str = concat!("geomark/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct ForwardResult {
    #[serde(default)]
    place_id: Option<u64>,
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: String,
}

#[derive(Clone)]
pub struct MapsCo {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: usize,
}

impl MapsCo {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// Points the client at another Nominatim-compatible host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    async fn search(&self, query: &str, viewbox: Option<String>) -> Result<Vec<ForwardResult>> {
        let limit = self.max_results.to_string();
        let mut params = vec![
            ("q", query.to_string()),
            ("api_key", self.api_key.clone()),
            ("limit", limit),
        ];
        if let Some(viewbox) = viewbox {
            params.push(("viewbox", viewbox));
        }

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MapError::Geocode(format!(
                "geocode.maps.co returned status {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

fn to_candidates(results: Vec<ForwardResult>, limit: usize) -> Result<Vec<GeocodeCandidate>> {
    results
        .into_iter()
        .take(limit)
        .map(|r| {
            let lat = r
                .lat
                .trim()
                .parse::<f64>()
                .map_err(|e| MapError::Geocode(format!("invalid lat {:?}: {e}", r.lat)))?;
            let lon = r
                .lon
                .trim()
                .parse::<f64>()
                .map_err(|e| MapError::Geocode(format!("invalid lon {:?}: {e}", r.lon)))?;
            Ok(GeocodeCandidate {
                coordinate: Coordinate::new(lat, lon)?,
                label: r.display_name,
            })
        })
        .collect()
}

fn to_suggestions(results: Vec<ForwardResult>, limit: usize) -> Vec<Suggestion> {
    results
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| Suggestion {
            id: SuggestionId::new(r.place_id.map_or_else(|| format!("r{i}"), |id| id.to_string())),
            label: r.display_name,
        })
        .collect()
}

fn viewbox(bias: &SearchBias) -> String {
    let (west, south, east, north) = bias.bounding_box();
    format!("{west:.5},{north:.5},{east:.5},{south:.5}")
}

#[async_trait]
impl GeocodeClient for MapsCo {
    async fn forward(&self, address: &str) -> Result<Vec<GeocodeCandidate>> {
        let results = self.search(address, None).await?;
        to_candidates(results, self.max_results)
    }

    async fn suggest(&self, prefix: &str, bias: &SearchBias) -> Result<Vec<Suggestion>> {
        let results = self.search(prefix, Some(viewbox(bias))).await?;
        Ok(to_suggestions(results, self.max_results))
    }

    async fn reverse(&self, position: Coordinate) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", position.latitude().to_string()),
                ("lon", position.longitude().to_string()),
                ("api_key", self.api_key.clone()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MapError::Geocode(format!(
                "geocode.maps.co returned status {}",
                response.status()
            )));
        }
        let result: ReverseResult = response.json().await?;
        Ok(result.display_name)
    }
}

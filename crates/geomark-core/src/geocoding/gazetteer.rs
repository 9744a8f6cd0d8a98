// crates/geomark-core/src/geocoding/gazetteer.rs

//! # Offline gazetteer
//!
//! A [`GeocodeClient`] over an in-memory place list. The bundled list is
//! embedded at compile time and parsed once per process; custom lists can be
//! loaded from a JSON file with the same shape.
//!
//! Matching is accent- and case-insensitive (see [`fold_key`]). Scores:
//!
//! | match                          | score |
//! |--------------------------------|-------|
//! | full label equals query        | 50    |
//! | name or alias equals query     | 45    |
//! | name or alias starts with it   | 40    |
//! | a later word starts with it    | 35    |
//! | label contains it              | 20    |
//!
//! Suggestions inside the search bias get +10; ties go to the place closest
//! to the bias center. Forward lookups break ties by population.

use super::{GeocodeCandidate, GeocodeClient, Suggestion, SuggestionId};
use crate::error::{MapError, Result};
use crate::geo::{Coordinate, SearchBias};
use crate::text::fold_key;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

static EMBEDDED_PLACES: &str = include_str!("../../data/places.json");

// Parse the embedded list once per process.
static EMBEDDED_CACHE: OnceCell<Arc<[Place]>> = OnceCell::new();

const DEFAULT_MAX_RESULTS: usize = 5;
const BIAS_BONUS: u32 = 10;
/// Reverse lookups further than this from any place find nothing.
const REVERSE_RADIUS_METERS: f64 = 30_000.0;

/// Raw place record as stored in JSON.
#[derive(Debug, Deserialize)]
struct PlaceRaw {
    name: String,
    #[serde(default)]
    region: Option<String>,
    country: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    population: Option<u64>,
    #[serde(default)]
    aliases: Vec<String>,
}

/// A named place with precomputed folded keys.
#[derive(Debug, Clone)]
pub struct Place {
    pub name: String,
    pub label: String,
    pub position: Coordinate,
    pub population: u64,
    keys: Vec<String>,
    folded_label: String,
}

impl Place {
    fn from_raw(raw: PlaceRaw) -> Result<Self> {
        let position = Coordinate::new(raw.latitude, raw.longitude)?;
        let label = match &raw.region {
            Some(region) if region != &raw.name => format!("{}, {}, {}", raw.name, region, raw.country),
            _ => format!("{}, {}", raw.name, raw.country),
        };
        let keys = std::iter::once(&raw.name)
            .chain(raw.aliases.iter())
            .map(|s| fold_key(s))
            .collect();
        Ok(Self {
            folded_label: fold_key(&label),
            name: raw.name,
            label,
            position,
            population: raw.population.unwrap_or(0),
            keys,
        })
    }

    /// Relevance of this place for an already folded query. 0 = no match.
    fn score(&self, q: &str) -> u32 {
        if q.is_empty() {
            return 0;
        }
        if self.folded_label == q {
            return 50;
        }
        let mut score = 0;
        for key in &self.keys {
            if key == q {
                return 45;
            }
            if key.starts_with(q) {
                score = score.max(40);
            } else if key.split(' ').skip(1).any(|word| word.starts_with(q)) {
                score = score.max(35);
            }
        }
        if score == 0 && self.folded_label.contains(q) {
            score = 20;
        }
        score
    }
}

fn parse_places(json: &str) -> Result<Vec<Place>> {
    let raw: Vec<PlaceRaw> = serde_json::from_str(json)?;
    raw.into_iter().map(Place::from_raw).collect()
}

#[derive(Debug, Clone)]
pub struct Gazetteer {
    places: Arc<[Place]>,
    max_results: usize,
}

impl Gazetteer {
    /// The bundled place list.
    pub fn embedded() -> Result<Self> {
        let places = EMBEDDED_CACHE
            .get_or_try_init(|| parse_places(EMBEDDED_PLACES).map(Arc::from))?
            .clone();
        Ok(Self::from_shared(places))
    }

    /// Loads a place list from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MapError::NotFound(format!("place list not found at {}: {}", path.display(), e))
        })?;
        let places = parse_places(&json)?;
        tracing::debug!(path = %path.display(), places = places.len(), "gazetteer loaded");
        Ok(Self::from_shared(places.into()))
    }

    fn from_shared(places: Arc<[Place]>) -> Self {
        Self {
            places,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    fn suggestion_id(index: usize) -> SuggestionId {
        SuggestionId::new(format!("g{index}"))
    }

    /// Ranked `(index, score)` pairs for a suggestion prefix.
    fn rank_biased(&self, prefix: &str, bias: &SearchBias) -> Vec<(usize, u32, f64)> {
        let q = fold_key(prefix);
        let mut hits: Vec<(usize, u32, f64)> = self
            .places
            .iter()
            .enumerate()
            .filter_map(|(i, place)| {
                let score = place.score(&q);
                if score == 0 {
                    return None;
                }
                let distance = bias.center.distance_to(&place.position);
                let bonus = if distance <= bias.radius_meters { BIAS_BONUS } else { 0 };
                Some((i, score + bonus, distance))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(self.max_results);
        hits
    }
}

#[async_trait]
impl GeocodeClient for Gazetteer {
    async fn forward(&self, address: &str) -> Result<Vec<GeocodeCandidate>> {
        let q = fold_key(address);
        // "Boston, Massachusetts" -> try the full text, then the leading name
        let head = q.split(',').next().unwrap_or("").trim().to_string();

        let mut hits: Vec<(&Place, u32)> = self
            .places
            .iter()
            .filter_map(|place| {
                let score = place.score(&q).max(place.score(&head));
                (score > 0).then_some((place, score))
            })
            .collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.population.cmp(&a.0.population)));

        Ok(hits
            .into_iter()
            .take(self.max_results)
            .map(|(place, _)| GeocodeCandidate {
                coordinate: place.position,
                label: place.label.clone(),
            })
            .collect())
    }

    async fn suggest(&self, prefix: &str, bias: &SearchBias) -> Result<Vec<Suggestion>> {
        Ok(self
            .rank_biased(prefix, bias)
            .into_iter()
            .map(|(i, _, _)| Suggestion {
                id: Self::suggestion_id(i),
                label: self.places[i].label.clone(),
            })
            .collect())
    }

    async fn reverse(&self, position: Coordinate) -> Result<String> {
        self.places
            .iter()
            .map(|p| (p, p.position.distance_to(&position)))
            .filter(|(_, d)| *d <= REVERSE_RADIUS_METERS)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .map(|(p, _)| p.label.clone())
            .ok_or_else(|| MapError::NoResults(position.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bias_at(lat: f64, lon: f64) -> SearchBias {
        SearchBias {
            center: Coordinate::new(lat, lon).unwrap(),
            radius_meters: 200_000.0,
        }
    }

    #[tokio::test]
    async fn suggestions_prefer_bias_region() {
        let gz = Gazetteer::embedded().unwrap();

        let near_boston = gz.suggest("bost", &bias_at(42.36, -71.06)).await.unwrap();
        assert!(near_boston[0].label.contains("Massachusetts"), "{near_boston:?}");

        let near_london = gz.suggest("bost", &bias_at(51.5, -0.12)).await.unwrap();
        assert!(near_london[0].label.contains("United Kingdom"), "{near_london:?}");
    }

    #[tokio::test]
    async fn matching_ignores_accents_and_aliases() {
        let gz = Gazetteer::embedded().unwrap();
        let hits = gz.forward("zurich").await.unwrap();
        assert!(hits[0].label.starts_with("Zürich"));

        let hits = gz.forward("Munich").await.unwrap();
        assert!(hits[0].label.starts_with("München"));

        let hits = gz.forward("LODZ").await.unwrap();
        assert!(hits[0].label.starts_with("Łódź"));
    }

    #[tokio::test]
    async fn forward_accepts_full_labels() {
        let gz = Gazetteer::embedded().unwrap();
        let hits = gz.forward("Portland, Oregon, United States").await.unwrap();
        assert_eq!(hits[0].label, "Portland, Oregon, United States");

        // bare name: the larger city ranks first
        let hits = gz.forward("Portland").await.unwrap();
        assert!(hits[0].label.contains("Oregon"));
    }

    #[tokio::test]
    async fn empty_and_unknown_queries() {
        let gz = Gazetteer::embedded().unwrap();
        assert!(gz.suggest("   ", &bias_at(0.0, 0.0)).await.unwrap().is_empty());
        assert!(gz.forward("atlantis").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_results_is_respected() {
        let gz = Gazetteer::embedded().unwrap().with_max_results(2);
        let hits = gz.suggest("a", &bias_at(0.0, 0.0)).await.unwrap();
        assert!(hits.len() <= 2);
    }

    #[tokio::test]
    async fn reverse_finds_nearby_place_only() {
        let gz = Gazetteer::embedded().unwrap();
        let label = gz.reverse(Coordinate::new(42.35, -71.07).unwrap()).await.unwrap();
        assert!(label.starts_with("Boston"));

        let far = gz.reverse(Coordinate::new(0.0, -150.0).unwrap()).await;
        assert!(matches!(far, Err(MapError::NoResults(_))));
    }
}

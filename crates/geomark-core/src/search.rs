// crates/geomark-core/src/search.rs

//! # Search session
//!
//! The text -> suggestions -> coordinate pipeline, as a state machine over
//! [`SearchStatus`]:
//!
//! ```text
//! Idle ----(edit, non-empty)----> Loading
//! Loading --(suggestions)-------> Ready
//! Loading --(error / timeout)---> Error
//! Loading|Ready|Error --(edit)--> Loading      new token, older responses dropped
//! any -----(edit to blank)------> Idle
//! Ready ---(select)-------------> Resolving
//! Resolving --(candidates)------> Idle         text = selected label
//! Resolving --(error / none)----> Error
//! ```
//!
//! The session never performs I/O while mutating. Each request is returned
//! as a value carrying a [`RequestToken`]; the caller runs the matching task
//! future ([`SearchSession::suggest_task`], [`SearchSession::resolve_task`])
//! and feeds the [`SearchCompletion`] back through [`SearchSession::apply`].
//! Only a completion carrying the latest token can change state.

use crate::error::{MapError, Result};
use crate::geo::SearchBias;
use crate::geocoding::{GeocodeCandidate, GeocodeClient};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use crate::geocoding::{Suggestion, SuggestionId};

/// Identity of one issued search request. Later requests have larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    Loading,
    Ready,
    Resolving,
    Error(String),
}

/// Everything the search box shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub text: String,
    pub suggestions: Vec<Suggestion>,
    pub status: SearchStatus,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            suggestions: Vec::new(),
            status: SearchStatus::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub bias: SearchBias,
    pub debounce: Duration,
    pub timeout: Duration,
}

/// A suggestion lookup to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub token: RequestToken,
    pub prefix: String,
}

/// A forward geocode to run for a selected suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub token: RequestToken,
    pub address: String,
}

/// Result of a search task, fed back into [`SearchSession::apply`].
#[derive(Debug)]
pub enum SearchCompletion {
    Suggestions {
        token: RequestToken,
        result: Result<Vec<Suggestion>>,
    },
    Resolved {
        token: RequestToken,
        result: Result<Vec<GeocodeCandidate>>,
    },
    /// A newer edit arrived during the debounce window; no call was made.
    Superseded { token: RequestToken },
}

/// What [`SearchSession::apply`] did with a completion.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Stale or superseded; state untouched.
    Ignored,
    /// New suggestions are showing.
    Updated,
    /// The selection resolved to its first-ranked candidate.
    Resolved(GeocodeCandidate),
    Failed(MapError),
}

pub struct SearchSession {
    client: Arc<dyn GeocodeClient>,
    options: SearchOptions,
    query: SearchQuery,
    // Shared with in-flight tasks so a debounced call can see it was superseded.
    latest: Arc<AtomicU64>,
    changed: bool,
}

impl SearchSession {
    pub fn new(client: Arc<dyn GeocodeClient>, options: SearchOptions) -> Self {
        Self {
            client,
            options,
            query: SearchQuery::default(),
            latest: Arc::new(AtomicU64::new(0)),
            changed: false,
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn status(&self) -> &SearchStatus {
        &self.query.status
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }

    fn next_token(&mut self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
    }

    fn set_status(&mut self, status: SearchStatus) {
        self.query.status = status;
        self.changed = true;
    }

    /// Text in the search box changed.
    ///
    /// Returns the lookup to run, or `None` when the text is blank. Either
    /// way every earlier request is superseded.
    pub fn edit_text(&mut self, text: &str) -> Option<SuggestRequest> {
        self.query.text = text.to_string();
        self.query.suggestions.clear();
        let token = self.next_token();

        let prefix = text.trim();
        if prefix.is_empty() {
            self.set_status(SearchStatus::Idle);
            tracing::debug!(%token, "search cleared");
            return None;
        }

        self.set_status(SearchStatus::Loading);
        tracing::debug!(%token, prefix, "search loading");
        Some(SuggestRequest {
            token,
            prefix: prefix.to_string(),
        })
    }

    /// Picks a suggestion from the `Ready` list and starts resolving it.
    ///
    /// Fails without changing state if nothing is showing or `id` is not in
    /// the current list.
    pub fn select_suggestion(&mut self, id: &SuggestionId) -> Result<ResolveRequest> {
        if self.query.status != SearchStatus::Ready {
            return Err(MapError::NothingToSelect);
        }
        let chosen = self
            .query
            .suggestions
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| MapError::UnknownSuggestion(id.clone()))?;

        let token = self.next_token();
        self.query.text = chosen.label.clone();
        self.query.suggestions.clear();
        self.set_status(SearchStatus::Resolving);
        tracing::debug!(%token, id = %chosen.id, label = %chosen.label, "search resolving");
        Ok(ResolveRequest {
            token,
            address: chosen.label,
        })
    }

    /// Abandons the search: blank text, no suggestions, nothing in flight.
    pub fn reset(&mut self) {
        self.next_token();
        self.query = SearchQuery::default();
        self.changed = true;
    }

    /// Future that performs the (debounced, time-bounded) suggestion lookup.
    pub fn suggest_task(&self, request: SuggestRequest) -> impl Future<Output = SearchCompletion> + Send + 'static {
        let client = self.client.clone();
        let latest = self.latest.clone();
        let SearchOptions {
            bias,
            debounce,
            timeout,
        } = self.options.clone();

        async move {
            let token = request.token;
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
                if latest.load(Ordering::Acquire) != token.0 {
                    return SearchCompletion::Superseded { token };
                }
            }
            let result = match tokio::time::timeout(timeout, client.suggest(&request.prefix, &bias)).await {
                Ok(result) => result,
                Err(_) => Err(MapError::Timeout(timeout)),
            };
            SearchCompletion::Suggestions { token, result }
        }
    }

    /// Future that performs the time-bounded forward geocode.
    pub fn resolve_task(&self, request: ResolveRequest) -> impl Future<Output = SearchCompletion> + Send + 'static {
        let client = self.client.clone();
        let timeout = self.options.timeout;

        async move {
            let result = match tokio::time::timeout(timeout, client.forward(&request.address)).await {
                Ok(result) => result,
                Err(_) => Err(MapError::Timeout(timeout)),
            };
            SearchCompletion::Resolved {
                token: request.token,
                result,
            }
        }
    }

    /// Applies a finished task. Completions for superseded tokens are dropped.
    pub fn apply(&mut self, completion: SearchCompletion) -> SearchOutcome {
        match completion {
            SearchCompletion::Superseded { token } => {
                tracing::trace!(%token, "debounced request skipped");
                SearchOutcome::Ignored
            }

            SearchCompletion::Suggestions { token, result } => {
                if !self.is_current(token) || self.query.status != SearchStatus::Loading {
                    tracing::debug!(%token, "stale suggestions discarded");
                    return SearchOutcome::Ignored;
                }
                match result {
                    Ok(suggestions) => {
                        tracing::debug!(%token, count = suggestions.len(), "suggestions ready");
                        self.query.suggestions = suggestions;
                        self.set_status(SearchStatus::Ready);
                        SearchOutcome::Updated
                    }
                    Err(e) => {
                        tracing::warn!(%token, error = %e, "suggestion lookup failed");
                        self.set_status(SearchStatus::Error(e.to_string()));
                        SearchOutcome::Failed(e)
                    }
                }
            }

            SearchCompletion::Resolved { token, result } => {
                if !self.is_current(token) || self.query.status != SearchStatus::Resolving {
                    tracing::debug!(%token, "stale resolution discarded");
                    return SearchOutcome::Ignored;
                }
                // first-ranked candidate wins; none at all is an error
                let address = self.query.text.clone();
                match result.and_then(|candidates| {
                    candidates
                        .into_iter()
                        .next()
                        .ok_or(MapError::NoResults(address))
                }) {
                    Ok(best) => {
                        tracing::debug!(%token, position = %best.coordinate, "search resolved");
                        self.set_status(SearchStatus::Idle);
                        SearchOutcome::Resolved(best)
                    }
                    Err(e) => {
                        tracing::warn!(%token, error = %e, "search resolution failed");
                        self.set_status(SearchStatus::Error(e.to_string()));
                        SearchOutcome::Failed(e)
                    }
                }
            }
        }
    }

    /// Marks a resolution that could not be shown (e.g. the pan was rejected)
    /// as failed. Only valid right after [`SearchOutcome::Resolved`].
    pub fn fail_resolution(&mut self, error: &MapError) {
        if self.query.status != SearchStatus::Idle {
            return;
        }
        tracing::warn!(error = %error, "resolved search could not be shown");
        self.set_status(SearchStatus::Error(error.to_string()));
    }

    /// Whether the query changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::geocoding::gazetteer::Gazetteer;

    fn session() -> SearchSession {
        let center = Coordinate::new(42.36, -71.06).unwrap();
        SearchSession::new(
            Arc::new(Gazetteer::embedded().unwrap()),
            SearchOptions {
                bias: SearchBias {
                    center,
                    radius_meters: 200_000.0,
                },
                debounce: Duration::ZERO,
                timeout: Duration::from_secs(1),
            },
        )
    }

    fn suggestion(id: &str, label: &str) -> Suggestion {
        Suggestion {
            id: SuggestionId::new(id),
            label: label.to_string(),
        }
    }

    fn candidate(lat: f64, lon: f64) -> GeocodeCandidate {
        GeocodeCandidate {
            coordinate: Coordinate::new(lat, lon).unwrap(),
            label: format!("{lat},{lon}"),
        }
    }

    fn ready_with(s: &mut SearchSession, items: Vec<Suggestion>) {
        let req = s.edit_text("bos").unwrap();
        let outcome = s.apply(SearchCompletion::Suggestions {
            token: req.token,
            result: Ok(items),
        });
        assert!(matches!(outcome, SearchOutcome::Updated));
    }

    #[test]
    fn edit_moves_to_loading_and_blank_back_to_idle() {
        let mut s = session();
        assert_eq!(s.status(), &SearchStatus::Idle);

        let req = s.edit_text("  bos ").unwrap();
        assert_eq!(req.prefix, "bos");
        assert_eq!(s.status(), &SearchStatus::Loading);

        assert!(s.edit_text("   ").is_none());
        assert_eq!(s.status(), &SearchStatus::Idle);

        // the blanked request can no longer land
        let late = s.apply(SearchCompletion::Suggestions {
            token: req.token,
            result: Ok(vec![suggestion("a", "A")]),
        });
        assert!(matches!(late, SearchOutcome::Ignored));
        assert!(s.query().suggestions.is_empty());
    }

    #[test]
    fn later_request_wins_regardless_of_arrival_order() {
        let mut s = session();
        let first = s.edit_text("bo").unwrap();
        let second = s.edit_text("bos").unwrap();
        assert!(second.token > first.token);

        // second lands first, then the first straggles in
        s.apply(SearchCompletion::Suggestions {
            token: second.token,
            result: Ok(vec![suggestion("2", "second")]),
        });
        let late = s.apply(SearchCompletion::Suggestions {
            token: first.token,
            result: Ok(vec![suggestion("1", "first")]),
        });
        assert!(matches!(late, SearchOutcome::Ignored));
        assert_eq!(s.query().suggestions, vec![suggestion("2", "second")]);
        assert_eq!(s.status(), &SearchStatus::Ready);
    }

    #[test]
    fn earlier_response_while_later_pending_is_dropped() {
        let mut s = session();
        let first = s.edit_text("bo").unwrap();
        let _second = s.edit_text("bos").unwrap();

        s.apply(SearchCompletion::Suggestions {
            token: first.token,
            result: Ok(vec![suggestion("1", "first")]),
        });
        assert_eq!(s.status(), &SearchStatus::Loading);
        assert!(s.query().suggestions.is_empty());
    }

    #[test]
    fn provider_error_moves_to_error_and_edit_recovers() {
        let mut s = session();
        let req = s.edit_text("bos").unwrap();
        let outcome = s.apply(SearchCompletion::Suggestions {
            token: req.token,
            result: Err(MapError::Geocode("503".into())),
        });
        assert!(matches!(outcome, SearchOutcome::Failed(MapError::Geocode(_))));
        assert!(matches!(s.status(), SearchStatus::Error(_)));

        s.edit_text("bost").unwrap();
        assert_eq!(s.status(), &SearchStatus::Loading);
    }

    #[test]
    fn select_resolves_to_first_candidate() {
        let mut s = session();
        ready_with(&mut s, vec![suggestion("a", "Boston, MA"), suggestion("b", "Boston, UK")]);

        let req = s.select_suggestion(&SuggestionId::new("a")).unwrap();
        assert_eq!(req.address, "Boston, MA");
        assert_eq!(s.status(), &SearchStatus::Resolving);
        assert!(s.query().suggestions.is_empty());

        let outcome = s.apply(SearchCompletion::Resolved {
            token: req.token,
            result: Ok(vec![candidate(42.36, -71.06), candidate(52.97, -0.02)]),
        });
        match outcome {
            SearchOutcome::Resolved(best) => {
                assert_eq!(best.coordinate, Coordinate::new(42.36, -71.06).unwrap())
            }
            other => panic!("expected resolution, got {other:?}"),
        }
        assert_eq!(s.status(), &SearchStatus::Idle);
        assert_eq!(s.query().text, "Boston, MA");
    }

    #[test]
    fn zero_candidates_is_an_error() {
        let mut s = session();
        ready_with(&mut s, vec![suggestion("a", "Nowhere")]);
        let req = s.select_suggestion(&SuggestionId::new("a")).unwrap();
        let outcome = s.apply(SearchCompletion::Resolved {
            token: req.token,
            result: Ok(vec![]),
        });
        assert!(matches!(outcome, SearchOutcome::Failed(MapError::NoResults(_))));
        assert!(matches!(s.status(), SearchStatus::Error(_)));
    }

    #[test]
    fn bad_selection_changes_nothing() {
        let mut s = session();
        assert!(matches!(
            s.select_suggestion(&SuggestionId::new("a")),
            Err(MapError::NothingToSelect)
        ));

        ready_with(&mut s, vec![suggestion("a", "A")]);
        let before = s.query().clone();
        assert!(matches!(
            s.select_suggestion(&SuggestionId::new("zzz")),
            Err(MapError::UnknownSuggestion(_))
        ));
        assert_eq!(s.query(), &before);
    }

    #[test]
    fn edit_during_resolution_discards_the_resolution() {
        let mut s = session();
        ready_with(&mut s, vec![suggestion("a", "A")]);
        let req = s.select_suggestion(&SuggestionId::new("a")).unwrap();
        s.edit_text("other").unwrap();

        let outcome = s.apply(SearchCompletion::Resolved {
            token: req.token,
            result: Ok(vec![candidate(1.0, 1.0)]),
        });
        assert!(matches!(outcome, SearchOutcome::Ignored));
        assert_eq!(s.status(), &SearchStatus::Loading);
    }

    #[test]
    fn unshown_resolution_becomes_an_error() {
        let mut s = session();
        ready_with(&mut s, vec![suggestion("a", "A")]);
        let req = s.select_suggestion(&SuggestionId::new("a")).unwrap();
        s.apply(SearchCompletion::Resolved {
            token: req.token,
            result: Ok(vec![candidate(1.0, 1.0)]),
        });
        assert_eq!(s.status(), &SearchStatus::Idle);

        s.fail_resolution(&MapError::SurfaceNotReady);
        assert!(matches!(s.status(), SearchStatus::Error(_)));

        // a search already in progress is left alone
        s.edit_text("b").unwrap();
        s.fail_resolution(&MapError::SurfaceNotReady);
        assert_eq!(s.status(), &SearchStatus::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_task_skips_superseded_requests() {
        let mut s = session();
        s.options.debounce = Duration::from_millis(200);

        let first = s.edit_text("bo").unwrap();
        let task = s.suggest_task(first.clone());
        s.edit_text("bos").unwrap();

        match task.await {
            SearchCompletion::Superseded { token } => assert_eq!(token, first.token),
            other => panic!("expected superseded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn suggest_task_uses_the_provider() {
        let mut s = session();
        let req = s.edit_text("Bost").unwrap();
        let completion = s.suggest_task(req).await;
        assert!(matches!(s.apply(completion), SearchOutcome::Updated));
        assert!(s.query().suggestions[0].label.contains("Massachusetts"));
    }
}

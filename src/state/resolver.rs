/// Image URL resolution state machine
///
/// Tracks which (property, image keys) pair was last observed, issues a
/// resolution request whenever that pair changes, and applies completed
/// requests under a last-request-wins rule: a result belonging to a
/// superseded request is discarded, so the URL map and state always match
/// the most recently observed inputs.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::data::{ResolutionState, UrlMap};
use crate::service::ServiceError;

/// Separator used to fingerprint an observed input pair.
/// U+001F cannot appear in property ids or storage object keys.
const FINGERPRINT_SEPARATOR: char = '\u{1f}';

/// Shown when a service failure carries no message of its own
const GENERIC_FAILURE_MESSAGE: &str = "Failed to load property images";

/// Ties a completion back to the request that produced it.
///
/// Each issued request gets a fresh token; only the completion whose token
/// still matches the resolver's latest request may mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveToken(u64);

/// A resolution request issued by [`ImageUrlResolver::resolve`].
///
/// The caller runs this against a property image service and feeds the
/// outcome back through [`ImageUrlResolver::complete`] together with the
/// token.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub token: ResolveToken,
    pub property_id: String,
    pub image_keys: Vec<String>,
}

/// Resolver state: the URL map, the lifecycle state, and the last error
pub struct ImageUrlResolver {
    urls: UrlMap,
    state: ResolutionState,
    error: Option<String>,
    /// Instant of the last successful resolution (URLs expire; callers
    /// that manage expiry need the issuance time)
    resolved_at: Option<DateTime<Utc>>,
    /// Fingerprint of the last observed input pair
    last_inputs: Option<String>,
    /// Generation of the latest issued request; completions carrying an
    /// older generation are stale
    generation: u64,
}

impl ImageUrlResolver {
    /// Create an idle resolver with an empty URL map
    pub fn new() -> Self {
        ImageUrlResolver {
            urls: UrlMap::new(),
            state: ResolutionState::Idle,
            error: None,
            resolved_at: None,
            last_inputs: None,
            generation: 0,
        }
    }

    /// Observe the current inputs and decide whether to resolve.
    ///
    /// # Arguments
    /// * `property_id` - Identifier of the property owning the images
    /// * `image_keys` - Storage keys to resolve (order is display-only)
    ///
    /// # Returns
    /// * `Some(request)` - Both inputs are non-empty and differ from the
    ///   last observed pair; the resolver is now Loading and the caller
    ///   must run the request against the service
    /// * `None` - Inputs are unchanged (nothing to do) or one of them is
    ///   empty (the resolver reset itself to Idle, no service call)
    pub fn resolve(&mut self, property_id: &str, image_keys: &[String]) -> Option<ResolveRequest> {
        if property_id.is_empty() || image_keys.is_empty() {
            // Not an error: an empty pair simply means "nothing to show"
            if self.last_inputs.is_some() || self.state != ResolutionState::Idle {
                self.reset();
            }
            return None;
        }

        let fingerprint = fingerprint(property_id, image_keys);
        if self.last_inputs.as_deref() == Some(fingerprint.as_str()) {
            // Same pair as last time, the current state already covers it
            return None;
        }

        self.last_inputs = Some(fingerprint);
        self.generation += 1;
        self.state = ResolutionState::Loading;
        self.error = None;

        debug!(property_id, keys = image_keys.len(), "resolving image urls");

        Some(ResolveRequest {
            token: ResolveToken(self.generation),
            property_id: property_id.to_string(),
            image_keys: image_keys.to_vec(),
        })
    }

    /// Apply a finished service call.
    ///
    /// Returns true when the outcome was applied, false when it was stale
    /// (its token no longer matches the latest request) and discarded.
    pub fn complete(&mut self, token: ResolveToken, outcome: Result<UrlMap, ServiceError>) -> bool {
        if token.0 != self.generation {
            debug!("discarding stale image url result");
            return false;
        }

        match outcome {
            Ok(urls) => {
                debug!(resolved = urls.len(), "image urls resolved");
                self.urls = urls;
                self.state = ResolutionState::Ready;
                self.error = None;
                self.resolved_at = Some(Utc::now());
            }
            Err(err) => {
                // Keep the previous map so already-displayed images
                // survive a transient refresh failure
                let message = err.to_string();
                let message = if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                warn!(error = %message, "image url resolution failed");
                self.state = ResolutionState::Error;
                self.error = Some(message);
            }
        }

        true
    }

    /// Resolved URL for a key, or `""` when it is not (yet) available.
    ///
    /// An empty string is "not yet available", never an error: the key may
    /// still be loading, may have failed, or may not be resolvable at all.
    pub fn lookup(&self, image_key: &str) -> &str {
        self.urls.get(image_key).map(String::as_str).unwrap_or("")
    }

    /// Forget the last observed pair so the next [`resolve`] call with the
    /// same inputs issues a fresh request. This is the retry trigger for
    /// callers that want to refresh without changing inputs.
    ///
    /// [`resolve`]: ImageUrlResolver::resolve
    pub fn invalidate(&mut self) {
        self.last_inputs = None;
    }

    /// Clear everything back to the initial Idle state.
    /// Bumps the generation first so any in-flight request becomes stale.
    fn reset(&mut self) {
        self.generation += 1;
        self.last_inputs = None;
        self.urls.clear();
        self.state = ResolutionState::Idle;
        self.error = None;
        self.resolved_at = None;
    }

    // ========== Accessors ==========

    /// The current URL map (only successfully resolved keys)
    pub fn urls(&self) -> &UrlMap {
        &self.urls
    }

    /// The current lifecycle state
    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// Message of the last failure, if the state is Error
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Instant of the last successful resolution
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }
}

impl Default for ImageUrlResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable value fingerprint of an input pair
fn fingerprint(property_id: &str, image_keys: &[String]) -> String {
    let mut joined = String::from(property_id);
    for key in image_keys {
        joined.push(FINGERPRINT_SEPARATOR);
        joined.push_str(key);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|k| k.to_string()).collect()
    }

    fn url_map(entries: &[(&str, &str)]) -> UrlMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_inputs_reset_without_request() {
        let mut resolver = ImageUrlResolver::new();

        assert!(resolver.resolve("", &keys(&["a"])).is_none());
        assert_eq!(resolver.state(), ResolutionState::Idle);

        assert!(resolver.resolve("prop-1", &[]).is_none());
        assert_eq!(resolver.state(), ResolutionState::Idle);
        assert!(resolver.urls().is_empty());
    }

    #[test]
    fn test_empty_inputs_clear_previous_urls() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(request.token, Ok(url_map(&[("a", "https://u/a")]))));
        assert_eq!(resolver.lookup("a"), "https://u/a");

        assert!(resolver.resolve("", &keys(&["a"])).is_none());
        assert_eq!(resolver.state(), ResolutionState::Idle);
        assert!(resolver.urls().is_empty());
        assert_eq!(resolver.lookup("a"), "");
        assert!(resolver.resolved_at().is_none());
    }

    #[test]
    fn test_partial_result_is_not_an_error() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a", "b"])).unwrap();
        assert_eq!(resolver.state(), ResolutionState::Loading);

        // The service only knew about "a"; "b" is simply absent
        assert!(resolver.complete(request.token, Ok(url_map(&[("a", "urlA")]))));
        assert_eq!(resolver.state(), ResolutionState::Ready);
        assert_eq!(resolver.lookup("a"), "urlA");
        assert_eq!(resolver.lookup("b"), "");
        assert_eq!(resolver.urls().len(), 1);
        assert!(resolver.resolved_at().is_some());
    }

    #[test]
    fn test_failure_preserves_previous_urls() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(request.token, Ok(url_map(&[("a", "urlA")]))));

        // A later refresh of the same property fails
        resolver.invalidate();
        let retry = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(retry.token, Err(ServiceError::Timeout)));

        assert_eq!(resolver.state(), ResolutionState::Error);
        assert!(!resolver.error_message().unwrap().is_empty());
        // Last-known-good URLs stay visible
        assert_eq!(resolver.lookup("a"), "urlA");
    }

    #[test]
    fn test_unchanged_pair_is_not_reissued() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a", "b"])).unwrap();
        assert!(resolver.resolve("prop-1", &keys(&["a", "b"])).is_none());

        assert!(resolver.complete(request.token, Ok(url_map(&[("a", "urlA")]))));

        // Still the same pair after settling: no new request either
        assert!(resolver.resolve("prop-1", &keys(&["a", "b"])).is_none());
        assert_eq!(resolver.state(), ResolutionState::Ready);
    }

    #[test]
    fn test_changed_keys_trigger_new_request() {
        let mut resolver = ImageUrlResolver::new();

        let first = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(first.token, Ok(url_map(&[("a", "urlA")]))));

        let second = resolver.resolve("prop-1", &keys(&["a", "b"]));
        assert!(second.is_some());
        assert_eq!(resolver.state(), ResolutionState::Loading);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut resolver = ImageUrlResolver::new();

        let first = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        // Inputs change before the first request settles
        let second = resolver.resolve("prop-2", &keys(&["b"])).unwrap();

        // The first result arrives late and must not be applied
        assert!(!resolver.complete(first.token, Ok(url_map(&[("a", "urlOld")]))));
        assert_eq!(resolver.state(), ResolutionState::Loading);
        assert_eq!(resolver.lookup("a"), "");

        assert!(resolver.complete(second.token, Ok(url_map(&[("b", "urlB")]))));
        assert_eq!(resolver.state(), ResolutionState::Ready);
        assert_eq!(resolver.lookup("b"), "urlB");
        assert_eq!(resolver.lookup("a"), "");
    }

    #[test]
    fn test_reset_supersedes_in_flight_request() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        // Caller navigated away: inputs became empty while loading
        assert!(resolver.resolve("", &[]).is_none());
        assert_eq!(resolver.state(), ResolutionState::Idle);

        // The in-flight result is now stale
        assert!(!resolver.complete(request.token, Ok(url_map(&[("a", "urlA")]))));
        assert_eq!(resolver.state(), ResolutionState::Idle);
        assert!(resolver.urls().is_empty());
    }

    #[test]
    fn test_loading_clears_error_but_keeps_urls() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(request.token, Ok(url_map(&[("a", "urlA")]))));

        resolver.invalidate();
        let retry = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(retry.token, Err(ServiceError::Timeout)));
        assert!(resolver.state().is_error());

        // Issuing the next request clears the error, not the URLs
        let next = resolver.resolve("prop-1", &keys(&["a", "b"])).unwrap();
        assert_eq!(resolver.state(), ResolutionState::Loading);
        assert!(resolver.error_message().is_none());
        assert_eq!(resolver.lookup("a"), "urlA");

        assert!(resolver.complete(next.token, Ok(url_map(&[("b", "urlB")]))));
        // Wholesale replacement: "a" is gone after the new pass
        assert_eq!(resolver.lookup("a"), "");
        assert_eq!(resolver.lookup("b"), "urlB");
    }

    #[test]
    fn test_invalidate_reissues_same_pair() {
        let mut resolver = ImageUrlResolver::new();

        let request = resolver.resolve("prop-1", &keys(&["a"])).unwrap();
        assert!(resolver.complete(request.token, Ok(url_map(&[("a", "urlA")]))));
        assert!(resolver.resolve("prop-1", &keys(&["a"])).is_none());

        resolver.invalidate();
        assert!(resolver.resolve("prop-1", &keys(&["a"])).is_some());
    }

    #[test]
    fn test_key_order_is_part_of_the_pair() {
        let mut resolver = ImageUrlResolver::new();

        let first = resolver.resolve("prop-1", &keys(&["a", "b"])).unwrap();
        assert!(resolver.complete(first.token, Ok(url_map(&[("a", "urlA")]))));

        // A reordered key list is a different observed pair
        assert!(resolver.resolve("prop-1", &keys(&["b", "a"])).is_some());
    }
}

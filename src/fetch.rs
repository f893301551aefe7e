/// Async driver binding the resolver to a property image service
///
/// Feeding inputs spawns at most one service call per observed change;
/// completions come back over an internal channel and are applied on the
/// caller's thread, so all state mutation stays single-threaded. Dropping
/// the driver closes the channel and any still-running call finishes into
/// the void without touching state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::service::{PropertyImageService, ServiceError};
use crate::state::data::{ResolutionState, UrlMap};
use crate::state::resolver::{ImageUrlResolver, ResolveRequest, ResolveToken};

/// A finished service call routed back to the driver
struct Completion {
    token: ResolveToken,
    outcome: Result<UrlMap, ServiceError>,
}

/// Reactive handle over one property's image URLs.
///
/// Callers pass the current (property id, image keys) on every update
/// cycle via [`set_inputs`]; the driver decides whether a new resolution
/// is warranted, and [`poll`] applies whatever has finished since.
///
/// [`set_inputs`]: PropertyImages::set_inputs
/// [`poll`]: PropertyImages::poll
pub struct PropertyImages {
    resolver: ImageUrlResolver,
    service: Arc<dyn PropertyImageService>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl PropertyImages {
    pub fn new(service: Arc<dyn PropertyImageService>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        PropertyImages {
            resolver: ImageUrlResolver::new(),
            service,
            completions_tx,
            completions_rx,
        }
    }

    /// Observe the latest inputs; spawns a service call when they changed.
    ///
    /// Empty inputs reset the handle to Idle without a service call.
    pub fn set_inputs(&mut self, property_id: &str, image_keys: &[String]) {
        if let Some(request) = self.resolver.resolve(property_id, image_keys) {
            self.spawn(request);
        }
    }

    /// Run one issued request in the background
    fn spawn(&self, request: ResolveRequest) {
        let service = Arc::clone(&self.service);
        let completions_tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let outcome = service
                .get_property_image_urls(&request.property_id, &request.image_keys)
                .await;

            // The receiver is gone once the driver is dropped; the result
            // is discarded then
            let _ = completions_tx.send(Completion {
                token: request.token,
                outcome,
            });
        });
    }

    /// Apply any completions that are already waiting, without blocking.
    ///
    /// Returns true when at least one completion was applied (stale ones
    /// are consumed but do not count).
    pub fn poll(&mut self) -> bool {
        let mut applied = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.resolver.complete(completion.token, completion.outcome) {
                applied = true;
            }
        }
        applied
    }

    /// Wait until the latest request settles.
    ///
    /// Applies completions as they arrive (discarding stale ones) until
    /// the resolver leaves Loading, then returns the settled state. When
    /// nothing is in flight this returns immediately.
    pub async fn settled(&mut self) -> ResolutionState {
        while self.resolver.state().is_loading() {
            match self.completions_rx.recv().await {
                Some(completion) => {
                    self.resolver.complete(completion.token, completion.outcome);
                }
                // Unreachable while we hold a sender, but don't spin
                None => break,
            }
        }
        self.resolver.state()
    }

    // ========== Pass-through accessors ==========

    /// Resolved URL for a key, or `""` when not (yet) available
    pub fn lookup(&self, image_key: &str) -> &str {
        self.resolver.lookup(image_key)
    }

    /// The current URL map
    pub fn urls(&self) -> &UrlMap {
        self.resolver.urls()
    }

    /// The current lifecycle state
    pub fn state(&self) -> ResolutionState {
        self.resolver.state()
    }

    /// Message of the last failure, if the state is Error
    pub fn error_message(&self) -> Option<&str> {
        self.resolver.error_message()
    }

    /// Instant of the last successful resolution
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolver.resolved_at()
    }

    /// Force the next [`set_inputs`] call to re-resolve an unchanged pair
    ///
    /// [`set_inputs`]: PropertyImages::set_inputs
    pub fn invalidate(&mut self) {
        self.resolver.invalidate()
    }
}

/// Shared data structures for image URL resolution
///
/// These types represent the data that flows between the service layer
/// and the callers (typically a UI layer) observing a resolver.

use std::collections::HashMap;

/// Map from image key to its currently resolved access URL.
///
/// Contains only the keys that resolved successfully in the most recent
/// pass. It is replaced wholesale on success, never merged incrementally.
pub type UrlMap = HashMap<String, String>;

/// Lifecycle of one resolver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionState {
    /// No resolution requested (inputs empty or never supplied)
    #[default]
    Idle,
    /// A request is in flight for the latest observed inputs
    Loading,
    /// The latest request completed and the URL map is current
    Ready,
    /// The latest request failed; the previous URL map is retained
    Error,
}

impl ResolutionState {
    /// True while a request is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, ResolutionState::Loading)
    }

    /// True if the latest request failed
    pub fn is_error(&self) -> bool {
        matches!(self, ResolutionState::Error)
    }

    /// True once the latest request has settled (Ready or Error)
    pub fn is_settled(&self) -> bool {
        matches!(self, ResolutionState::Ready | ResolutionState::Error)
    }
}

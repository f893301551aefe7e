/// Property image service boundary
///
/// This module handles issuance of time-limited access URLs for stored
/// property images:
/// - The `PropertyImageService` trait consumed by the resolver
/// - The service error taxonomy
/// - An HTTP-backed implementation against the platform backend (http.rs)
/// - An in-memory implementation for tests and local work (memory.rs)

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub mod http;
pub mod memory;

/// Errors a property image service call can produce
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never reached the backend
    #[error("request failed: {0}")]
    Transport(String),
    /// The backend did not answer within the configured timeout
    #[error("request timed out")]
    Timeout,
    /// The backend answered with a non-success status
    #[error("backend rejected request ({status}): {message}")]
    Backend { status: u16, message: String },
    /// The response body was not the expected key-to-URL mapping
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Issues access URLs for a property's stored images.
///
/// A key absent from a successful result means "not resolvable", not an
/// error. Returned URLs are opaque to this crate; their expiry is managed
/// by whoever displays them.
#[async_trait]
pub trait PropertyImageService: Send + Sync {
    /// Resolve the given storage keys of one property to access URLs
    async fn get_property_image_urls(
        &self,
        property_id: &str,
        image_keys: &[String],
    ) -> Result<HashMap<String, String>, ServiceError>;
}

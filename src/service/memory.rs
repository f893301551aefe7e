/// In-memory property image service
///
/// Serves access URLs from a seeded table. Used by tests and local work
/// where no platform backend is running.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PropertyImageService, ServiceError};

/// Seeded (property, key) -> URL table behind a mutex
#[derive(Default)]
pub struct StaticImageService {
    urls: Mutex<HashMap<(String, String), String>>,
    fail_next: Mutex<Option<String>>,
}

impl StaticImageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one key -> URL entry for a property
    pub fn insert(&self, property_id: &str, image_key: &str, url: &str) {
        self.urls
            .lock()
            .expect("url table mutex should not be poisoned")
            .insert(
                (property_id.to_string(), image_key.to_string()),
                url.to_string(),
            );
    }

    /// Make the next call fail with the given message
    pub fn fail_next(&self, message: &str) {
        *self
            .fail_next
            .lock()
            .expect("failure flag mutex should not be poisoned") = Some(message.to_string());
    }
}

#[async_trait]
impl PropertyImageService for StaticImageService {
    async fn get_property_image_urls(
        &self,
        property_id: &str,
        image_keys: &[String],
    ) -> Result<HashMap<String, String>, ServiceError> {
        if let Some(message) = self
            .fail_next
            .lock()
            .expect("failure flag mutex should not be poisoned")
            .take()
        {
            return Err(ServiceError::Backend {
                status: 500,
                message,
            });
        }

        let table = self
            .urls
            .lock()
            .expect("url table mutex should not be poisoned");

        // Only the keys we know about; absence is not an error
        let mut resolved = HashMap::new();
        for key in image_keys {
            if let Some(url) = table.get(&(property_id.to_string(), key.clone())) {
                resolved.insert(key.clone(), url.clone());
            }
        }

        Ok(resolved)
    }
}

/// HTTP-backed property image service
///
/// Talks to the platform backend, which performs the actual presigned-URL
/// issuance against the storage bucket. This client only transports the
/// request and decodes the response; signing and expiry stay server-side.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{PropertyImageService, ServiceError};
use crate::config::ImageServiceConfig;

/// Request body for the image URL endpoint
#[derive(Serialize)]
struct UrlRequestBody<'a> {
    keys: &'a [String],
}

/// Service backed by the platform's HTTP API
pub struct HttpImageService {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpImageService {
    /// Build a client from the service configuration
    pub fn new(config: &ImageServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(HttpImageService {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Endpoint that issues access URLs for one property's images
    fn endpoint(&self, property_id: &str) -> String {
        format!("{}/properties/{}/image-urls", self.base_url, property_id)
    }
}

#[async_trait]
impl PropertyImageService for HttpImageService {
    async fn get_property_image_urls(
        &self,
        property_id: &str,
        image_keys: &[String],
    ) -> Result<HashMap<String, String>, ServiceError> {
        let mut request = self
            .client
            .post(self.endpoint(property_id))
            .json(&UrlRequestBody { keys: image_keys });

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout
            } else {
                ServiceError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let urls: HashMap<String, String> = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        debug!(property_id, resolved = urls.len(), "fetched image urls");

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ImageServiceConfig {
        ImageServiceConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            auth_token: None,
        }
    }

    #[test]
    fn test_endpoint_construction() {
        let service = HttpImageService::new(&config("https://api.listspace.ph")).unwrap();
        assert_eq!(
            service.endpoint("prop-42"),
            "https://api.listspace.ph/properties/prop-42/image-urls"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let service = HttpImageService::new(&config("https://api.listspace.ph/")).unwrap();
        assert_eq!(
            service.endpoint("prop-42"),
            "https://api.listspace.ph/properties/prop-42/image-urls"
        );
    }
}

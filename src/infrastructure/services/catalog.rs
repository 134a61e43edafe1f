use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::repositories::{CatalogError, ContentCatalog};

/// Uses the content id itself as the video id
pub struct PassthroughCatalog;

#[async_trait]
impl ContentCatalog for PassthroughCatalog {
    async fn resolve_video(&self, content_id: &str) -> Result<Option<String>, CatalogError> {
        Ok(Some(content_id.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentResponse {
    video_id: String,
}

/// Read-only content API client
pub struct HttpContentCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentCatalog for HttpContentCatalog {
    async fn resolve_video(&self, content_id: &str) -> Result<Option<String>, CatalogError> {
        let url = format!("{}/content/{}", self.base_url, content_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::Unavailable(format!(
                "Catalog returned {}",
                response.status()
            )));
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        Ok(Some(body.video_id))
    }
}

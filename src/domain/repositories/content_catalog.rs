use async_trait::async_trait;

/// Error type for catalog lookups
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Unexpected catalog response: {0}")]
    InvalidResponse(String),
}

/// Read-only content catalog collaborator
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    /// Resolve a content id to its playable video id
    async fn resolve_video(&self, content_id: &str) -> Result<Option<String>, CatalogError>;
}

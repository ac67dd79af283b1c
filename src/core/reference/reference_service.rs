// Reference documents are read-only prompt context pulled from an external
// folder. They are never persisted by this system.

use async_trait::async_trait;
use thiserror::Error;

/// An external file rendered to text for the prompt.
#[derive(Debug, Clone)]
pub struct ReferenceDocument {
    pub name: String,
    pub mime_type: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference folder unavailable: {0}")]
    Unavailable(String),
}

/// Trait for listing the documents of the configured folder.
///
/// Implementations must not drop files they cannot render: an unsupported
/// type comes back with a placeholder content string instead, so the user
/// can see the file was there.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, ReferenceError>;
}

#[async_trait]
impl ReferenceSource for Box<dyn ReferenceSource> {
    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, ReferenceError> {
        (**self).list_documents().await
    }
}

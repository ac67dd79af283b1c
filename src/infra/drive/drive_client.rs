// =============================================================================
// GOOGLE DRIVE REFERENCE FOLDER CLIENT
// =============================================================================
//
// `ReferenceSource` over a Drive folder. Two content paths, matching what
// Drive can actually serve:
// - Google Docs are not downloadable as-is and go through the export
//   endpoint (`files/{id}/export?mimeType=text/plain`)
// - native text files are downloaded directly (`alt=media`)
// Anything else (images, PDFs, ...) is represented by a placeholder content
// string so the prompt still shows the file exists.
//
// Exported content is cached per file id for the life of the process; the
// reference folder is expected to change rarely compared to diary writes.

use crate::core::reference::{ReferenceDocument, ReferenceError, ReferenceSource};
use crate::infra::google::ServiceAccountAuth;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
}

/// How a given mime type is turned into prompt text.
#[derive(Debug, PartialEq, Eq)]
enum ContentStrategy {
    /// Rich Google Doc: convert to plain text via the export endpoint.
    ExportDoc,
    /// Native text: download the bytes as-is.
    Download,
    /// Everything else: placeholder, never dropped.
    Placeholder,
}

fn strategy_for(mime_type: &str) -> ContentStrategy {
    if mime_type == GOOGLE_DOC_MIME {
        ContentStrategy::ExportDoc
    } else if mime_type.starts_with("text/") {
        ContentStrategy::Download
    } else {
        ContentStrategy::Placeholder
    }
}

fn unsupported_placeholder(mime_type: &str) -> String {
    format!("(unsupported file type: {mime_type})")
}

pub struct DriveFolderClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    folder_id: String,
    /// file id -> rendered text, for files already fetched this session.
    content_cache: DashMap<String, String>,
}

impl DriveFolderClient {
    pub fn new(auth: Arc<ServiceAccountAuth>, folder_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            auth,
            folder_id: folder_id.into(),
            content_cache: DashMap::new(),
        }
    }

    async fn token(&self) -> Result<String, ReferenceError> {
        self.auth
            .get_access_token()
            .await
            .map_err(|e| ReferenceError::Unavailable(format!("auth: {e}")))
    }

    async fn list_files(&self) -> Result<Vec<DriveFile>, ReferenceError> {
        let token = self.token().await?;
        let query = format!("'{}' in parents and trashed = false", self.folder_id);

        let response = self
            .client
            .get(DRIVE_FILES_URL)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name, mimeType)"),
                ("orderBy", "name"),
            ])
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| ReferenceError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReferenceError::Unavailable(format!(
                "folder listing failed ({status}): {text}"
            )));
        }

        let list: DriveFileList = response
            .json()
            .await
            .map_err(|e| ReferenceError::Unavailable(e.to_string()))?;
        Ok(list.files)
    }

    /// Fetches one file's text from `url`, going through the cache.
    async fn fetch_text(&self, file: &DriveFile, url: String) -> Result<String, ReferenceError> {
        if let Some(cached) = self.content_cache.get(&file.id) {
            return Ok(cached.value().clone());
        }

        let token = self.token().await?;
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| ReferenceError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReferenceError::Unavailable(format!(
                "fetch of '{}' failed ({status}): {text}",
                file.name
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| ReferenceError::Unavailable(e.to_string()))?;

        self.content_cache.insert(file.id.clone(), content.clone());
        Ok(content)
    }

    async fn content_for(&self, file: &DriveFile) -> Result<String, ReferenceError> {
        match strategy_for(&file.mime_type) {
            ContentStrategy::ExportDoc => {
                let url = format!(
                    "{DRIVE_FILES_URL}/{}/export?mimeType=text/plain",
                    file.id
                );
                self.fetch_text(file, url).await
            }
            ContentStrategy::Download => {
                let url = format!("{DRIVE_FILES_URL}/{}?alt=media", file.id);
                self.fetch_text(file, url).await
            }
            ContentStrategy::Placeholder => Ok(unsupported_placeholder(&file.mime_type)),
        }
    }
}

#[async_trait]
impl ReferenceSource for DriveFolderClient {
    async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, ReferenceError> {
        let files = self.list_files().await?;

        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            let content = self.content_for(file).await?;
            documents.push(ReferenceDocument {
                name: file.name.clone(),
                mime_type: file.mime_type.clone(),
                content,
            });
        }

        tracing::debug!(
            folder = %self.folder_id,
            count = documents.len(),
            "Loaded reference documents"
        );

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_docs_go_through_export() {
        assert_eq!(strategy_for(GOOGLE_DOC_MIME), ContentStrategy::ExportDoc);
    }

    #[test]
    fn text_files_are_downloaded_directly() {
        assert_eq!(strategy_for("text/plain"), ContentStrategy::Download);
        assert_eq!(strategy_for("text/markdown"), ContentStrategy::Download);
    }

    #[test]
    fn other_types_get_a_placeholder_not_an_error() {
        assert_eq!(strategy_for("image/png"), ContentStrategy::Placeholder);
        assert_eq!(strategy_for("application/pdf"), ContentStrategy::Placeholder);
        assert_eq!(
            unsupported_placeholder("image/png"),
            "(unsupported file type: image/png)"
        );
    }

    #[test]
    fn file_listing_parses_camel_case() {
        let json = r#"{"files": [{"id": "f1", "name": "goals.txt", "mimeType": "text/plain"}]}"#;
        let list: DriveFileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.files[0].mime_type, "text/plain");
    }
}

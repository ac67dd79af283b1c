// =============================================================================
// GOOGLE SHEETS DIARY STORE
// =============================================================================
//
// `DiaryStore` backed by a Google spreadsheet, addressed BY NAME the way the
// original tool opened it: a Drive file search resolves the name to a
// spreadsheet id once, then the Sheets values API does the row work on the
// first sheet.
//
// Layout: three columns in fixed order - date (`YYYY-MM-DD`), diary text,
// feedback text - one row per date, no header row.
//
// **Update semantics:**
// The update branch writes the whole row in ONE `values.update` call
// (`An:Cn`), so a row can never end up with a new diary but stale feedback.

use crate::core::diary::{DiaryRecord, DiaryStore, DiaryStoreError};
use crate::infra::google::ServiceAccountAuth;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

// =============================================================================
// API RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFileRef>,
}

#[derive(Debug, Deserialize)]
struct DriveFileRef {
    id: String,
}

/// Response of `values.get`. `values` is absent entirely for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

// =============================================================================
// ROW MAPPING HELPERS
// =============================================================================
// Pure functions so the scan/mapping logic is testable without a network.

/// Maps one sheet row to a record, padding missing trailing cells.
fn record_from_row(row: &[String]) -> DiaryRecord {
    DiaryRecord {
        date: row.first().cloned().unwrap_or_default(),
        diary: row.get(1).cloned().unwrap_or_default(),
        feedback: row.get(2).cloned().unwrap_or_default(),
    }
}

/// Finds the 1-based sheet row holding `date`, scanning the date column top
/// to bottom. With duplicate dates the FIRST match wins.
fn find_row_number(date_column: &[Vec<String>], date: &str) -> Option<usize> {
    date_column
        .iter()
        .position(|row| row.first().map(String::as_str) == Some(date))
        .map(|idx| idx + 1)
}

/// Single quotes inside a Drive query literal are escaped with a backslash.
fn escape_drive_query(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

// =============================================================================
// STORE
// =============================================================================

pub struct SheetsDiaryStore {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    spreadsheet_name: String,
    // Resolved once per process; the name->id mapping doesn't change.
    resolved_id: RwLock<Option<String>>,
}

impl SheetsDiaryStore {
    pub fn new(auth: Arc<ServiceAccountAuth>, spreadsheet_name: impl Into<String>) -> Self {
        // Bounded overall timeout so a hung Sheets call can't pin a
        // submission forever.
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            auth,
            spreadsheet_name: spreadsheet_name.into(),
            resolved_id: RwLock::new(None),
        }
    }

    async fn token(&self) -> Result<String, DiaryStoreError> {
        self.auth
            .get_access_token()
            .await
            .map_err(|e| DiaryStoreError::Unavailable(format!("auth: {e}")))
    }

    /// Resolves the configured spreadsheet name to an id via Drive search.
    ///
    /// A missing spreadsheet is `StoreNotFound` - distinct from transport
    /// errors - so the user can tell a misnamed sheet from an outage.
    async fn spreadsheet_id(&self) -> Result<String, DiaryStoreError> {
        {
            let cached = self.resolved_id.read().await;
            if let Some(id) = cached.as_ref() {
                return Ok(id.clone());
            }
        }

        let token = self.token().await?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_drive_query(&self.spreadsheet_name),
            SPREADSHEET_MIME
        );

        let response = self
            .client
            .get(DRIVE_FILES_URL)
            .query(&[("q", query.as_str()), ("fields", "files(id)")])
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| DiaryStoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DiaryStoreError::Unavailable(format!(
                "spreadsheet lookup failed ({status}): {text}"
            )));
        }

        let list: DriveFileList = response
            .json()
            .await
            .map_err(|e| DiaryStoreError::Unavailable(e.to_string()))?;

        let id = list
            .files
            .first()
            .map(|f| f.id.clone())
            .ok_or_else(|| DiaryStoreError::StoreNotFound(self.spreadsheet_name.clone()))?;

        tracing::info!(
            spreadsheet = %self.spreadsheet_name,
            id = %id,
            "Resolved diary spreadsheet"
        );

        let mut cached = self.resolved_id.write().await;
        *cached = Some(id.clone());
        Ok(id)
    }

    /// Reads a range off the first sheet. Empty ranges come back as `[]`.
    async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>, DiaryStoreError> {
        let id = self.spreadsheet_id().await?;
        let token = self.token().await?;

        let url = format!("{SHEETS_BASE_URL}/{id}/values/{range}");
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| DiaryStoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DiaryStoreError::Unavailable(format!(
                "values read failed ({status}): {text}"
            )));
        }

        let values: ValueRange = response
            .json()
            .await
            .map_err(|e| DiaryStoreError::Unavailable(e.to_string()))?;
        Ok(values.values)
    }

    /// Replaces row `row_number` (1-based) with the record, in one call.
    async fn update_row(
        &self,
        row_number: usize,
        record: &DiaryRecord,
    ) -> Result<(), DiaryStoreError> {
        let id = self.spreadsheet_id().await?;
        let token = self.token().await?;

        let range = format!("A{row_number}:C{row_number}");
        let url = format!("{SHEETS_BASE_URL}/{id}/values/{range}");
        let body = json!({
            "range": range,
            "values": [[record.date, record.diary, record.feedback]],
        });

        let response = self
            .client
            .put(&url)
            .query(&[("valueInputOption", "RAW")])
            .header("Authorization", format!("Bearer {token}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| DiaryStoreError::WriteFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DiaryStoreError::WriteFailed(format!(
                "row update failed ({status}): {text}"
            )));
        }

        Ok(())
    }

    /// Appends the record as a new row after the existing data.
    async fn append_row(&self, record: &DiaryRecord) -> Result<(), DiaryStoreError> {
        let id = self.spreadsheet_id().await?;
        let token = self.token().await?;

        let url = format!("{SHEETS_BASE_URL}/{id}/values/A:C:append");
        let body = json!({
            "values": [[record.date, record.diary, record.feedback]],
        });

        let response = self
            .client
            .post(&url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .header("Authorization", format!("Bearer {token}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| DiaryStoreError::WriteFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DiaryStoreError::WriteFailed(format!(
                "row append failed ({status}): {text}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl DiaryStore for SheetsDiaryStore {
    async fn load_all(&self) -> Result<Vec<DiaryRecord>, DiaryStoreError> {
        let values = self.read_values("A:C").await?;
        Ok(values.iter().map(|row| record_from_row(row)).collect())
    }

    async fn upsert(&self, record: &DiaryRecord) -> Result<(), DiaryStoreError> {
        // Scan only the date column to locate the target row.
        let date_column = self.read_values("A:A").await?;

        match find_row_number(&date_column, &record.date) {
            Some(row_number) => {
                tracing::debug!(date = %record.date, row = row_number, "Updating diary row");
                self.update_row(row_number, record).await
            }
            None => {
                tracing::debug!(date = %record.date, "Appending diary row");
                self.append_row(record).await
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn column(dates: &[&str]) -> Vec<Vec<String>> {
        dates.iter().map(|d| vec![d.to_string()]).collect()
    }

    #[test]
    fn row_numbers_are_one_based() {
        let col = column(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(find_row_number(&col, "2024-01-01"), Some(1));
        assert_eq!(find_row_number(&col, "2024-01-03"), Some(3));
        assert_eq!(find_row_number(&col, "2024-02-01"), None);
    }

    #[test]
    fn duplicate_dates_resolve_to_the_first_row() {
        let col = column(&["2024-01-01", "2024-01-02", "2024-01-02"]);
        assert_eq!(find_row_number(&col, "2024-01-02"), Some(2));
    }

    #[test]
    fn blank_rows_in_the_column_are_skipped_over() {
        let mut col = column(&["2024-01-01"]);
        col.push(vec![]); // a fully blank row
        col.push(vec!["2024-01-03".to_string()]);
        assert_eq!(find_row_number(&col, "2024-01-03"), Some(3));
    }

    #[test]
    fn short_rows_are_padded_to_full_records() {
        let record = record_from_row(&["2024-01-01".to_string()]);
        assert_eq!(record.date, "2024-01-01");
        assert_eq!(record.diary, "");
        assert_eq!(record.feedback, "");
    }

    #[test]
    fn full_rows_map_field_for_field() {
        let record = record_from_row(&[
            "2024-01-01".to_string(),
            "wrote rust".to_string(),
            "nice work".to_string(),
        ]);
        assert_eq!(record.date, "2024-01-01");
        assert_eq!(record.diary, "wrote rust");
        assert_eq!(record.feedback, "nice work");
    }

    #[test]
    fn drive_query_escapes_quotes() {
        assert_eq!(escape_drive_query("my 'diary'"), "my \\'diary\\'");
        assert_eq!(escape_drive_query("plain"), "plain");
    }

    #[test]
    fn empty_value_range_deserializes_to_no_rows() {
        // values.get omits `values` entirely when the sheet is empty.
        let parsed: ValueRange = serde_json::from_str(r#"{"range": "Sheet1!A1:C1"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }
}

// In-memory implementation of DiaryStore.
//
// **Why have one at all?**
// - Tests run against the same port as production without network or disk
// - Store-order semantics (append at end, update in place, first match wins)
//   are easiest to see here, and the other backends must behave identically

use crate::core::diary::{DiaryRecord, DiaryStore, DiaryStoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Vec-backed store. A Vec rather than a map because store ORDER is part of
/// the contract: history selection takes the last N rows, and duplicate
/// dates resolve to the first row.
pub struct InMemoryDiaryStore {
    rows: RwLock<Vec<DiaryRecord>>,
}

impl InMemoryDiaryStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Seeds the store with existing rows (tests only care about order).
    #[allow(dead_code)]
    pub fn with_rows(rows: Vec<DiaryRecord>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }
}

impl Default for InMemoryDiaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiaryStore for InMemoryDiaryStore {
    async fn load_all(&self) -> Result<Vec<DiaryRecord>, DiaryStoreError> {
        Ok(self.rows.read().await.clone())
    }

    async fn upsert(&self, record: &DiaryRecord) -> Result<(), DiaryStoreError> {
        let mut rows = self.rows.write().await;

        // First matching row in store order, position preserved.
        if let Some(row) = rows.iter_mut().find(|r| r.date == record.date) {
            *row = record.clone();
        } else {
            rows.push(record.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, diary: &str, feedback: &str) -> DiaryRecord {
        DiaryRecord {
            date: date.to_string(),
            diary: diary.to_string(),
            feedback: feedback.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_store_reads_as_empty_not_error() {
        let store = InMemoryDiaryStore::new();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_then_read_round_trips() {
        let store = InMemoryDiaryStore::new();
        store
            .upsert(&record("2024-01-01", "hello", "fb"))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows, vec![record("2024-01-01", "hello", "fb")]);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_date() {
        let store = InMemoryDiaryStore::new();
        store
            .upsert(&record("2024-01-01", "draft one", "fb1"))
            .await
            .unwrap();
        store
            .upsert(&record("2024-01-01", "draft two", "fb2"))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].diary, "draft two");
        assert_eq!(rows[0].feedback, "fb2");
    }

    #[tokio::test]
    async fn update_preserves_row_position() {
        let store = InMemoryDiaryStore::with_rows(vec![
            record("2024-01-01", "one", ""),
            record("2024-01-02", "two", ""),
            record("2024-01-03", "three", ""),
        ]);

        store
            .upsert(&record("2024-01-02", "two, revised", "fb"))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows[1].date, "2024-01-02");
        assert_eq!(rows[1].diary, "two, revised");
        assert_eq!(rows[2].date, "2024-01-03");
    }

    #[tokio::test]
    async fn preexisting_duplicates_update_only_the_first_row() {
        let store = InMemoryDiaryStore::with_rows(vec![
            record("2024-01-01", "first copy", ""),
            record("2024-01-01", "second copy", ""),
        ]);

        store
            .upsert(&record("2024-01-01", "updated", "fb"))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows[0].diary, "updated");
        assert_eq!(rows[1].diary, "second copy");
    }

    #[tokio::test]
    async fn new_dates_append_at_the_end() {
        let store = InMemoryDiaryStore::with_rows(vec![record("2024-01-01", "one", "")]);

        store
            .upsert(&record("2024-01-02", "two", ""))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows.last().unwrap().date, "2024-01-02");
    }
}

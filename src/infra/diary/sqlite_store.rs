// SQLite-backed DiaryStore for offline use (`EXOBRAIN_STORE=sqlite`) and
// integration tests. Same contract as the Sheets backend: store order is
// insertion order (rowid), updates keep a row's position.

use crate::core::diary::{DiaryRecord, DiaryStore, DiaryStoreError};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteDiaryStore {
    pool: Pool<Sqlite>,
}

impl SqliteDiaryStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS diary_entries (
                date TEXT PRIMARY KEY,
                diary TEXT NOT NULL,
                feedback TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DiaryStore for SqliteDiaryStore {
    async fn load_all(&self) -> Result<Vec<DiaryRecord>, DiaryStoreError> {
        // rowid order = insertion order; ON CONFLICT updates keep the rowid,
        // so updated rows keep their position like a sheet row does.
        let rows = sqlx::query("SELECT date, diary, feedback FROM diary_entries ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DiaryStoreError::Unavailable(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| DiaryRecord {
                date: row.get(0),
                diary: row.get(1),
                feedback: row.get(2),
            })
            .collect())
    }

    async fn upsert(&self, record: &DiaryRecord) -> Result<(), DiaryStoreError> {
        sqlx::query(
            r#"
            INSERT INTO diary_entries (date, diary, feedback)
            VALUES (?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                diary = excluded.diary,
                feedback = excluded.feedback
            "#,
        )
        .bind(&record.date)
        .bind(&record.diary)
        .bind(&record.feedback)
        .execute(&self.pool)
        .await
        .map_err(|e| DiaryStoreError::WriteFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A pooled `:memory:` database would give every pooled connection its own
    // empty database, so tests run against a real file in a temp directory.
    async fn temp_store() -> (tempfile::TempDir, SqliteDiaryStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diary.db");
        let store = SqliteDiaryStore::new(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    fn record(date: &str, diary: &str, feedback: &str) -> DiaryRecord {
        DiaryRecord {
            date: date.to_string(),
            diary: diary.to_string(),
            feedback: feedback.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_database_reads_as_empty() {
        let (_dir, store) = temp_store().await;
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_then_read_round_trips() {
        let (_dir, store) = temp_store().await;
        store
            .upsert(&record("2024-01-01", "hello", "fb"))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows, vec![record("2024-01-01", "hello", "fb")]);
    }

    #[tokio::test]
    async fn conflicting_date_overwrites_in_place() {
        let (_dir, store) = temp_store().await;
        store
            .upsert(&record("2024-01-01", "one", ""))
            .await
            .unwrap();
        store
            .upsert(&record("2024-01-02", "two", ""))
            .await
            .unwrap();
        store
            .upsert(&record("2024-01-01", "one, revised", "fb"))
            .await
            .unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        // The updated row kept its first position.
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[0].diary, "one, revised");
        assert_eq!(rows[1].date, "2024-01-02");
    }

    #[tokio::test]
    async fn file_backed_store_bootstraps_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("diary.db");
        let store = SqliteDiaryStore::new(path.to_str().unwrap()).await.unwrap();

        store
            .upsert(&record("2024-01-01", "hello", ""))
            .await
            .unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }
}

// This is the diary module - it contains ALL the business logic for diary records.
// Notice how this module has NO web or Google-specific code (no axum, no reqwest
// imports). It works with plain strings and dates so it could be driven by a CLI,
// a bot, or any other frontend.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// One diary row: a dated entry plus the feedback generated for it.
///
/// **Why a string date?**
/// The backing store keeps dates as `YYYY-MM-DD` text and matching is an exact
/// string compare on that canonical form. Frontends parse user input with
/// chrono and call [`canonical_date`] before anything reaches this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryRecord {
    pub date: String,
    pub diary: String,
    pub feedback: String,
}

/// Formats a calendar date in the canonical form used as the store key.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DiaryStoreError {
    /// The named backing resource does not exist (distinct from being
    /// unreachable so the user can tell a typo from an outage).
    #[error("diary store '{0}' was not found")]
    StoreNotFound(String),

    #[error("diary store unavailable: {0}")]
    Unavailable(String),

    #[error("diary store write failed: {0}")]
    WriteFailed(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================
// The core defines WHAT it needs from persistence, not HOW it's implemented.
// The infra layer provides Google Sheets, SQLite, and in-memory backends.

/// Trait for persisting diary rows.
///
/// Contract notes:
/// - `load_all` returns rows in store order. An empty store is `Ok(vec![])`,
///   never an error.
/// - `upsert` replaces the first row whose date matches the record's date
///   (preserving its position), or appends when no row matches. The replace
///   must be a single write so a row is never left half-updated.
/// - If the store already contains duplicate rows for one date (a state this
///   system discourages but cannot prevent), the FIRST match in store order
///   is the one updated.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<DiaryRecord>, DiaryStoreError>;

    async fn upsert(&self, record: &DiaryRecord) -> Result<(), DiaryStoreError>;
}

// Blanket implementation for Box<dyn DiaryStore>.
// This lets the composition root pick a backend at runtime (Sheets vs SQLite)
// while services stay generic over the trait.
#[async_trait]
impl DiaryStore for Box<dyn DiaryStore> {
    async fn load_all(&self) -> Result<Vec<DiaryRecord>, DiaryStoreError> {
        (**self).load_all().await
    }

    async fn upsert(&self, record: &DiaryRecord) -> Result<(), DiaryStoreError> {
        (**self).upsert(record).await
    }
}

// ============================================================================
// RECORD CACHE
// ============================================================================

struct CachedRecords {
    loaded_at: Instant,
    records: Vec<DiaryRecord>,
}

/// Time-bounded cache of the full record set.
///
/// The external store is the sole durable owner of the data; this is a
/// disposable copy. It is invalidated wholesale on every successful write
/// rather than incrementally updated.
pub struct RecordCache {
    ttl: Duration,
    inner: RwLock<Option<CachedRecords>>,
}

impl RecordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(None),
        }
    }

    /// Returns the cached records if they are still within the TTL.
    pub async fn get(&self) -> Option<Vec<DiaryRecord>> {
        let cached = self.inner.read().await;
        cached.as_ref().and_then(|c| {
            if c.loaded_at.elapsed() < self.ttl {
                Some(c.records.clone())
            } else {
                None
            }
        })
    }

    pub async fn put(&self, records: Vec<DiaryRecord>) {
        let mut cached = self.inner.write().await;
        *cached = Some(CachedRecords {
            loaded_at: Instant::now(),
            records,
        });
    }

    pub async fn invalidate(&self) {
        let mut cached = self.inner.write().await;
        *cached = None;
    }
}

// ============================================================================
// DIARY SERVICE
// ============================================================================

pub struct DiaryService<S: DiaryStore> {
    store: S,
    cache: RecordCache,
}

impl<S: DiaryStore> DiaryService<S> {
    pub fn new(store: S, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: RecordCache::new(cache_ttl),
        }
    }

    /// Returns every record, served from the cache when it is fresh.
    pub async fn records(&self) -> Result<Vec<DiaryRecord>, DiaryStoreError> {
        if let Some(records) = self.cache.get().await {
            return Ok(records);
        }

        let records = self.store.load_all().await?;
        self.cache.put(records.clone()).await;
        Ok(records)
    }

    /// Looks up the entry for a canonical date string.
    /// With duplicate dates in the store, the first match in store order wins.
    pub async fn entry_for(&self, date: &str) -> Result<Option<DiaryRecord>, DiaryStoreError> {
        let records = self.records().await?;
        Ok(records.into_iter().find(|r| r.date == date))
    }

    /// Writes (or overwrites) the record for its date, then invalidates the
    /// cache so the next read reflects the write.
    pub async fn save(&self, record: DiaryRecord) -> Result<(), DiaryStoreError> {
        self.store.upsert(&record).await?;
        self.cache.invalidate().await;
        tracing::info!(date = %record.date, "Diary record saved");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

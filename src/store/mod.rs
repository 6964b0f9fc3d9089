// src/store/mod.rs
//! Record store: per-category collections of inventory documents.
//!
//! The workbook codec and the HTTP handlers only see the `RecordStore` trait;
//! `SqliteRecordStore` is the production implementation.

pub mod live;
pub mod sqlite;

pub use live::LiveListing;
pub use sqlite::SqliteRecordStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::models::{Category, InventoryRecord, LabTestRow, RecordPatch, StoredLabTest, StoredRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{category} with ID '{id}' not found")]
    NotFound { category: Category, id: String },

    #[error("{0}")]
    Invalid(String),

    #[error("cannot order {category} records by '{field}'")]
    UnknownField { category: Category, field: String },

    #[error("expected a {expected} record, got a {actual} record")]
    CategoryMismatch { expected: Category, actual: Category },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Change notifications for one category.
pub struct ChangeFeed {
    category: Category,
    receiver: broadcast::Receiver<Category>,
}

impl ChangeFeed {
    pub fn new(category: Category, receiver: broadcast::Receiver<Category>) -> Self {
        Self { category, receiver }
    }

    /// Waits for the next mutation of this feed's category. Returns false once
    /// the store is gone. A lagging receiver counts as a change.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(category) if category == self.category => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("{} change feed lagged by {} notifications", self.category, skipped);
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }
}

/// Operations every category collection supports.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates a record and returns its store-assigned id.
    async fn add(&self, category: Category, record: InventoryRecord) -> StoreResult<String>;

    /// Merges `patch` into the stored record in place.
    async fn update(&self, category: Category, id: &str, patch: &RecordPatch) -> StoreResult<StoredRecord>;

    async fn delete(&self, category: Category, id: &str) -> StoreResult<()>;

    async fn get(&self, category: Category, id: &str) -> StoreResult<Option<StoredRecord>>;

    /// All records of `category` ordered by the document key `field`.
    async fn list_ordered_by(&self, category: Category, field: &str) -> StoreResult<Vec<StoredRecord>>;

    fn subscribe(&self, category: Category) -> ChangeFeed;

    /// Inserts every record as new in one all-or-nothing commit.
    async fn batch_insert(&self, category: Category, records: Vec<InventoryRecord>) -> StoreResult<Vec<String>>;

    /// Adds a row to the `labTests` collection the monthly report reads.
    async fn add_lab_test(&self, test: LabTestRow) -> StoreResult<String>;

    /// Every stored lab test ordered by the chemical tested.
    async fn list_lab_tests(&self) -> StoreResult<Vec<StoredLabTest>>;

    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> StoreResult<()>;

    /// Records of `category` ordered by their identity field.
    async fn list(&self, category: Category) -> StoreResult<Vec<StoredRecord>> {
        self.list_ordered_by(category, category.identity_field().as_ref()).await
    }
}

/// Checks the record belongs to `expected` and carries its identity field.
pub(crate) fn check_record(expected: Category, record: &InventoryRecord) -> StoreResult<()> {
    let actual = record.category();
    if actual != expected {
        return Err(StoreError::CategoryMismatch { expected, actual });
    }
    if !record.has_identity() {
        return Err(StoreError::Invalid(expected.identity_required_message().to_string()));
    }
    Ok(())
}

/// Trimmed lab test, rejected when it names no chemical.
pub(crate) fn check_lab_test(test: &LabTestRow) -> StoreResult<LabTestRow> {
    test.normalized()
        .ok_or_else(|| StoreError::Invalid("Chemical tested is required!".to_string()))
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteRecordStore {
    use sqlx::sqlite::SqlitePoolOptions;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");
    crate::db::run_migrations(&pool).await.expect("migrations");
    SqliteRecordStore::new(pool)
}

/// Delegates to an in-memory store but fails the operations it is told to.
#[cfg(test)]
pub(crate) struct FailingStore {
    pub inner: SqliteRecordStore,
    pub failing_batch: Option<Category>,
    pub failing_lab_tests: bool,
}

#[cfg(test)]
impl FailingStore {
    pub async fn new() -> Self {
        Self { inner: memory_store().await, failing_batch: None, failing_lab_tests: false }
    }

    fn broken<T>() -> StoreResult<T> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

#[cfg(test)]
#[async_trait]
impl RecordStore for FailingStore {
    async fn add(&self, category: Category, record: InventoryRecord) -> StoreResult<String> {
        self.inner.add(category, record).await
    }

    async fn update(&self, category: Category, id: &str, patch: &RecordPatch) -> StoreResult<StoredRecord> {
        self.inner.update(category, id, patch).await
    }

    async fn delete(&self, category: Category, id: &str) -> StoreResult<()> {
        self.inner.delete(category, id).await
    }

    async fn get(&self, category: Category, id: &str) -> StoreResult<Option<StoredRecord>> {
        self.inner.get(category, id).await
    }

    async fn list_ordered_by(&self, category: Category, field: &str) -> StoreResult<Vec<StoredRecord>> {
        self.inner.list_ordered_by(category, field).await
    }

    fn subscribe(&self, category: Category) -> ChangeFeed {
        self.inner.subscribe(category)
    }

    async fn batch_insert(&self, category: Category, records: Vec<InventoryRecord>) -> StoreResult<Vec<String>> {
        if self.failing_batch == Some(category) {
            return Self::broken();
        }
        self.inner.batch_insert(category, records).await
    }

    async fn add_lab_test(&self, test: LabTestRow) -> StoreResult<String> {
        if self.failing_lab_tests {
            return Self::broken();
        }
        self.inner.add_lab_test(test).await
    }

    async fn list_lab_tests(&self) -> StoreResult<Vec<StoredLabTest>> {
        if self.failing_lab_tests {
            return Self::broken();
        }
        self.inner.list_lab_tests().await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

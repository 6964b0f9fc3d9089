// src/store/sqlite.rs - Record store backed by the inventory_records document table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{check_lab_test, check_record, ChangeFeed, RecordStore, StoreError, StoreResult};
use crate::models::{Category, Field, InventoryRecord, LabTestRow, RecordPatch, StoredLabTest, StoredRecord};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    document: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_stored(self) -> StoreResult<StoredRecord> {
        let record: InventoryRecord = serde_json::from_str(&self.document)?;
        Ok(StoredRecord {
            id: self.id,
            record,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LabTestDbRow {
    id: String,
    chemical_tested: String,
    vendor: String,
    status: String,
    remark: String,
    created_at: DateTime<Utc>,
}

impl From<LabTestDbRow> for StoredLabTest {
    fn from(row: LabTestDbRow) -> Self {
        StoredLabTest {
            id: row.id,
            test: LabTestRow {
                chemical_tested: row.chemical_tested,
                vendor: row.vendor,
                status: row.status,
                remark: row.remark,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    changes: broadcast::Sender<Category>,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    fn notify(&self, category: Category) {
        // No receivers is not an error: nobody is watching this category.
        let _ = self.changes.send(category);
    }

    async fn fetch_row(&self, category: Category, id: &str) -> StoreResult<Option<DocumentRow>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, document, created_at, updated_at FROM inventory_records WHERE id = ? AND collection = ?",
        )
        .bind(id)
        .bind(category.collection())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn add(&self, category: Category, record: InventoryRecord) -> StoreResult<String> {
        check_record(category, &record)?;
        let document = serde_json::to_string(&record.normalize())?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO inventory_records (id, collection, document, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(category.collection())
        .bind(&document)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        log::debug!("{} '{}' added to {}", category.label(), id, category.collection());
        self.notify(category);
        Ok(id)
    }

    async fn update(&self, category: Category, id: &str, patch: &RecordPatch) -> StoreResult<StoredRecord> {
        let existing = self
            .fetch_row(category, id)
            .await?
            .ok_or_else(|| StoreError::NotFound { category, id: id.to_string() })?
            .into_stored()?;

        let merged = patch.apply(&existing.record).map_err(StoreError::Invalid)?;
        let document = serde_json::to_string(&merged)?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory_records SET document = ?, updated_at = ? WHERE id = ? AND collection = ?",
        )
        .bind(&document)
        .bind(now)
        .bind(id)
        .bind(category.collection())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { category, id: id.to_string() });
        }

        self.notify(category);
        Ok(StoredRecord {
            id: existing.id,
            record: merged,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    async fn delete(&self, category: Category, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM inventory_records WHERE id = ? AND collection = ?")
            .bind(id)
            .bind(category.collection())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { category, id: id.to_string() });
        }

        self.notify(category);
        Ok(())
    }

    async fn get(&self, category: Category, id: &str) -> StoreResult<Option<StoredRecord>> {
        self.fetch_row(category, id)
            .await?
            .map(DocumentRow::into_stored)
            .transpose()
    }

    async fn list_ordered_by(&self, category: Category, field: &str) -> StoreResult<Vec<StoredRecord>> {
        let field = Field::sortable(category, field).ok_or_else(|| StoreError::UnknownField {
            category,
            field: field.to_string(),
        })?;

        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, document, created_at, updated_at
            FROM inventory_records
            WHERE collection = ?
            ORDER BY json_extract(document, ?), created_at, rowid
            "#,
        )
        .bind(category.collection())
        .bind(format!("$.{}", field.as_ref()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DocumentRow::into_stored).collect()
    }

    fn subscribe(&self, category: Category) -> ChangeFeed {
        ChangeFeed::new(category, self.changes.subscribe())
    }

    async fn batch_insert(&self, category: Category, records: Vec<InventoryRecord>) -> StoreResult<Vec<String>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::with_capacity(records.len());
        for record in records {
            check_record(category, &record)?;
            documents.push(serde_json::to_string(&record.normalize())?);
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(documents.len());
        let mut tx = self.pool.begin().await?;

        for document in &documents {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO inventory_records (id, collection, document, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(category.collection())
            .bind(document)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            ids.push(id);
        }

        tx.commit().await?;

        log::info!("Committed {} {} records in one batch", ids.len(), category.label());
        self.notify(category);
        Ok(ids)
    }

    async fn add_lab_test(&self, test: LabTestRow) -> StoreResult<String> {
        let test = check_lab_test(&test)?;
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO lab_tests (id, chemical_tested, vendor, status, remark, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&test.chemical_tested)
        .bind(&test.vendor)
        .bind(&test.status)
        .bind(&test.remark)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        log::debug!("Lab test '{}' added for {}", id, test.chemical_tested);
        Ok(id)
    }

    async fn list_lab_tests(&self) -> StoreResult<Vec<StoredLabTest>> {
        let rows = sqlx::query_as::<_, LabTestDbRow>(
            r#"
            SELECT id, chemical_tested, vendor, status, remark, created_at
            FROM lab_tests
            ORDER BY chemical_tested, created_at, rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredLabTest::from).collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

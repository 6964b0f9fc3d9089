// src/db.rs - Database migrations and setup for the inventory document store

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys and WAL mode
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // One row per inventory document. `collection` names the category
    // collection, `document` holds the record fields as a JSON object.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_records (
            id TEXT PRIMARY KEY,
            collection TEXT NOT NULL CHECK(
                collection IN ('reagents', 'equipment', 'consumables', 'glasswares')
            ),
            document TEXT NOT NULL CHECK(json_valid(document)),
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Rows of the monthly report's LAB TEST REPORT section.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lab_tests (
            id TEXT PRIMARY KEY,
            chemical_tested TEXT NOT NULL CHECK(length(trim(chemical_tested)) > 0),
            vendor TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            remark TEXT NOT NULL DEFAULT '',
            created_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== CREATE INDEXES ====================

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_inventory_records_collection ON inventory_records(collection, created_at)",
    )
        .execute(pool)
        .await?;

    log::info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Column names of `table`, in declaration order.
    async fn get_table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let columns = get_table_columns(&pool, "inventory_records").await.unwrap();
        assert_eq!(columns, vec!["id", "collection", "document", "created_at", "updated_at"]);

        let columns = get_table_columns(&pool, "lab_tests").await.unwrap();
        assert_eq!(columns, vec!["id", "chemical_tested", "vendor", "status", "remark", "created_at"]);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_rejected() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO inventory_records (id, collection, document, created_at, updated_at) VALUES ('x', 'labTests', '{}', datetime('now'), datetime('now'))",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}

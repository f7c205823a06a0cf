use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, Pool, QueryBuilder, Sqlite};

use super::{Document, DocumentStore};
use crate::Result;

const INIT_SQL: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, key)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
";

const UPSERT_SQL: &str = r"
INSERT INTO documents (collection, key, data, updated_at)
VALUES (?, ?, ?, ?)
ON CONFLICT(collection, key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
";

/// `SQLite` document store. Each collection is a key space inside one table and
/// documents are stored as JSON text.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn open(path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{path}?mode=rwc"))
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl DocumentStore for SqliteStore {
    async fn count(&self, collection: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_page(&self, collection: &str, page: usize, limit: usize) -> Result<Vec<Document>> {
        let offset = i64::try_from(page.saturating_mul(limit)).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<(String, String)> = sqlx::query_as(
            r"
            SELECT key, data FROM documents
            WHERE collection = ?
            ORDER BY key
            LIMIT ? OFFSET ?
            ",
        )
        .bind(collection)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(parse_document_row).collect()
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<Vec<Document>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT key, data FROM documents WHERE collection = ");
        query.push_bind(collection);
        query.push(" AND json_extract(data, ");
        query.push_bind(format!("$.{field}"));
        query.push(") IN (");
        let mut separated = query.separated(", ");
        for value in values {
            separated.push_bind(value.clone());
        }
        separated.push_unseparated(") ORDER BY key");

        let rows: Vec<(String, String)> = query.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(parse_document_row).collect()
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT key, data FROM documents WHERE collection = ? AND key = ?")
                .bind(collection)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.map(parse_document_row).transpose()
    }

    async fn delete_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM documents WHERE collection = ");
        query.push_bind(collection);
        query.push(" AND json_extract(data, ");
        query.push_bind(format!("$.{field}"));
        query.push(") IN (");
        let mut separated = query.separated(", ");
        for value in values {
            separated.push_bind(value.clone());
        }
        separated.push_unseparated(")");

        let result = query.build().execute(&self.pool).await?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or_default())
    }

    async fn commit(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();
        let mut written = 0;

        for doc in &documents {
            let data = serde_json::to_string(&doc.data)?;
            let result = sqlx::query(UPSERT_SQL)
                .bind(collection)
                .bind(&doc.key)
                .bind(data)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            written += usize::try_from(result.rows_affected()).unwrap_or_default();
        }

        tx.commit().await?;

        Ok(written)
    }
}

fn parse_document_row(row: (String, String)) -> Result<Document> {
    let (key, data) = row;
    Ok(Document {
        key,
        data: serde_json::from_str(&data)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_commit_and_count() {
        let store = SqliteStore::open_memory().await.unwrap();

        let written = store
            .commit(
                "reps",
                vec![
                    Document::new("B000001", json!({"_id": "B000001"})),
                    Document::new("A000001", json!({"_id": "A000001"})),
                ],
            )
            .await
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(store.count("reps").await.unwrap(), 2);
        assert_eq!(store.count("edu").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_overwrites_by_key() {
        let store = SqliteStore::open_memory().await.unwrap();

        store
            .commit("state_party", vec![Document::new("CA", json!({"total": 1}))])
            .await
            .unwrap();
        store
            .commit("state_party", vec![Document::new("CA", json!({"total": 52}))])
            .await
            .unwrap();

        let doc = store.get("state_party", "CA").await.unwrap().unwrap();
        assert_eq!(doc.data["total"], 52);
        assert_eq!(store.count("state_party").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_page_orders_by_key() {
        let store = SqliteStore::open_memory().await.unwrap();
        let docs = ["C", "A", "E", "B", "D"]
            .into_iter()
            .map(|k| Document::new(k, json!({"_id": k})))
            .collect();
        store.commit("reps", docs).await.unwrap();

        let first = store.find_page("reps", 0, 2).await.unwrap();
        let last = store.find_page("reps", 2, 2).await.unwrap();

        assert_eq!(first.iter().map(|d| d.key.as_str()).collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(last.iter().map(|d| d.key.as_str()).collect::<Vec<_>>(), ["E"]);
    }

    #[tokio::test]
    async fn test_find_by_field() {
        let store = SqliteStore::open_memory().await.unwrap();
        store
            .commit(
                "edu",
                vec![
                    Document::new("X_0", json!({"_id": "X", "degree": "BA"})),
                    Document::new("Y_0", json!({"_id": "Y", "degree": "JD"})),
                    Document::new("X_1", json!({"_id": "X", "degree": "MBA"})),
                ],
            )
            .await
            .unwrap();

        let found = store
            .find_by_field("edu", "_id", &["X".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|d| d.data["_id"] == "X"));
        assert!(store.find_by_field("edu", "_id", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_field_leaves_other_keys() {
        let store = SqliteStore::open_memory().await.unwrap();
        store
            .commit(
                "edu",
                vec![
                    Document::new("X_0", json!({"_id": "X"})),
                    Document::new("X_1", json!({"_id": "X"})),
                    Document::new("Y_0", json!({"_id": "Y"})),
                ],
            )
            .await
            .unwrap();

        let removed = store
            .delete_by_field("edu", "_id", &["X".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.count("edu").await.unwrap(), 1);
        assert!(store.get("edu", "Y_0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primary.db");
        let path = path.to_string_lossy();

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store
                .commit("votes", vec![Document::new("116_1_2", json!({"roll_call": 2}))])
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.count("votes").await.unwrap(), 1);
    }
}

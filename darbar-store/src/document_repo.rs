use async_trait::async_trait;
use darbar_core::store::{ensure_document_id, Document, DocumentStore};
use darbar_core::{CoreError, CoreResult};
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Documents kept as JSONB rows of the `documents` table.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: sqlx::Error) -> CoreError {
    tracing::error!("Document store query failed: {}", err);
    CoreError::StoreError(err.to_string())
}

fn to_document(row: PgRow) -> CoreResult<Document> {
    let id: String = row.try_get("id").map_err(store_error)?;
    let data: Value = row.try_get("data").map_err(store_error)?;
    Ok(Document { id, data })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Document>> {
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(to_document).transpose()
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> CoreResult<()> {
        ensure_document_id(id)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> CoreResult<()> {
        if !patch.is_object() {
            return Err(CoreError::ValidationError("Update payload must be an object".to_string()));
        }

        // `||` on two JSONB objects is a shallow merge.
        let result = sqlx::query(
            "UPDATE documents SET data = data || $3, updated_at = NOW() WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(patch)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Document {}/{}", collection, id)));
        }
        Ok(())
    }

    async fn add(&self, collection: &str, data: Value) -> CoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, collection: &str) -> CoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = $1 ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.into_iter().map(to_document).collect()
    }

    async fn list_where(&self, collection: &str, field: &str, value: Value) -> CoreResult<Vec<Document>> {
        let filter = json!({ field: value });
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = $1 AND data @> $2 ORDER BY id")
            .bind(collection)
            .bind(filter)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.into_iter().map(to_document).collect()
    }
}

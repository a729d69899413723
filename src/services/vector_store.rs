//! Loads embedding shards into a pgvector table.

use pgvector::Vector;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::VectorStoreError;
use crate::models::{StoreKind, VectorStoreConfig};
use crate::services::shard::ShardContents;

pub struct VectorStoreLoader {
    pool: PgPool,
    table_name: String,
    store_kind: StoreKind,
}

impl VectorStoreLoader {
    pub async fn connect(
        url: &str,
        config: &VectorStoreConfig,
    ) -> Result<Self, VectorStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        let loader = Self {
            pool,
            table_name: config.qualified_table_name(),
            store_kind: config.store_kind,
        };
        loader.check_pgvector_extension().await?;
        Ok(loader)
    }

    async fn check_pgvector_extension(&self) -> Result<(), VectorStoreError> {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| VectorStoreError::PostgresError(e.to_string()))?;

        if result.is_none() {
            return Err(VectorStoreError::PgVectorExtensionError(
                "pgvector extension is not installed. Run: CREATE EXTENSION vector;".to_string(),
            ));
        }

        Ok(())
    }

    /// Create the destination table with the dimensionality baked into the
    /// vector column type. No-op when the table already exists.
    pub async fn create_table(&self, dimensions: usize) -> Result<(), VectorStoreError> {
        let statement = create_table_sql(&self.table_name, self.store_kind, dimensions);
        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorStoreError::TableError(e.to_string()))?;
        Ok(())
    }

    /// Append one shard's rows, in shard order, inside a single transaction.
    /// Rows are write-once; a failed shard rolls back only that shard.
    pub async fn load_shard(&self, contents: &ShardContents) -> Result<u64, VectorStoreError> {
        let statement = insert_sql(&self.table_name, self.store_kind);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VectorStoreError::InsertError(e.to_string()))?;

        for row in &contents.rows {
            let embedding = Vector::from(row.embedding.clone());
            sqlx::query(&statement)
                .bind(row.concept_id)
                .bind(row.standard_concept_id)
                .bind(&embedding)
                .execute(&mut *tx)
                .await
                .map_err(|e| VectorStoreError::InsertError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| VectorStoreError::InsertError(e.to_string()))?;

        Ok(contents.rows.len() as u64)
    }

    /// Destination row count, reported after a load as a sanity check.
    pub async fn row_count(&self) -> Result<u64, VectorStoreError> {
        let query = format!("SELECT COUNT(*) as count FROM {}", self.table_name);
        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| VectorStoreError::PostgresError(e.to_string()))?;
        let count: i64 = row.get("count");
        Ok(count as u64)
    }
}

fn create_table_sql(table_name: &str, store_kind: StoreKind, dimensions: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n\
         \x20   concept_id INT,\n\
         \x20   standard_concept_id INT,\n\
         \x20   embedding_vector {}({})\n\
         )",
        table_name,
        store_kind.column_type(),
        dimensions
    )
}

fn insert_sql(table_name: &str, store_kind: StoreKind) -> String {
    // The bound parameter is always a `vector`; halfvec columns take it
    // through an explicit cast.
    let value = match store_kind {
        StoreKind::PgVector => "$3",
        StoreKind::PgVectorHalfvec => "$3::halfvec",
    };
    format!(
        "INSERT INTO {table_name} (concept_id, standard_concept_id, embedding_vector) \
         VALUES ($1, $2, {value})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_bakes_in_dimensions() {
        let sql = create_table_sql("embeddings.concept_embeddings", StoreKind::PgVector, 3);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS embeddings.concept_embeddings"));
        assert!(sql.contains("embedding_vector vector(3)"));
    }

    #[test]
    fn test_create_table_halfvec_column_type() {
        let sql = create_table_sql("e.t", StoreKind::PgVectorHalfvec, 1536);
        assert!(sql.contains("embedding_vector halfvec(1536)"));
    }

    #[test]
    fn test_insert_casts_for_halfvec_only() {
        assert!(!insert_sql("e.t", StoreKind::PgVector).contains("::halfvec"));
        assert!(insert_sql("e.t", StoreKind::PgVectorHalfvec).contains("$3::halfvec"));
    }
}

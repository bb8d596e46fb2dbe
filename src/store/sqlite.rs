//! SQLite-backed [`VectorStore`].
//!
//! Vectors are stored as little-endian f32 BLOBs next to the chunk text.
//! Similarity search loads every vector of the configured dimension and
//! scores it in Rust; there is no ANN index.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{check_batch, rank, VectorStore};
use crate::config::Config;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{DocumentChunk, SearchHit};
use crate::{db, migrate};

pub struct SqliteStore {
    pool: SqlitePool,
    dims: usize,
}

impl SqliteStore {
    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config, dims: usize) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self { pool, dims })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize> {
        check_batch(chunks, vectors, self.dims)?;

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            sqlx::query(
                r#"
                INSERT INTO documents (id, filename, chunk_index, content, hash, metadata_json, embedding, dims, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.filename)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .bind(&chunk.hash)
            .bind(chunk.metadata().to_string())
            .bind(vec_to_blob(vector))
            .bind(vector.len() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(rows = chunks.len(), "inserted chunks into sqlite");
        Ok(chunks.len())
    }

    async fn similarity_search_with_score(
        &self,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let rows = sqlx::query(
            "SELECT filename, chunk_index, content, embedding FROM documents WHERE dims = ?",
        )
        .bind(self.dims as i64)
        .fetch_all(&self.pool)
        .await?;

        let hits = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                SearchHit {
                    content: row.get("content"),
                    filename: row.get("filename"),
                    chunk_index: Some(row.get("chunk_index")),
                    score: cosine_similarity(query_vec, &vec) as f64,
                }
            })
            .collect();

        Ok(rank(hits, k))
    }

    async fn list_filenames(&self) -> Result<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT filename FROM documents ORDER BY filename")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(filename: &str, index: i64, content: &str) -> DocumentChunk {
        DocumentChunk {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            chunk_index: index,
            content: content.to_string(),
            hash: crate::chunk::hash_text(content),
        }
    }

    async fn open_temp(tmp: &TempDir, dims: usize) -> SqliteStore {
        let config = Config::default_for(tmp.path().join("data").join("askdoc.sqlite"));
        SqliteStore::open(&config, dims).await.unwrap()
    }

    #[tokio::test]
    async fn insert_search_and_list() {
        let tmp = TempDir::new().unwrap();
        let store = open_temp(&tmp, 3).await;

        let written = store
            .insert(
                &[
                    chunk("manual.pdf", 0, "Battery lasts ten hours."),
                    chunk("manual.pdf", 1, "Charge with USB-C."),
                    chunk("policy.pdf", 0, "Returns within 30 days."),
                ],
                &[
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0],
                    vec![0.0, 0.0, 1.0],
                ],
            )
            .await
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(store.count().await.unwrap(), 3);

        let hits = store
            .similarity_search_with_score(&[0.0, 0.2, 0.9], 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "Returns within 30 days.");
        assert_eq!(hits[0].filename, "policy.pdf");
        assert!(hits[0].score > hits[1].score);

        assert_eq!(
            store.list_filenames().await.unwrap(),
            vec!["manual.pdf".to_string(), "policy.pdf".to_string()]
        );
        store.close().await;
    }

    #[tokio::test]
    async fn rows_persist_across_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = open_temp(&tmp, 2).await;
            store
                .insert(&[chunk("a.pdf", 0, "alpha")], &[vec![1.0, 0.0]])
                .await
                .unwrap();
            store.close().await;
        }
        let store = open_temp(&tmp, 2).await;
        assert_eq!(store.count().await.unwrap(), 1);
        store.close().await;
    }

    #[tokio::test]
    async fn dimension_mismatch_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = open_temp(&tmp, 2).await;
        let err = store
            .insert(
                &[chunk("a.pdf", 0, "alpha"), chunk("a.pdf", 1, "beta")],
                &[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 2"));
        assert_eq!(store.count().await.unwrap(), 0);
        store.close().await;
    }
}

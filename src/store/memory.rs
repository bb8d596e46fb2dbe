//! In-memory [`VectorStore`] implementation for tests and dry runs.
//!
//! Rows live in a `Vec` behind `std::sync::RwLock`. Search is brute-force
//! cosine similarity over every stored vector.

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use super::{check_batch, rank, VectorStore};
use crate::embedding::cosine_similarity;
use crate::models::{DocumentChunk, SearchHit};

struct StoredRow {
    chunk: DocumentChunk,
    vector: Vec<f32>,
}

pub struct InMemoryStore {
    dims: usize,
    rows: RwLock<Vec<StoredRow>>,
}

impl InMemoryStore {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            rows: RwLock::new(Vec::new()),
        }
    }

    fn poisoned() -> anyhow::Error {
        anyhow::anyhow!("in-memory store lock poisoned")
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize> {
        check_batch(chunks, vectors, self.dims)?;
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            rows.push(StoredRow {
                chunk: chunk.clone(),
                vector: vector.clone(),
            });
        }
        Ok(chunks.len())
    }

    async fn similarity_search_with_score(
        &self,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        let hits = rows
            .iter()
            .map(|row| SearchHit {
                content: row.chunk.content.clone(),
                filename: row.chunk.filename.clone(),
                chunk_index: Some(row.chunk.chunk_index),
                score: cosine_similarity(query_vec, &row.vector) as f64,
            })
            .collect();
        Ok(rank(hits, k))
    }

    async fn list_filenames(&self) -> Result<Vec<String>> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        let names: BTreeSet<String> = rows.iter().map(|r| r.chunk.filename.clone()).collect();
        Ok(names.into_iter().collect())
    }

    async fn count(&self) -> Result<i64> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(filename: &str, index: i64, content: &str) -> DocumentChunk {
        DocumentChunk {
            id: format!("{}-{}", filename, index),
            filename: filename.to_string(),
            chunk_index: index,
            content: content.to_string(),
            hash: String::new(),
        }
    }

    #[tokio::test]
    async fn insert_then_search_best_first() {
        let store = InMemoryStore::new(2);
        store
            .insert(
                &[chunk("a.pdf", 0, "east"), chunk("b.pdf", 0, "north")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();

        let hits = store
            .similarity_search_with_score(&[0.1, 0.9], 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "north");
        assert_eq!(hits[0].filename, "b.pdf");
        assert!(hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn wrong_dims_are_not_persisted() {
        let store = InMemoryStore::new(3);
        let err = store
            .insert(&[chunk("a.pdf", 0, "x")], &[vec![1.0, 0.0]])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 3"));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn filenames_are_distinct_and_sorted() {
        let store = InMemoryStore::new(1);
        store
            .insert(
                &[
                    chunk("b.pdf", 0, "x"),
                    chunk("a.pdf", 0, "y"),
                    chunk("b.pdf", 1, "z"),
                ],
                &[vec![1.0], vec![1.0], vec![1.0]],
            )
            .await
            .unwrap();
        assert_eq!(
            store.list_filenames().await.unwrap(),
            vec!["a.pdf".to_string(), "b.pdf".to_string()]
        );
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn empty_store_returns_no_hits() {
        let store = InMemoryStore::new(2);
        assert!(store
            .similarity_search_with_score(&[1.0, 0.0], 1)
            .await
            .unwrap()
            .is_empty());
    }
}

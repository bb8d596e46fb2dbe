//! Vector storage abstraction.
//!
//! The [`VectorStore`] trait is the only thing the ingest and retrieval
//! pipelines know about storage. Rows are append-only: there is no update
//! or delete.
//!
//! | Backend | Type | Notes |
//! |---------|------|-------|
//! | `sqlite` | [`SqliteStore`] | Local file, brute-force cosine in Rust |
//! | `supabase` | [`SupabaseStore`] | PostgREST insert + `match_documents` RPC |
//! | - | [`InMemoryStore`] | Tests and dry runs |

pub mod memory;
pub mod sqlite;
pub mod supabase;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::embedding::ensure_dims;
use crate::models::{DocumentChunk, SearchHit};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// Abstract document/vector storage service.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](VectorStore::insert) | Append chunks with their vectors |
/// | [`similarity_search_with_score`](VectorStore::similarity_search_with_score) | Top-k chunks by cosine similarity |
/// | [`list_filenames`](VectorStore::list_filenames) | Distinct source filenames |
/// | [`count`](VectorStore::count) | Number of stored rows |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for display.
    fn name(&self) -> &str;

    /// Append `chunks[i]` with `vectors[i]`. Returns the number of rows written.
    async fn insert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize>;

    /// Best matches for `query_vec`, highest score first, at most `k`.
    async fn similarity_search_with_score(
        &self,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Distinct filenames of stored chunks, sorted.
    async fn list_filenames(&self) -> Result<Vec<String>>;

    /// Total number of stored rows.
    async fn count(&self) -> Result<i64>;
}

/// Validate a batch before it is persisted: one vector per chunk, every
/// vector `dims` long, and no blank chunk content.
pub fn check_batch(chunks: &[DocumentChunk], vectors: &[Vec<f32>], dims: usize) -> Result<()> {
    if chunks.len() != vectors.len() {
        bail!(
            "got {} chunks but {} vectors; every chunk needs exactly one vector",
            chunks.len(),
            vectors.len()
        );
    }
    if let Some(c) = chunks.iter().find(|c| c.content.trim().is_empty()) {
        bail!(
            "chunk {} of {} has empty content",
            c.chunk_index,
            c.filename
        );
    }
    ensure_dims(vectors, dims)
}

/// Open the store configured in `[store]`, expecting `embedding.dims`-long vectors.
pub async fn open_store(config: &Config) -> Result<Box<dyn VectorStore>> {
    let dims = config.embedding.dims;
    match config.store.backend.as_str() {
        "sqlite" => Ok(Box::new(SqliteStore::open(config, dims).await?)),
        "supabase" => Ok(Box::new(SupabaseStore::new(&config.store, dims)?)),
        other => bail!("Unknown store backend: {}", other),
    }
}

/// Sort hits best-first and keep the top `k`.
pub(crate) fn rank(mut hits: Vec<SearchHit>, k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(k);
    hits
}

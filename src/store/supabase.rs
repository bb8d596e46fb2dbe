//! Supabase (PostgREST + pgvector) [`VectorStore`].
//!
//! Expects the table and match function that the usual Supabase vector
//! setup creates:
//!
//! ```sql
//! create table documents (
//!   id uuid primary key,
//!   content text,
//!   metadata jsonb,
//!   embedding vector(384)
//! );
//!
//! create function match_documents (query_embedding vector(384), match_count int)
//! returns table (id uuid, content text, metadata jsonb, similarity float)
//! ...
//! ```
//!
//! Requests authenticate with the `SUPABASE_KEY` environment variable, sent
//! as both `apikey` and bearer token.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::{check_batch, rank, VectorStore};
use crate::config::StoreConfig;
use crate::http;
use crate::models::{DocumentChunk, SearchHit};

const SUPABASE_TIMEOUT_SECS: u64 = 30;
const SUPABASE_MAX_RETRIES: u32 = 0;
/// Rows per page when listing. Matches PostgREST's default `max-rows`, so a
/// server-side cap never truncates a page silently.
const LIST_PAGE_SIZE: usize = 1000;

pub struct SupabaseStore {
    url: String,
    key: String,
    table: String,
    match_function: String,
    batch_size: usize,
    dims: usize,
    page_size: usize,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig, dims: usize) -> Result<Self> {
        let key = std::env::var("SUPABASE_KEY")
            .map_err(|_| anyhow::anyhow!("SUPABASE_KEY environment variable not set"))?;
        Self::with_key(config, dims, key)
    }

    pub fn with_key(config: &StoreConfig, dims: usize, key: String) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("store.url required for Supabase backend"))?;
        Ok(Self {
            url,
            key,
            table: config.table.clone(),
            match_function: config.match_function.clone(),
            batch_size: config.insert_batch_size.max(1),
            dims,
            page_size: LIST_PAGE_SIZE,
            client: http::client(SUPABASE_TIMEOUT_SECS)?,
        })
    }

    fn rest_url(&self, path: &str) -> String {
        http::join_url(&self.url, &format!("rest/v1/{}", path))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<usize> {
        check_batch(chunks, vectors, self.dims)?;
        let url = self.rest_url(&self.table);

        let rows: Vec<serde_json::Value> = chunks
            .iter()
            .zip(vectors.iter())
            .map(|(chunk, vector)| {
                serde_json::json!({
                    "id": chunk.id,
                    "content": chunk.content,
                    "metadata": chunk.metadata(),
                    "embedding": vector,
                })
            })
            .collect();

        for batch in rows.chunks(self.batch_size) {
            http::send_with_retry("Supabase", SUPABASE_MAX_RETRIES, || {
                self.authed(self.client.post(&url))
                    .header("Prefer", "return=minimal")
                    .json(batch)
            })
            .await?;
            debug!(rows = batch.len(), table = %self.table, "inserted batch into supabase");
        }

        Ok(chunks.len())
    }

    async fn similarity_search_with_score(
        &self,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let url = self.rest_url(&format!("rpc/{}", self.match_function));
        let body = serde_json::json!({
            "query_embedding": query_vec,
            "match_count": k,
        });

        let response = http::send_with_retry("Supabase", SUPABASE_MAX_RETRIES, || {
            self.authed(self.client.post(&url)).json(&body)
        })
        .await?;

        let json: serde_json::Value = response.json().await?;
        Ok(rank(parse_match_response(&json)?, k))
    }

    async fn list_filenames(&self) -> Result<Vec<String>> {
        let url = self.rest_url(&self.table);
        let limit = self.page_size.to_string();
        let mut names = BTreeSet::new();
        let mut offset = 0usize;

        // One row per chunk: page until a short page comes back.
        loop {
            let offset_param = offset.to_string();
            let response = http::send_with_retry("Supabase", SUPABASE_MAX_RETRIES, || {
                self.authed(self.client.get(&url)).query(&[
                    ("select", "filename:metadata->>filename"),
                    ("order", "id"),
                    ("limit", limit.as_str()),
                    ("offset", offset_param.as_str()),
                ])
            })
            .await?;

            let json: serde_json::Value = response.json().await?;
            let rows = json
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("Invalid Supabase response: expected an array"))?;
            names.extend(
                rows.iter()
                    .filter_map(|row| row.get("filename").and_then(|f| f.as_str()))
                    .map(|s| s.to_string()),
            );
            debug!(offset, rows = rows.len(), "listed supabase page");

            if rows.len() < self.page_size {
                break;
            }
            offset += rows.len();
        }

        Ok(names.into_iter().collect())
    }

    async fn count(&self) -> Result<i64> {
        let url = self.rest_url(&self.table);
        let response = http::send_with_retry("Supabase", SUPABASE_MAX_RETRIES, || {
            self.authed(self.client.get(&url))
                .query(&[("select", "id"), ("limit", "1")])
                .header("Prefer", "count=exact")
        })
        .await?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow::anyhow!("Supabase response missing Content-Range header"))?;
        parse_content_range_total(range)
    }
}

/// Rows from the match function: `[{content, metadata, similarity}, ...]`.
fn parse_match_response(json: &serde_json::Value) -> Result<Vec<SearchHit>> {
    let rows = json
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid Supabase match response: expected an array"))?;

    rows.iter()
        .map(|row| {
            let content = row
                .get("content")
                .and_then(|c| c.as_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid Supabase match row: missing content"))?;
            let score = row
                .get("similarity")
                .and_then(|s| s.as_f64())
                .ok_or_else(|| anyhow::anyhow!("Invalid Supabase match row: missing similarity"))?;
            let metadata = row.get("metadata");
            Ok(SearchHit {
                content: content.to_string(),
                filename: metadata
                    .and_then(|m| m.get("filename"))
                    .and_then(|f| f.as_str())
                    .unwrap_or("(unknown)")
                    .to_string(),
                chunk_index: metadata
                    .and_then(|m| m.get("chunk_index"))
                    .and_then(|i| i.as_i64()),
                score,
            })
        })
        .collect()
}

/// `Content-Range: 0-0/42` or `*/42` → 42.
fn parse_content_range_total(range: &str) -> Result<i64> {
    let total = range
        .rsplit('/')
        .next()
        .filter(|t| *t != "*")
        .ok_or_else(|| anyhow::anyhow!("Content-Range has no total: {}", range))?;
    total
        .parse::<i64>()
        .with_context(|| format!("Content-Range total is not a number: {}", range))
}

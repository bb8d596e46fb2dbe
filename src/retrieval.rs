//! Query-time retrieval and the confidence gate.
//!
//! A question is embedded with the same provider used at ingest time and
//! matched against the store. [`gate`] decides whether the best hit is good
//! enough to answer from directly.

use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::models::SearchHit;
use crate::store::{open_store, VectorStore};

/// Embed `query` and return up to `k` hits, best first.
///
/// Blank queries return no hits without touching the provider or store.
pub async fn search(
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    query: &str,
    k: usize,
) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = provider.embed_query(query).await?;
    let hits = store.similarity_search_with_score(&query_vec, k).await?;
    debug!(
        hits = hits.len(),
        best = hits.first().map(|h| h.score),
        "similarity search"
    );
    Ok(hits)
}

/// Accept the best hit only when its score is strictly above `threshold`.
pub fn gate(hits: Vec<SearchHit>, threshold: f64) -> Option<SearchHit> {
    hits.into_iter().next().filter(|hit| hit.score > threshold)
}

/// `askdoc search`: print the top hits with scores.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let provider = create_provider(&config.embedding)?;
    let store = open_store(config).await?;
    let k = limit.unwrap_or(config.retrieval.top_k);

    let hits = search(provider.as_ref(), store.as_ref(), query, k).await?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let marker = if hit.score > config.retrieval.threshold {
            ""
        } else {
            "  (below threshold)"
        };
        println!(
            "{}. [{:.2}] {}{}{}",
            i + 1,
            hit.score,
            hit.filename,
            hit.chunk_index
                .map(|c| format!(" #{}", c))
                .unwrap_or_default(),
            marker
        );
        println!("    {}", snippet(&hit.content, 160));
    }
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

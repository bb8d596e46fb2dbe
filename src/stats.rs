//! Store statistics.
//!
//! Used by `askdoc stats` to confirm that uploads landed: row count, stored
//! filenames, and the embedding model in effect. For the SQLite backend it
//! also shows the database size and a per-file breakdown.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::store::open_store;

struct FileStats {
    filename: String,
    chunk_count: i64,
    last_ingest_ts: i64,
}

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let total_chunks = store.count().await?;
    let filenames = store.list_filenames().await?;

    println!("askdoc store stats");
    println!("==================");
    println!();
    println!("  Backend:     {}", store.name());
    if config.store.backend == "sqlite" {
        let db_size = std::fs::metadata(&config.db.path)
            .map(|m| m.len())
            .unwrap_or(0);
        println!("  Database:    {}", config.db.path.display());
        println!("  Size:        {}", format_bytes(db_size));
    } else if let Some(url) = &config.store.url {
        println!("  URL:         {}", url);
        println!("  Table:       {}", config.store.table);
    }
    println!(
        "  Embedding:   {} ({}, {} dims)",
        config.embedding.model, config.embedding.provider, config.embedding.dims
    );
    println!();
    println!("  Documents:   {}", filenames.len());
    println!("  Chunks:      {}", total_chunks);

    if config.store.backend == "sqlite" {
        let breakdown = sqlite_breakdown(config).await?;
        if !breakdown.is_empty() {
            println!();
            println!("  By file:");
            println!("  {:<40} {:>8}   {}", "FILE", "CHUNKS", "INGESTED");
            println!("  {}", "-".repeat(66));
            for f in &breakdown {
                println!(
                    "  {:<40} {:>8}   {}",
                    f.filename,
                    f.chunk_count,
                    format_ts_relative(f.last_ingest_ts)
                );
            }
        }
    } else if !filenames.is_empty() {
        println!();
        for name in &filenames {
            println!("    {}", name);
        }
    }

    println!();
    Ok(())
}

async fn sqlite_breakdown(config: &Config) -> Result<Vec<FileStats>> {
    let pool = db::connect(config).await?;
    let rows = sqlx::query(
        r#"
        SELECT filename, COUNT(*) AS chunk_count, MAX(created_at) AS last_ts
        FROM documents
        GROUP BY filename
        ORDER BY chunk_count DESC, filename
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let stats = rows
        .iter()
        .map(|row| FileStats {
            filename: row.get("filename"),
            chunk_count: row.get("chunk_count"),
            last_ingest_ts: row.get("last_ts"),
        })
        .collect();

    pool.close().await;
    Ok(stats)
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp relative to now ("3 hours ago"), falling back
/// to a date after a month.
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;
    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

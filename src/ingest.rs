//! Ingestion pipeline orchestration.
//!
//! Coordinates the upload flow for each file: extraction → chunking →
//! embedding → storage. Files are processed one at a time. A file that fails
//! at any step is reported and skipped; the batch only fails when nothing
//! could be ingested.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::{create_provider, ensure_dims, EmbeddingProvider};
use crate::extract::extract_file;
use crate::progress::{IngestProgressEvent, IngestProgressReporter, ProgressMode};
use crate::store::{open_store, VectorStore};

/// Outcome of ingesting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub filename: String,
    pub chunks: usize,
    pub written: usize,
}

/// Extract, chunk, embed and store a single file.
///
/// Every chunk is embedded and checked against the provider's dimension
/// before anything is written, so a failed file leaves no rows behind.
pub async fn ingest_file(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    path: &Path,
    progress: &dyn IngestProgressReporter,
) -> Result<IngestReport> {
    let filename = display_name(path);
    let text = extract_file(path)?;
    let chunks = chunk_text(&filename, &text, &config.chunking);
    if chunks.is_empty() {
        bail!("{}: no text chunks produced", filename);
    }

    let total = chunks.len() as u64;
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(config.embedding.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let batch_vectors = provider
            .embed(&texts)
            .await
            .with_context(|| format!("{}: embedding failed", filename))?;
        ensure_dims(&batch_vectors, provider.dims())
            .with_context(|| format!("{}: embedding dimension mismatch", filename))?;
        vectors.extend(batch_vectors);

        progress.report(IngestProgressEvent::Embedding {
            file: filename.clone(),
            done: vectors.len() as u64,
            total,
        });
    }

    let written = store
        .insert(&chunks, &vectors)
        .await
        .with_context(|| format!("{}: storing chunks failed", filename))?;

    info!(file = %filename, chunks = chunks.len(), written, "ingested file");
    Ok(IngestReport {
        filename,
        chunks: chunks.len(),
        written,
    })
}

/// Expand directories into the PDF files beneath them (sorted). Plain file
/// arguments are passed through unchanged whatever their extension.
pub fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(e) => Some(e),
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable entry");
                        None
                    }
                })
                .filter(|e| e.file_type().is_file() && is_pdf(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `askdoc ingest`: process every file, print a summary.
pub async fn run_ingest(
    config: &Config,
    paths: &[PathBuf],
    dry_run: bool,
    progress: Option<ProgressMode>,
) -> Result<()> {
    let files = expand_paths(paths);
    if files.is_empty() {
        bail!("No PDF files found in the given paths.");
    }

    if dry_run {
        return dry_run_report(config, &files);
    }

    let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();
    let provider = create_provider(&config.embedding)?;
    let store = open_store(config).await?;

    let total = files.len() as u64;
    let mut succeeded = 0usize;
    let mut chunks_written = 0usize;

    for (i, path) in files.iter().enumerate() {
        reporter.report(IngestProgressEvent::Reading {
            file: display_name(path),
            n: i as u64 + 1,
            total,
        });
        match ingest_file(config, provider.as_ref(), store.as_ref(), path, reporter.as_ref()).await
        {
            Ok(report) => {
                println!("  {}: {} chunks", report.filename, report.written);
                succeeded += 1;
                chunks_written += report.written;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "ingest failed");
                println!("  {}: FAILED ({:#})", display_name(path), e);
            }
        }
    }

    println!("ingest ({} store)", store.name());
    println!("  files: {} / {}", succeeded, files.len());
    println!("  chunks written: {}", chunks_written);

    if succeeded == 0 {
        bail!("No files were ingested.");
    }
    println!("ok");
    Ok(())
}

fn dry_run_report(config: &Config, files: &[PathBuf]) -> Result<()> {
    println!("ingest (dry-run)");
    let mut ok = 0usize;
    let mut total_chunks = 0usize;
    for path in files {
        let name = display_name(path);
        match extract_file(path) {
            Ok(text) => {
                let n = chunk_text(&name, &text, &config.chunking).len();
                println!("  {}: {} chunks", name, n);
                total_chunks += n;
                ok += 1;
            }
            Err(e) => println!("  {}: FAILED ({})", name, e),
        }
    }
    println!("  files: {} / {}", ok, files.len());
    println!("  estimated chunks: {}", total_chunks);
    if ok == 0 {
        bail!("No files could be read.");
    }
    Ok(())
}

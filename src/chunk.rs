//! Fixed-size sliding-window text chunker.
//!
//! Splits extracted document text into overlapping windows of
//! `chunk_size` characters, advancing by `chunk_size - chunk_overlap`
//! each step. Sizes are counted in `char`s so a window never splits a
//! UTF-8 code point. Windows whose trimmed length falls below
//! `min_chunk_chars` are dropped.
//!
//! Each chunk receives a fresh UUID plus a SHA-256 hash of its content.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::DocumentChunk;

/// Split `text` into chunks for `filename`.
/// Returns chunks with contiguous indices starting at 0.
pub fn chunk_text(filename: &str, text: &str, config: &ChunkingConfig) -> Vec<DocumentChunk> {
    split_windows(
        text,
        config.chunk_size,
        config.chunk_overlap,
        config.min_chunk_chars,
    )
    .into_iter()
    .enumerate()
    .map(|(i, window)| make_chunk(filename, i as i64, window))
    .collect()
}

/// Slide a `size`-char window over `text` with step `size - overlap`.
///
/// Stops after the first window that reaches the end of the text, so the
/// tail is covered exactly once. Windows with fewer than `min_chars`
/// non-whitespace-trimmed chars are discarded.
///
/// `overlap` is clamped below `size` so the step is always at least 1.
pub fn split_windows(text: &str, size: usize, overlap: usize, min_chars: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let step = size - overlap.min(size - 1);

    // Byte offset of every char boundary, plus the end of the string.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let len = bounds.len();
    bounds.push(text.len());

    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + size).min(len);
        let window = &text[bounds[start]..bounds[end]];
        if window.trim().chars().count() >= min_chars.max(1) {
            windows.push(window.to_string());
        }
        if end == len {
            break;
        }
        start += step;
    }

    windows
}

fn make_chunk(filename: &str, index: i64, text: String) -> DocumentChunk {
    DocumentChunk {
        id: Uuid::new_v4().to_string(),
        filename: filename.to_string(),
        chunk_index: index,
        hash: hash_text(&text),
        content: text,
    }
}

pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

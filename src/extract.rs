//! Text extraction for uploaded documents.
//!
//! PDFs go through `pdf-extract`; plain-text and Markdown files are read as
//! UTF-8. Anything else is rejected. Extraction never panics: callers get an
//! [`ExtractError`] and decide whether to skip the file.

use std::path::Path;

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no text could be extracted from {0}")]
    Empty(String),
}

/// Guess a content type from a file extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "txt" => Some(MIME_TEXT),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        _ => None,
    }
}

/// Extracts plain text from in-memory content.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf_text(bytes),
        MIME_TEXT | MIME_MARKDOWN => Ok(String::from_utf8_lossy(bytes).into_owned()),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

/// Concatenated text of every page of a PDF.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Read a file from disk and extract its text. Files that yield only
/// whitespace are reported as [`ExtractError::Empty`].
pub fn extract_file(path: &Path) -> Result<String, ExtractError> {
    let display = path.display().to_string();
    let content_type = content_type_for(path).ok_or_else(|| {
        ExtractError::UnsupportedContentType(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e))
                .unwrap_or_else(|| display.clone()),
        )
    })?;

    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: display.clone(),
        source,
    })?;

    let text = extract_text(&bytes, content_type)?;
    if text.trim().is_empty() {
        return Err(ExtractError::Empty(display));
    }
    Ok(text)
}

//! Core data models used throughout askdoc.
//!
//! These types represent the chunks, search hits, answers, and photo
//! locations that flow through the document and photo pipelines.

/// A window of extracted document text, ready to be embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub id: String,
    pub filename: String,
    pub chunk_index: i64,
    pub content: String,
    pub hash: String,
}

impl DocumentChunk {
    /// Metadata stored alongside the row in the vector store.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "filename": self.filename,
            "chunk_index": self.chunk_index,
            "hash": self.hash,
        })
    }
}

/// A chunk returned by a similarity search, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub filename: String,
    pub chunk_index: Option<i64>,
    /// Cosine similarity in `[-1, 1]`; higher is closer.
    pub score: f64,
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    FromDocument(SearchHit),
    FromModel { model: String, text: String },
}

impl Answer {
    pub fn is_from_document(&self) -> bool {
        matches!(self, Answer::FromDocument(_))
    }

    /// Render the answer the way it is shown to the user and logged in the session.
    pub fn render(&self) -> String {
        match self {
            Answer::FromDocument(hit) => format!(
                "From document ({}, score {:.2}):\n\n{}",
                hit.filename, hit.score, hit.content
            ),
            Answer::FromModel { model, text } => format!("From {}:\n\n{}", model, text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in a chat session's message log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Where a photo was taken, optionally enriched with distance from a reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoLocation {
    pub filename: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub place: Option<String>,
}

impl PhotoLocation {
    pub fn new(filename: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            filename: filename.into(),
            latitude,
            longitude,
            distance_km: None,
            duration_min: None,
            place: None,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

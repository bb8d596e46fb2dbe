//! # askdoc
//!
//! Ask questions of your PDFs, and fall back to a generative model when the
//! documents don't know the answer. Also locates photos from their EXIF GPS
//! tags and measures the distances between them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │  PDFs    │──▶│ Chunk+Embed  │──▶│ VectorStore  │
//! │ (ingest) │   │              │   │ SQLite/Supa. │
//! └──────────┘   └──────────────┘   └──────┬───────┘
//!                                          │ top-k
//!                 question ──embed──▶ score > threshold?
//!                                     │yes          │no
//!                                     ▼             ▼
//!                               from document   from model
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! askdoc init
//! askdoc ingest ./manuals
//! askdoc ask "How long is the warranty?"
//! askdoc chat
//! askdoc photos IMG_0001.jpg IMG_0002.heic --origin 48.8566,2.3522
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF and text extraction |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store abstraction (SQLite, Supabase, memory) |
//! | [`ingest`] | Upload pipeline |
//! | [`retrieval`] | Similarity search and the confidence gate |
//! | [`llm`] | Generative fallback (Gemini, Ollama) |
//! | [`chat`] | Question answering sessions |
//! | [`geo`] | EXIF GPS, haversine, routing, geocoding |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod geo;
pub mod http;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod retrieval;
pub mod sources;
pub mod stats;
pub mod store;

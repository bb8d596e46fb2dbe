//! TOML configuration parsing and validation.
//!
//! Every section except `[db]` is optional and falls back to the defaults
//! below. Secrets (`GEMINI_API_KEY`, `OPENAI_API_KEY`, `SUPABASE_KEY`) are
//! read from the environment by the clients that need them, never from
//! the file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_match_function")]
    pub match_function: String,
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            table: default_table(),
            match_function: default_match_function(),
            insert_batch_size: default_insert_batch_size(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}
fn default_table() -> String {
    "documents".to_string()
}
fn default_match_function() -> String {
    "match_documents".to_string()
}
fn default_insert_batch_size() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_min_chunk_chars() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            top_k: default_top_k(),
        }
    }
}

fn default_threshold() -> f64 {
    0.7
}
fn default_top_k() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_dims(),
            url: None,
            batch_size: default_batch_size(),
            max_retries: 0,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_embedding_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_dims() -> usize {
    384
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            url: None,
            max_retries: 0,
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}
fn default_llm_model() -> String {
    "gemini-pro".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_url")]
    pub url: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            url: default_routing_url(),
            profile: default_profile(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_routing_url() -> String {
    "https://router.project-osrm.org".to_string()
}
fn default_profile() -> String {
    "driving".to_string()
}
fn default_http_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            url: default_geocoding_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}
fn default_user_agent() -> String {
    concat!("askdoc/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    /// Config with every section at its default, rooted at `db_path`.
    pub fn default_for(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            store: StoreConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            routing: RoutingConfig::default(),
            geocoding: GeocodingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    let chunking = &config.chunking;
    if chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if chunking.chunk_overlap >= chunking.chunk_size {
        bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            chunking.chunk_overlap,
            chunking.chunk_size
        );
    }
    if chunking.min_chunk_chars == 0 {
        bail!("chunking.min_chunk_chars must be >= 1");
    }

    // Validate retrieval
    if !(-1.0..=1.0).contains(&config.retrieval.threshold) {
        bail!("retrieval.threshold must be in [-1.0, 1.0]");
    }
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "local" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
            other
        ),
    }
    if config.embedding.is_enabled() && config.embedding.dims == 0 {
        bail!(
            "embedding.dims must be > 0 when provider is '{}'",
            config.embedding.provider
        );
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    // Validate store
    match config.store.backend.as_str() {
        "sqlite" => {}
        "supabase" => {
            if config.store.url.is_none() {
                bail!("store.url must be set when backend is 'supabase'");
            }
        }
        other => bail!(
            "Unknown store backend: '{}'. Must be sqlite or supabase.",
            other
        ),
    }
    if config.store.insert_batch_size == 0 {
        bail!("store.insert_batch_size must be > 0");
    }

    // Validate llm
    match config.llm.provider.as_str() {
        "disabled" | "gemini" | "ollama" => {}
        other => bail!(
            "Unknown llm provider: '{}'. Must be disabled, gemini, or ollama.",
            other
        ),
    }

    Ok(())
}

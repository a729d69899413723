use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Separator placed between distinct names when building embedding input text.
pub const TERM_SEPARATOR: &str = "; ";

/// Environment variable holding the vocabulary database connection string.
pub const ENV_VOCAB_CONNECTION: &str = "vocab_connection_string";

/// Environment variable holding the target (pgvector) connection string.
pub const ENV_TARGET_CONNECTION: &str = "target_connection_string";

/// Unified configuration for every pipeline step.
///
/// `system` is always required; the remaining sections are optional and each
/// subcommand demands the ones it needs up front via the accessor methods, so
/// a missing section fails at startup rather than at first field use.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub system: SystemConfig,

    #[serde(default)]
    pub terms: Option<TermsConfig>,

    #[serde(default)]
    pub vocabulary: Option<VocabularyConfig>,

    #[serde(default)]
    pub vector_store: Option<VectorStoreConfig>,

    #[serde(default)]
    pub record_counts: Option<RecordCountsConfig>,
}

impl PipelineConfig {
    /// Load and validate a pipeline configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(content)?;
        config.system.validate()?;
        Ok(config)
    }

    pub fn terms(&self) -> Result<&TermsConfig, ConfigError> {
        self.terms
            .as_ref()
            .ok_or(ConfigError::MissingSection("terms"))
    }

    pub fn vocabulary(&self) -> Result<&VocabularyConfig, ConfigError> {
        self.vocabulary
            .as_ref()
            .ok_or(ConfigError::MissingSection("vocabulary"))
    }

    pub fn vector_store(&self) -> Result<&VectorStoreConfig, ConfigError> {
        self.vector_store
            .as_ref()
            .ok_or(ConfigError::MissingSection("vector_store"))
    }

    pub fn record_counts(&self) -> Result<&RecordCountsConfig, ConfigError> {
        self.record_counts
            .as_ref()
            .ok_or(ConfigError::MissingSection("record_counts"))
    }
}

/// Paths and batch sizes shared by all steps.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    pub log_folder: PathBuf,

    pub terms_db_path: PathBuf,

    pub shard_folder: PathBuf,

    #[serde(default = "default_download_batch_size")]
    pub download_batch_size: usize,

    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,
}

fn default_download_batch_size() -> usize {
    10_000
}

fn default_embedding_batch_size() -> usize {
    96
}

fn default_embed_timeout_secs() -> u64 {
    120
}

impl SystemConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.download_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "download_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Filter criteria for the vocabulary query and text aggregation.
#[derive(Debug, Clone, Deserialize)]
pub struct TermsConfig {
    /// Empty means no domain filter.
    #[serde(default)]
    pub domain_ids: Vec<String>,

    #[serde(default)]
    pub include_classification_concepts: bool,

    /// Empty means no classification-vocabulary filter.
    #[serde(default)]
    pub classification_vocabularies: Vec<String>,

    #[serde(default = "default_true")]
    pub include_synonyms: bool,

    #[serde(default = "default_true")]
    pub include_mapped_terms: bool,

    #[serde(default = "default_max_text_characters")]
    pub max_text_characters: usize,

    #[serde(default)]
    pub restrict_to_used_concepts: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_text_characters() -> usize {
    2048
}

/// Location of the source vocabulary tables.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyConfig {
    pub schema: String,
}

/// Destination table for embedding vectors.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreConfig {
    pub schema: String,

    pub table: String,

    pub store_kind: StoreKind,
}

impl VectorStoreConfig {
    pub fn qualified_table_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Which pgvector column type the destination table uses.
///
/// Any other value in the YAML is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StoreKind {
    #[serde(rename = "pgvector")]
    PgVector,

    #[serde(rename = "pgvector_halfvec")]
    PgVectorHalfvec,
}

impl StoreKind {
    /// Postgres column type for this store kind.
    pub fn column_type(self) -> &'static str {
        match self {
            StoreKind::PgVector => "vector",
            StoreKind::PgVectorHalfvec => "halfvec",
        }
    }
}

/// Inputs for the concept_record_count step.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordCountsConfig {
    pub schema: String,

    pub counts_csv: PathBuf,
}

/// Read a required environment variable, surfacing a config error when unset.
pub fn require_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

//! Error types for the vocabulary embedding pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors related to configuration and environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("config section `{0}` is required by this command but missing")]
    MissingSection(&'static str),

    #[error("environment variable `{0}` is not set")]
    MissingEnv(&'static str),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to the local terms database.
#[derive(Debug, Error)]
pub enum TermStoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("unknown term source: {0}")]
    UnknownSource(String),
}

/// Errors related to the remote embedding API.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to build embedding client: {0}")]
    ConnectionError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors related to Parquet shard files.
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("no shard files found in {}", .0.display())]
    NoShards(PathBuf),

    #[error("shard {file} has {found} embedding columns, expected {expected}")]
    DimensionMismatch {
        file: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed shard {file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("refusing to write an empty shard")]
    EmptyChunk,

    #[error("chunk has {ids} rows but {embeddings} embeddings")]
    RowCountMismatch { ids: usize, embeddings: usize },
}

/// Errors related to the pgvector destination.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Postgres: {0}")]
    ConnectionError(String),

    #[error("pgvector extension error: {0}")]
    PgVectorExtensionError(String),

    #[error("table error: {0}")]
    TableError(String),

    #[error("insert error: {0}")]
    InsertError(String),

    #[error("Postgres error: {0}")]
    PostgresError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("term store error: {0}")]
    TermStore(#[from] TermStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("shard error: {0}")]
    Shard(#[from] ShardError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

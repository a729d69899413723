//! CLI module for the vocabulary embedding pipeline.

pub mod commands;

use clap::{Parser, Subcommand};

/// Medical vocabulary concept embedding pipeline.
#[derive(Debug, Parser)]
#[command(name = "vocembed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands, one per pipeline step.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download term records from the vocabulary database into the local terms database
    DownloadTerms(commands::DownloadTermsArgs),

    /// Build the concept_record_count table from an observed-counts CSV
    RecordCounts(commands::RecordCountsArgs),

    /// Aggregate terms, call the embedding API, and write Parquet shards
    CreateEmbeddings(commands::CreateEmbeddingsArgs),

    /// Load Parquet shards into the pgvector table
    UploadVectors(commands::UploadVectorsArgs),
}

//! upload-vectors command: Parquet shards → pgvector table.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use indicatif::ProgressBar;
use tracing::info;

use crate::error::ShardError;
use crate::models::{ENV_TARGET_CONNECTION, PipelineConfig, require_env};
use crate::services::{VectorStoreLoader, list_shards, read_shard};
use crate::utils::logging::init_file_logging;

/// Arguments for the upload-vectors command.
#[derive(Debug, Args)]
pub struct UploadVectorsArgs {
    /// Path to the YAML configuration file
    pub config: PathBuf,
}

/// Handle the upload-vectors command.
pub async fn handle_upload_vectors(args: UploadVectorsArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    init_file_logging(&config.system.log_folder, "logUploadEmbeddingVectors.txt")?;

    info!("Starting uploading embedding vectors");
    let vector_store = config.vector_store()?;

    let shards = list_shards(&config.system.shard_folder)?;
    let dimensions = read_shard(&shards[0])?.dimensions;

    let url = require_env(ENV_TARGET_CONNECTION)?;
    let loader = VectorStoreLoader::connect(&url, vector_store).await?;
    loader.create_table(dimensions).await?;

    let progress = ProgressBar::new(shards.len() as u64);
    let mut total = 0u64;
    for path in &shards {
        let contents = read_shard(path)?;
        if contents.dimensions != dimensions {
            return Err(ShardError::DimensionMismatch {
                file: path.display().to_string(),
                expected: dimensions,
                found: contents.dimensions,
            }
            .into());
        }

        info!("Processing shard '{}'", path.display());
        let inserted = loader.load_shard(&contents).await?;
        total += inserted;
        info!("Inserted {inserted} vectors, total: {total}");
        progress.inc(1);
    }
    progress.finish_and_clear();

    let count = loader.row_count().await?;
    info!("Vector table now holds {count} rows");
    info!("Finished uploading embedding vectors");
    Ok(())
}

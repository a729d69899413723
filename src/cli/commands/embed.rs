//! create-embeddings command: aggregated terms → embedding API → shards.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::models::{ConceptText, PipelineConfig, SourceFilter};
use crate::services::{EmbeddingClient, TermAggregator, TermStore, shard_path, write_shard};
use crate::utils::logging::init_file_logging;

/// Arguments for the create-embeddings command.
#[derive(Debug, Args)]
pub struct CreateEmbeddingsArgs {
    /// Path to the YAML configuration file
    pub config: PathBuf,
}

/// Handle the create-embeddings command.
pub async fn handle_create_embeddings(args: CreateEmbeddingsArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    init_file_logging(&config.system.log_folder, "logCreateEmbeddings.txt")?;

    info!("Starting to create embedding vectors");
    let terms_config = config.terms()?;
    std::fs::create_dir_all(&config.system.shard_folder)
        .context("failed to create shard folder")?;

    let client = EmbeddingClient::from_env(config.system.embed_timeout_secs)?;
    let store = TermStore::open(&config.system.terms_db_path)?;

    let batch_size = config.system.embedding_batch_size;
    let mut cursor = store.ordered_terms(SourceFilter::from(terms_config))?;
    let mut rows = cursor.rows()?;

    let mut aggregator = TermAggregator::new(terms_config.max_text_characters);
    let mut batch: Vec<ConceptText> = Vec::with_capacity(batch_size);
    let mut total = 0u64;

    while let Some(record) = rows.next()? {
        if let Some(concept_text) = aggregator.push(record) {
            batch.push(concept_text);
            if batch.len() == batch_size {
                total =
                    embed_chunk(&client, &config.system.shard_folder, &mut batch, total).await?;
            }
        }
    }
    if let Some(concept_text) = aggregator.finish() {
        batch.push(concept_text);
    }
    if !batch.is_empty() {
        total = embed_chunk(&client, &config.system.shard_folder, &mut batch, total).await?;
    }

    info!("Finished creating embedding vectors, total: {total}");
    Ok(())
}

/// Embed one chunk and write its shard, unless the shard already exists.
/// The running total always advances so later shards keep their ranges.
async fn embed_chunk(
    client: &EmbeddingClient,
    shard_folder: &Path,
    batch: &mut Vec<ConceptText>,
    total: u64,
) -> Result<u64> {
    let chunk = std::mem::take(batch);
    let start = total + 1;
    let end = total + chunk.len() as u64;
    let path = shard_path(shard_folder, start, end);

    if path.exists() {
        info!("Shard {} already exists, skipping", path.display());
    } else {
        let texts: Vec<String> = chunk.iter().map(|c| c.text.clone()).collect();
        let embeddings = client
            .embed(&texts)
            .await
            .context("embedding request failed")?;
        write_shard(&path, &chunk, &embeddings)?;
    }

    info!("Created {} embedding vectors, total: {end}", chunk.len());
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::read_shard;

    fn concept(concept_id: i32, text: &str) -> ConceptText {
        ConceptText {
            concept_id,
            standard_concept_id: concept_id,
            text: text.to_string(),
        }
    }

    // Port 1 is never listening, so any request fails immediately.
    fn unroutable_client() -> EmbeddingClient {
        EmbeddingClient::new(
            "http://127.0.0.1:1/embed".to_string(),
            "test-key".to_string(),
            1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_existing_shard_skipped_without_api_call() {
        let dir = tempfile::tempdir().unwrap();
        let concepts = vec![concept(1, "Aspirin"), concept(2, "Metformin")];
        let path = shard_path(dir.path(), 1, 2);
        write_shard(&path, &concepts, &[vec![0.1], vec![0.2]]).unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut batch = concepts.clone();
        let total = embed_chunk(&unroutable_client(), dir.path(), &mut batch, 0)
            .await
            .unwrap();

        // The chunk counts toward the total even though nothing was recomputed.
        assert_eq!(total, 2);
        assert!(batch.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_rerun_leaves_later_shard_ranges_intact() {
        let dir = tempfile::tempdir().unwrap();
        let first = vec![concept(1, "Aspirin"), concept(2, "Metformin")];
        write_shard(
            &shard_path(dir.path(), 1, 2),
            &first,
            &[vec![0.1], vec![0.2]],
        )
        .unwrap();
        let second = vec![concept(3, "Lisinopril")];
        write_shard(&shard_path(dir.path(), 3, 3), &second, &[vec![0.3]]).unwrap();

        let client = unroutable_client();
        let mut batch = first.clone();
        let total = embed_chunk(&client, dir.path(), &mut batch, 0).await.unwrap();
        let mut batch = second.clone();
        let total = embed_chunk(&client, dir.path(), &mut batch, total)
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(read_shard(&shard_path(dir.path(), 3, 3)).unwrap().rows.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_shard_attempts_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = vec![concept(1, "Aspirin")];
        let result = embed_chunk(&unroutable_client(), dir.path(), &mut batch, 0).await;

        assert!(result.is_err());
        assert!(!shard_path(dir.path(), 1, 1).exists());
    }
}

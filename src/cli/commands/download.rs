//! download-terms command: vocabulary query → local terms database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::models::{ENV_VOCAB_CONNECTION, PipelineConfig, TermRecord, require_env};
use crate::services::{TermStore, build_term_query, drain_in_chunks};
use crate::utils::logging::init_file_logging;

/// Arguments for the download-terms command.
#[derive(Debug, Args)]
pub struct DownloadTermsArgs {
    /// Path to the YAML configuration file
    pub config: PathBuf,
}

/// Handle the download-terms command.
pub async fn handle_download_terms(args: DownloadTermsArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    init_file_logging(&config.system.log_folder, "logDownloadTerms.txt")?;

    info!("Starting downloading vocabulary terms");
    let terms_config = config.terms()?;
    let vocabulary = config.vocabulary()?;

    let url = require_env(ENV_VOCAB_CONNECTION)?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .context("failed to connect to the vocabulary database")?;

    let query = build_term_query(&vocabulary.schema, terms_config);

    let mut store = TermStore::open(&config.system.terms_db_path)?;
    store.recreate_table()?;

    let mut statement = sqlx::query_as::<_, (i32, i32, String, String)>(&query.sql);
    for bind in &query.binds {
        statement = statement.bind(bind);
    }
    let rows = statement.fetch(&pool);

    let total = drain_in_chunks(rows, config.system.download_batch_size, |chunk| {
        let records = chunk
            .into_iter()
            .map(TermRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        store.insert_chunk(&records)?;
        Ok(())
    })
    .await?;

    info!("Finished downloading vocabulary terms, {total} rows");
    for (source, count) in store.source_counts()? {
        info!("Source: {source}, Count: {count}");
    }

    Ok(())
}

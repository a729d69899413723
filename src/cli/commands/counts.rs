//! record-counts command: observed-counts CSV → concept_record_count table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::Connection;
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::models::{ENV_TARGET_CONNECTION, PipelineConfig, require_env};
use crate::utils::logging::init_file_logging;

/// Arguments for the record-counts command.
#[derive(Debug, Args)]
pub struct RecordCountsArgs {
    /// Path to the YAML configuration file
    pub config: PathBuf,
}

/// Handle the record-counts command.
///
/// Runs on a single connection: the staging table is a temp table and must
/// stay visible to the rollup statement.
pub async fn handle_record_counts(args: RecordCountsArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    init_file_logging(&config.system.log_folder, "logRecordCounts.txt")?;

    let record_counts = config.record_counts()?;
    let url = require_env(ENV_TARGET_CONNECTION)?;
    let mut conn = PgConnection::connect(&url)
        .await
        .context("failed to connect to the target database")?;

    info!("Uploading observed concept counts to temp table");
    sqlx::query(
        "CREATE TEMP TABLE obs_concept_counts (concept_id INT PRIMARY KEY, record_count FLOAT)",
    )
    .execute(&mut conn)
    .await?;

    let csv = tokio::fs::read(&record_counts.counts_csv)
        .await
        .with_context(|| {
            format!(
                "failed to read counts CSV {}",
                record_counts.counts_csv.display()
            )
        })?;
    let mut copy = conn
        .copy_in_raw("COPY obs_concept_counts FROM STDIN WITH (FORMAT csv, HEADER true)")
        .await?;
    copy.send(csv.as_slice()).await?;
    let loaded = copy.finish().await?;
    info!("Staged {loaded} observed concept counts");

    info!("Including ancestors, creating concept_record_count table");
    sqlx::query(&rollup_sql(&record_counts.schema))
        .execute(&mut conn)
        .await?;

    info!("Creating index");
    sqlx::query(&index_sql(&record_counts.schema))
        .execute(&mut conn)
        .await?;

    info!("Finished creating concept_record_count table");
    Ok(())
}

/// Roll observed counts up to every ancestor concept.
fn rollup_sql(schema: &str) -> String {
    format!(
        "CREATE TABLE {schema}.concept_record_count AS\n\
         SELECT ancestor_concept_id AS concept_id,\n\
         \x20      SUM(record_count) AS record_count\n\
         FROM obs_concept_counts\n\
         INNER JOIN {schema}.concept_ancestor\n\
         \x20   ON obs_concept_counts.concept_id = concept_ancestor.descendant_concept_id\n\
         GROUP BY ancestor_concept_id"
    )
}

fn index_sql(schema: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS idx_concept_count_concept_id \
         ON {schema}.concept_record_count (concept_id)"
    )
}

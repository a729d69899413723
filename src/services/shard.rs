//! Parquet shard files, one per embedded chunk.
//!
//! A shard holds the rows for one contiguous 1-based index range and its
//! filename encodes that range, so an existing file means the chunk is done
//! and can be skipped on a rerun.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{ArrayRef, Float32Array, Int32Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::ShardError;
use crate::models::ConceptText;

pub const SHARD_PREFIX: &str = "EmbeddingVectors";
pub const SHARD_EXTENSION: &str = "parquet";

/// Leading non-embedding columns: concept_id, standard_concept_id.
pub const META_COLUMNS: usize = 2;

/// One row read back from a shard.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardRow {
    pub concept_id: i32,
    pub standard_concept_id: i32,
    pub embedding: Vec<f32>,
}

/// A fully decoded shard.
#[derive(Debug, Clone)]
pub struct ShardContents {
    pub dimensions: usize,
    pub rows: Vec<ShardRow>,
}

/// Path of the shard covering the inclusive 1-based row range `start..=end`.
pub fn shard_path(dir: &Path, start: u64, end: u64) -> PathBuf {
    dir.join(format!("{SHARD_PREFIX}{start}_{end}.{SHARD_EXTENSION}"))
}

/// Write one chunk of concepts and their embeddings as a shard file.
pub fn write_shard(
    path: &Path,
    concepts: &[ConceptText],
    embeddings: &[Vec<f32>],
) -> Result<(), ShardError> {
    if concepts.is_empty() {
        return Err(ShardError::EmptyChunk);
    }
    if concepts.len() != embeddings.len() {
        return Err(ShardError::RowCountMismatch {
            ids: concepts.len(),
            embeddings: embeddings.len(),
        });
    }
    let dimensions = embeddings[0].len();
    if embeddings.iter().any(|e| e.len() != dimensions) {
        return Err(ShardError::Malformed {
            file: path.display().to_string(),
            reason: "embeddings in chunk have differing dimensions".to_string(),
        });
    }

    let mut fields = vec![
        Field::new("concept_id", DataType::Int32, false),
        Field::new("standard_concept_id", DataType::Int32, false),
    ];
    for i in 0..dimensions {
        fields.push(Field::new(format!("embedding_{i}"), DataType::Float32, false));
    }
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(META_COLUMNS + dimensions);
    arrays.push(Arc::new(Int32Array::from_iter_values(
        concepts.iter().map(|c| c.concept_id),
    )));
    arrays.push(Arc::new(Int32Array::from_iter_values(
        concepts.iter().map(|c| c.standard_concept_id),
    )));
    for i in 0..dimensions {
        arrays.push(Arc::new(Float32Array::from_iter_values(
            embeddings.iter().map(|e| e[i]),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Read a whole shard back into memory.
pub fn read_shard(path: &Path) -> Result<ShardContents, ShardError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let num_columns = builder.schema().fields().len();
    if num_columns <= META_COLUMNS {
        return Err(ShardError::Malformed {
            file: path.display().to_string(),
            reason: format!("only {num_columns} columns, no embedding components"),
        });
    }
    let dimensions = num_columns - META_COLUMNS;

    let reader = builder.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let concept_ids = int32_column(&batch, 0, path)?;
        let standard_ids = int32_column(&batch, 1, path)?;
        let mut embedding_columns = Vec::with_capacity(dimensions);
        for i in 0..dimensions {
            embedding_columns.push(float32_column(&batch, META_COLUMNS + i, path)?);
        }
        for row in 0..batch.num_rows() {
            rows.push(ShardRow {
                concept_id: concept_ids.value(row),
                standard_concept_id: standard_ids.value(row),
                embedding: embedding_columns.iter().map(|c| c.value(row)).collect(),
            });
        }
    }

    Ok(ShardContents { dimensions, rows })
}

fn int32_column<'a>(
    batch: &'a RecordBatch,
    index: usize,
    path: &Path,
) -> Result<&'a Int32Array, ShardError> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| ShardError::Malformed {
            file: path.display().to_string(),
            reason: format!("column {index} is not Int32"),
        })
}

fn float32_column<'a>(
    batch: &'a RecordBatch,
    index: usize,
    path: &Path,
) -> Result<&'a Float32Array, ShardError> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| ShardError::Malformed {
            file: path.display().to_string(),
            reason: format!("column {index} is not Float32"),
        })
}

/// All shard files in a folder, sorted by name. Errors when there are none.
pub fn list_shards(dir: &Path) -> Result<Vec<PathBuf>, ShardError> {
    let mut shards: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == SHARD_EXTENSION))
        .collect();
    if shards.is_empty() {
        return Err(ShardError::NoShards(dir.to_path_buf()));
    }
    shards.sort();
    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(concept_id: i32, standard_concept_id: i32, text: &str) -> ConceptText {
        ConceptText {
            concept_id,
            standard_concept_id,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_shard_path_encodes_range() {
        let path = shard_path(Path::new("shards"), 1, 96);
        assert_eq!(
            path,
            Path::new("shards").join("EmbeddingVectors1_96.parquet")
        );
    }

    #[test]
    fn test_write_and_read_shard() {
        let dir = tempfile::tempdir().unwrap();
        let path = shard_path(dir.path(), 1, 2);
        let concepts = vec![concept(1, 1, "Aspirin; ASA"), concept(10, 1, "ASA tablet")];
        let embeddings = vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]];

        write_shard(&path, &concepts, &embeddings).unwrap();
        let contents = read_shard(&path).unwrap();

        assert_eq!(contents.dimensions, 3);
        assert_eq!(contents.rows.len(), 2);
        assert_eq!(contents.rows[0].concept_id, 1);
        assert_eq!(contents.rows[1].concept_id, 10);
        assert_eq!(contents.rows[1].standard_concept_id, 1);
        assert_eq!(contents.rows[1].embedding, vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_empty_chunk_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = shard_path(dir.path(), 1, 0);
        assert!(matches!(
            write_shard(&path, &[], &[]),
            Err(ShardError::EmptyChunk)
        ));
    }

    #[test]
    fn test_ragged_embeddings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = shard_path(dir.path(), 1, 2);
        let concepts = vec![concept(1, 1, "a"), concept(2, 2, "b")];
        let embeddings = vec![vec![0.1, 0.2], vec![0.3]];
        assert!(matches!(
            write_shard(&path, &concepts, &embeddings),
            Err(ShardError::Malformed { .. })
        ));
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = shard_path(dir.path(), 1, 2);
        let concepts = vec![concept(1, 1, "a")];
        let embeddings = vec![vec![0.1], vec![0.2]];
        assert!(matches!(
            write_shard(&path, &concepts, &embeddings),
            Err(ShardError::RowCountMismatch { .. })
        ));
    }

    #[test]
    fn test_list_shards_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for range in [(1, 2), (3, 4)] {
            let path = shard_path(dir.path(), range.0, range.1);
            write_shard(&path, &[concept(1, 1, "a")], &[vec![0.1]]).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let shards = list_shards(dir.path()).unwrap();
        assert_eq!(shards.len(), 2);
        assert!(shards[0] < shards[1]);
    }

    #[test]
    fn test_empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_shards(dir.path()),
            Err(ShardError::NoShards(_))
        ));
    }
}

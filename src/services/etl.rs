//! Chunked drain of a fallible row stream.

use anyhow::Result;
use futures::{Stream, StreamExt};
use tracing::info;

/// Pull rows from `rows` in chunks of at most `batch_size`, handing each
/// non-empty chunk to `sink` and logging a running total after every chunk.
///
/// A failed row or a failed sink call aborts the drain; chunks already handed
/// to the sink stay written. Returns the total number of rows delivered.
pub async fn drain_in_chunks<T, E, S, F>(
    mut rows: S,
    batch_size: usize,
    mut sink: F,
) -> Result<u64>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
    F: FnMut(Vec<T>) -> Result<()>,
{
    let mut total = 0u64;
    let mut chunk = Vec::with_capacity(batch_size);

    while let Some(row) = rows.next().await {
        chunk.push(row?);
        if chunk.len() == batch_size {
            total = flush(&mut chunk, &mut sink, total)?;
        }
    }
    if !chunk.is_empty() {
        total = flush(&mut chunk, &mut sink, total)?;
    }

    Ok(total)
}

fn flush<T, F>(chunk: &mut Vec<T>, sink: &mut F, total: u64) -> Result<u64>
where
    F: FnMut(Vec<T>) -> Result<()>,
{
    let len = chunk.len() as u64;
    sink(std::mem::take(chunk))?;
    let total = total + len;
    info!("Inserted {len} rows, total inserted: {total}");
    Ok(total)
}

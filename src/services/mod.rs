mod aggregate;
mod embedding;
mod etl;
mod query;
mod shard;
mod term_store;
mod vector_store;

pub use aggregate::TermAggregator;
pub use embedding::{EmbeddingClient, ENV_EMBED_ENDPOINT, ENV_EMBED_KEY};
pub use etl::drain_in_chunks;
pub use query::{TermQuery, build_term_query};
pub use shard::{
    SHARD_PREFIX, ShardContents, ShardRow, list_shards, read_shard, shard_path, write_shard,
};
pub use term_store::{TermCursor, TermRows, TermStore};
pub use vector_store::VectorStoreLoader;

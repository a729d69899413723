mod config;
mod term;

pub use config::{
    ENV_TARGET_CONNECTION, ENV_VOCAB_CONNECTION, PipelineConfig, RecordCountsConfig, StoreKind,
    SystemConfig, TERM_SEPARATOR, TermsConfig, VectorStoreConfig, VocabularyConfig, require_env,
};
pub use term::{ConceptText, SourceFilter, TermRecord, TermSource};

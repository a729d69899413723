mod counts;
mod download;
mod embed;
mod upload;

pub use counts::RecordCountsArgs;
pub use download::DownloadTermsArgs;
pub use embed::CreateEmbeddingsArgs;
pub use upload::UploadVectorsArgs;

pub use counts::handle_record_counts;
pub use download::handle_download_terms;
pub use embed::handle_create_embeddings;
pub use upload::handle_upload_vectors;

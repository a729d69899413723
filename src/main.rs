use anyhow::Result;
use clap::Parser;
use tokio::signal;

use vocembed::cli::commands::{
    handle_create_embeddings, handle_download_terms, handle_record_counts, handle_upload_vectors,
};
use vocembed::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tokio::select! {
        result = run_command(cli.command) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, aborting run...");
            eprintln!("Only completed shards are resumable; database writes are not deduplicated.");
        }
    }

    Ok(())
}

async fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::DownloadTerms(args) => {
            handle_download_terms(args).await?;
        }
        Commands::RecordCounts(args) => {
            handle_record_counts(args).await?;
        }
        Commands::CreateEmbeddings(args) => {
            handle_create_embeddings(args).await?;
        }
        Commands::UploadVectors(args) => {
            handle_upload_vectors(args).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

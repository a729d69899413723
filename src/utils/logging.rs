//! Log file initialization.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Route tracing output to a per-step log file under `log_folder`.
///
/// The folder is created if needed and the chosen path is echoed to stderr so
/// an operator watching the terminal knows where the run is being recorded.
/// Reruns append, so the file keeps the history of earlier runs.
pub fn init_file_logging(log_folder: &Path, file_name: &str) -> Result<(), ConfigError> {
    fs::create_dir_all(log_folder)?;
    let path = log_folder.join(file_name);
    let file = open_log_file(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();

    eprintln!("Logging to {}", path.display());
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File, ConfigError> {
    Ok(fs::OpenOptions::new().create(true).append(true).open(path)?)
}

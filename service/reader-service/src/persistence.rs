//! Saved-query files: the criterion list, match mode, source selector,
//! limited flag, and page size, round-tripped as pretty JSON.

use std::fs;
use std::path::{Path, PathBuf};

use analytics_model::SavedQuery;
use tracing::info;

/// File extension for saved query files.
pub const SAVED_QUERY_EXTENSION: &str = "savedquery.json";

/// Append the saved-query extension unless the path already carries it.
pub fn with_saved_query_extension(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(SAVED_QUERY_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(SAVED_QUERY_EXTENSION);
    PathBuf::from(name)
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("saved-query io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("saved-query format error: {0}")]
    Format(#[from] serde_json::Error),
}

pub fn save_query(path: &Path, query: &SavedQuery) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(query)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "saved query written");
    Ok(())
}

pub fn load_query(path: &Path) -> Result<SavedQuery, PersistenceError> {
    let json = fs::read_to_string(path)?;
    let query = serde_json::from_str(&json)?;
    info!(path = %path.display(), "saved query loaded");
    Ok(query)
}

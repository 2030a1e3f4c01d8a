use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::application::services::PolicyFile;

#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads every `*.txt` chunk file directly inside `dir`, ordered by file name.
#[instrument]
pub async fn load_policy_files(dir: &Path) -> Result<Vec<PolicyFile>, PolicyLoadError> {
    let read_dir_error = |source| PolicyLoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let path = entry.path();
        let is_text = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_text && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| PolicyLoadError::ReadFile {
                path: path.clone(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(file = %file_name, bytes = bytes.len(), "Loaded policy chunk file");
        files.push(PolicyFile {
            file_name,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(files)
}

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

/// Filesystem primitives the mirror needs. Errors stay raw so callers can
/// map them onto their own failure domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MirrorFilesystem: Send + Sync {
    /// File names of the regular files directly inside `dir`.
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<String>>;
    async fn remove_file(&self, path: &Path) -> io::Result<()>;
    async fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
    async fn exists(&self, path: &Path) -> io::Result<bool>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MirrorFilesystem for LocalFilesystem {
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path: PathBuf = entry.path();
            // follows symlinks, so a link to a regular file counts as one
            let metadata = match fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            };
            if !metadata.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::debug!(name = ?raw, "skipping non UTF-8 file name"),
            }
        }
        Ok(names)
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    async fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir).await
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(path).await
    }
}

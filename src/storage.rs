//! Flat on-disk file store rooted at the storage directory.

use axum::body::Bytes;
use futures_util::stream::{Stream, StreamExt};
use std::ffi::OsStr;
use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::pin::pin;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Writes the whole stream to `name`, truncating any previous file.
    ///
    /// The target is written in place. If the stream or the disk fails halfway
    /// the partial file stays behind.
    pub async fn store<S, E>(&self, name: &str, chunks: S) -> Result<u64, StorageError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let target = self.resolve_checked(name).await?;
        let mut file = File::create(&target).await?;
        let mut chunks = pin!(chunks);
        let mut written: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|err| StorageError::Interrupted(err.to_string()))?;
            if chunk.is_empty() {
                continue;
            }
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Opens `name` for reading and returns the handle with its length.
    pub async fn retrieve(&self, name: &str) -> Result<(File, u64), StorageError> {
        let target = self.resolve_checked(name).await?;
        let metadata = match fs::metadata(&target).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(err) => return Err(StorageError::Io(err)),
        };
        if metadata.is_dir() {
            return Err(StorageError::NotFound);
        }
        let file = File::open(&target).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Io(err),
        })?;
        Ok((file, metadata.len()))
    }

    /// Removes `name`. A missing file is reported as an I/O error.
    pub async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let target = self.resolve_checked(name).await?;
        fs::remove_file(target).await?;
        Ok(())
    }

    async fn resolve_checked(&self, name: &str) -> Result<PathBuf, StorageError> {
        let target = self.resolve(name)?;
        match fs::symlink_metadata(&target).await {
            Ok(metadata) if metadata.file_type().is_symlink() => Err(StorageError::InvalidName),
            Ok(_) => Ok(target),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(target),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    // Only a single plain component is accepted so every name maps to a file
    // directly inside the root.
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty() || name.contains(['/', '\\', '\0']) {
            return Err(StorageError::InvalidName);
        }
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(segment)), None) if segment == OsStr::new(name) => {
                Ok(self.root.join(segment))
            }
            _ => Err(StorageError::InvalidName),
        }
    }
}

#[derive(Debug)]
pub enum StorageError {
    InvalidName,
    NotFound,
    Interrupted(String),
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidName => f.write_str("invalid file name"),
            StorageError::NotFound => f.write_str("file not found"),
            StorageError::Interrupted(reason) => write!(f, "upload interrupted: {reason}"),
            StorageError::Io(err) => write!(f, "{err}"),
        }
    }
}

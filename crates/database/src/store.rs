use crate::error::DbError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A generic key -> bytes persistence mechanism.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, DbError>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DbError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, DbError> {
        fs::read(self.path_of(key)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DbError::NotFound(key.to_string()),
            _ => DbError::Io(e),
        })
    }

    /// Writes to a temporary sibling first and renames it into place, so a
    /// crash mid-write never leaves a truncated blob behind.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DbError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_of(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

//! Flat JSON document persistence
//!
//! Each store owns one file holding one whole collection. Loads never fail:
//! a missing, unreadable or malformed document yields an empty collection.
//! Saves rewrite the entire document through a temp file and a rename so a
//! crash mid-write leaves the previous version intact.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::StoreError;

/// A JSON document on disk holding a `T`
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Create a store backed by `path`; nothing is read or written yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, treating any failure as an empty collection
    pub fn load(&self) -> T {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no document yet");
                return T::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable document, starting empty");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                // Treated as empty; the next save overwrites the file.
                warn!(path = %self.path.display(), error = %e, "malformed document, starting empty");
                T::default()
            }
        }
    }

    /// Replace the document with `value`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document cannot be encoded or written.
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Sibling file used for the atomic rename
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.path.with_file_name(format!(".{}.tmp", file_name))
    }
}

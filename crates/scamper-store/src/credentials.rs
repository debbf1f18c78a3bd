// ABOUTME: Atomic save and load for the wallet credential blob.
// ABOUTME: Writes through a temp file with fsync and rename so readers never see a partial blob.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use scamper_core::CredentialBlob;
use thiserror::Error;
use ulid::Ulid;

/// Errors that can occur while reading or writing the credential file.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CredentialStoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A single plaintext file holding the serialized wallet credentials.
///
/// There is no locking. Each save writes its own uniquely named temp file and
/// renames it over the target, so concurrent saves never disturb each other's
/// temp file, the last rename wins, and readers only ever see a whole blob.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the blob back exactly as it was last written.
    /// Returns None if the file does not exist yet.
    pub fn load(&self) -> Result<Option<CredentialBlob>, CredentialStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                tracing::debug!(
                    path = %self.path.display(),
                    bytes = contents.len(),
                    "loaded wallet credentials"
                );
                Ok(Some(CredentialBlob::from(contents)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialStoreError::io(&self.path, e)),
        }
    }

    /// Overwrite the file with the given blob (write to a unique .tmp, fsync, rename).
    /// Creates the parent directory if it does not exist.
    pub fn save(&self, blob: &CredentialBlob) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CredentialStoreError::io(parent, e))?;
        }

        let tmp_path = self.tmp_path();
        if let Err(e) = write_and_rename(&tmp_path, &self.path, blob) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        tracing::debug!(
            path = %self.path.display(),
            bytes = blob.len(),
            "saved wallet credentials"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(format!(".{}.{}.tmp", std::process::id(), Ulid::new()));
        self.path.with_file_name(name)
    }
}

fn write_and_rename(
    tmp_path: &Path,
    path: &Path,
    blob: &CredentialBlob,
) -> Result<(), CredentialStoreError> {
    let mut file = File::create(tmp_path).map_err(|e| CredentialStoreError::io(tmp_path, e))?;
    file.write_all(blob.as_str().as_bytes())
        .map_err(|e| CredentialStoreError::io(tmp_path, e))?;
    file.sync_all()
        .map_err(|e| CredentialStoreError::io(tmp_path, e))?;
    drop(file);

    fs::rename(tmp_path, path).map_err(|e| CredentialStoreError::io(path, e))
}

//! Attachment files on the local filesystem.

use std::{
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use uuid::Uuid;

use crate::Error;

/// The largest file that may be uploaded, 10 MiB.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;
const ATTACHMENT_DIR: &str = "attachments";
const MAX_FILE_NAME_LENGTH: usize = 200;

/// Stores attachment files under a media root directory.
///
/// Each file is written to `attachments/{uuid}/{file name}` so that uploads
/// with the same name never clash.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` to a new file and return its location relative to the
    /// media root.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, Error> {
        let location = format!(
            "{ATTACHMENT_DIR}/{}/{}",
            Uuid::new_v4().simple(),
            safe_file_name(file_name)
        );
        let path = self.path(&location)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::StorageError(format!("could not create {}: {error}", parent.display()))
            })?;
        }

        fs::write(&path, bytes).map_err(|error| {
            Error::StorageError(format!("could not write {}: {error}", path.display()))
        })?;
        tracing::info!("Saved attachment {location}");

        Ok(location)
    }

    pub async fn read(&self, location: &str) -> Result<Vec<u8>, Error> {
        let path = self.path(location)?;

        tokio::fs::read(&path).await.map_err(|error| match error.kind() {
            ErrorKind::NotFound => Error::NotFound,
            _ => Error::StorageError(format!("could not read {}: {error}", path.display())),
        })
    }

    /// Delete the file at `location` and its directory.
    ///
    /// A file that is already gone is logged and ignored.
    pub fn remove(&self, location: &str) {
        let path = match self.path(location) {
            Ok(path) => path,
            Err(error) => {
                tracing::warn!("Not removing attachment {location}: {error}");
                return;
            }
        };

        match fs::remove_file(&path) {
            Ok(()) => tracing::info!("Removed attachment {location}"),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::warn!("Attachment file {location} was already missing");
            }
            Err(error) => {
                tracing::error!("Could not remove attachment {location}: {error}");
                return;
            }
        }

        if let Some(parent) = path.parent() {
            // Only succeeds when the upload directory is empty.
            let _ = fs::remove_dir(parent);
        }
    }

    fn path(&self, location: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(location);

        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(Error::StorageError(format!(
                "invalid attachment location {location:?}"
            )));
        }

        Ok(self.root.join(relative))
    }
}

/// Reduce an uploaded file name to letters, digits, dots, dashes and
/// underscores.
pub fn safe_file_name(file_name: &str) -> String {
    let base_name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base_name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') => c,
            _ => '_',
        })
        .take(MAX_FILE_NAME_LENGTH)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "attachment".to_owned()
    } else {
        cleaned.to_owned()
    }
}

#[cfg(test)]
mod storage_tests {
    use tempfile::TempDir;

    use crate::Error;

    use super::{MediaStorage, safe_file_name};

    #[test]
    fn safe_file_name_replaces_unsafe_characters() {
        assert_eq!(safe_file_name("receipt (1).pdf"), "receipt__1_.pdf");
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\Users\\me\\bill.png"), "bill.png");
        assert_eq!(safe_file_name(".."), "attachment");
        assert_eq!(safe_file_name(""), "attachment");
    }

    #[tokio::test]
    async fn saves_reads_and_removes_files() {
        let media_root = TempDir::new().unwrap();
        let storage = MediaStorage::new(media_root.path());

        let location = storage.save("receipt.pdf", b"%PDF").unwrap();

        assert!(location.starts_with("attachments/"));
        assert!(location.ends_with("/receipt.pdf"));
        assert_eq!(storage.read(&location).await.unwrap(), b"%PDF");

        storage.remove(&location);

        assert_eq!(storage.read(&location).await, Err(Error::NotFound));
    }

    #[test]
    fn same_name_gets_distinct_locations() {
        let media_root = TempDir::new().unwrap();
        let storage = MediaStorage::new(media_root.path());

        let first = storage.save("a.txt", b"1").unwrap();
        let second = storage.save("a.txt", b"2").unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn rejects_locations_outside_root() {
        let media_root = TempDir::new().unwrap();
        let storage = MediaStorage::new(media_root.path());

        assert!(matches!(
            storage.read("../secret").await,
            Err(Error::StorageError(_))
        ));
    }
}

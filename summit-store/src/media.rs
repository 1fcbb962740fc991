use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use summit_shared::{UploadError, UploadKind};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error(transparent)]
    Rejected(#[from] UploadError),

    #[error("media path escapes the media root: {0}")]
    BadPath(String),

    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Uploads on the local filesystem, one sub-directory per upload kind.
/// Stored paths are relative to the root and served under `/media`.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    root: PathBuf,
}

impl LocalMedia {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates an upload against its kind's rules and stores it under a
    /// fresh name. Returns the relative path.
    pub async fn save_upload(&self, kind: UploadKind, original_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let ext = kind.validate(original_name, bytes.len())?;
        let filename = format!("{}.{}", Uuid::new_v4().simple(), ext);
        self.write(kind, &filename, bytes).await
    }

    /// Stores generated content under a caller-chosen name, replacing any
    /// previous file of that name.
    pub async fn save_generated(&self, kind: UploadKind, filename: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let mut parts = Path::new(filename).components();
        if !matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None)) {
            return Err(MediaError::BadPath(filename.to_string()));
        }
        self.write(kind, filename, bytes).await
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), MediaError> {
        let path = self.resolve(relative)?;
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %relative, "removed media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, MediaError> {
        let path = self.resolve(relative)?;
        Ok(fs::read(path).await?)
    }

    async fn write(&self, kind: UploadKind, filename: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let dir = self.root.join(kind.dir());
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(filename), bytes).await?;

        let relative = format!("{}/{}", kind.dir(), filename);
        debug!(path = %relative, size = bytes.len(), "stored media file");
        Ok(relative)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let rel = Path::new(relative);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(MediaError::BadPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_lands_under_kind_dir() {
        let dir = tempdir().unwrap();
        let media = LocalMedia::new(dir.path());
        let path = media
            .save_upload(UploadKind::PaymentProof, "Bukti.PNG", b"not really a png")
            .await
            .unwrap();
        assert!(path.starts_with("bookings/payments/"));
        assert!(path.ends_with(".png"));
        assert_eq!(media.read(&path).await.unwrap(), b"not really a png");
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let dir = tempdir().unwrap();
        let media = LocalMedia::new(dir.path().join("media"));
        let err = media
            .save_upload(UploadKind::IdCard, "ktp.exe", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Rejected(UploadError::BadExtension { .. })));
        assert!(!media.root().exists());
    }

    #[tokio::test]
    async fn test_read_refuses_parent_dirs() {
        let dir = tempdir().unwrap();
        let media = LocalMedia::new(dir.path());
        assert!(matches!(
            media.read("../etc/passwd").await,
            Err(MediaError::BadPath(_))
        ));
        assert!(matches!(
            media.save_generated(UploadKind::QrCode, "a/b.png", b"x").await,
            Err(MediaError::BadPath(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_deletes_and_tolerates_missing() {
        let dir = tempdir().unwrap();
        let media = LocalMedia::new(dir.path());
        let path = media.save_upload(UploadKind::Selfie, "selfie.jpg", b"x").await.unwrap();
        assert!(dir.path().join(&path).exists());

        media.remove(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        media.remove(&path).await.unwrap();
        assert!(matches!(media.remove("../x.png").await, Err(MediaError::BadPath(_))));
    }
}

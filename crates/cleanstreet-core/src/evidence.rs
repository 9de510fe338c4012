//! Evidence (photo) storage.
//!
//! The core only needs two things from storage: put bytes and get a
//! reference back, and delete by reference. Deleting a reference that
//! no longer exists is not an error.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Image extensions accepted as evidence.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Errors raised by an evidence store.
#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reference that could escape the store's namespace.
    #[error("invalid evidence reference: {0}")]
    InvalidReference(String),

    /// Backend-specific failure.
    #[error("{0}")]
    Backend(String),
}

/// Binary evidence storage.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store `bytes` and return a reference to them.
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> std::result::Result<String, EvidenceError>;

    /// Remove stored evidence. Missing references are a no-op.
    async fn delete(&self, reference: &str) -> std::result::Result<(), EvidenceError>;
}

/// A photo uploaded with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl EvidenceUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// An upload field left blank by the client.
    pub fn is_empty(&self) -> bool {
        self.file_name.trim().is_empty() || self.bytes.is_empty()
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(self.file_name.trim())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Reject anything that is not an accepted image type.
    pub fn check_image(&self) -> Result<()> {
        match self.extension() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(CoreError::InvalidEvidence(format!(
                "{} is not one of {}",
                self.file_name,
                ALLOWED_EXTENSIONS.join(", ")
            ))),
        }
    }
}

/// Drop uploads the client left blank.
pub(crate) fn present(upload: Option<EvidenceUpload>) -> Option<EvidenceUpload> {
    upload.filter(|upload| !upload.is_empty())
}

/// Validate and store an upload under `prefix`, returning its reference.
pub(crate) async fn store_upload(
    store: &dyn EvidenceStore,
    prefix: &str,
    upload: &EvidenceUpload,
) -> Result<String> {
    upload.check_image()?;
    let reference = store
        .put(&upload.bytes, &format!("{}_{}", prefix, upload.file_name))
        .await?;
    debug!(reference = %reference, "Stored evidence");
    Ok(reference)
}

/// Best-effort delete used for rollback and cascade cleanup.
pub(crate) async fn release(store: &dyn EvidenceStore, reference: &str) -> bool {
    if reference.is_empty() {
        return true;
    }
    match store.delete(reference).await {
        Ok(()) => true,
        Err(err) => {
            warn!(reference = %reference, error = %err, "Failed to release evidence");
            false
        }
    }
}

/// Reduce a client-supplied file name to a safe single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            c if c.is_whitespace() => '_',
            _ => '-',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "evidence".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Evidence stored as files in one directory.
///
/// References are bare file names (`<uuid>_<sanitized name>`), so they
/// can be served directly from the upload directory.
#[derive(Debug, Clone)]
pub struct FsEvidenceStore {
    root: PathBuf,
}

impl FsEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the evidence files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it is missing.
    pub async fn ensure_dir(&self) -> std::result::Result<(), EvidenceError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, reference: &str) -> std::result::Result<PathBuf, EvidenceError> {
        let valid = !reference.is_empty()
            && !reference.contains(['/', '\\'])
            && reference != "."
            && reference != "..";
        if !valid {
            return Err(EvidenceError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(reference))
    }
}

#[async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> std::result::Result<String, EvidenceError> {
        let reference = format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(suggested_name)
        );
        tokio::fs::write(self.path_for(&reference)?, bytes).await?;
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> std::result::Result<(), EvidenceError> {
        match tokio::fs::remove_file(self.path_for(reference)?).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\bin pic.PNG"), "bin_pic.PNG");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("ünïcode?.gif"), "-n-code-.gif");
        assert_eq!(sanitize_file_name(""), "evidence");
    }

    #[test]
    fn test_check_image() {
        assert!(EvidenceUpload::new("bin.JPG", b"x".to_vec()).check_image().is_ok());
        assert!(EvidenceUpload::new("bin.jpeg", b"x".to_vec()).check_image().is_ok());
        assert!(matches!(
            EvidenceUpload::new("bin.pdf", b"x".to_vec()).check_image(),
            Err(CoreError::InvalidEvidence(_))
        ));
        assert!(matches!(
            EvidenceUpload::new("noext", b"x".to_vec()).check_image(),
            Err(CoreError::InvalidEvidence(_))
        ));
    }

    #[test]
    fn test_blank_upload_is_not_present() {
        assert!(present(Some(EvidenceUpload::new("", b"x".to_vec()))).is_none());
        assert!(present(Some(EvidenceUpload::new("a.png", Vec::new()))).is_none());
        assert!(present(None).is_none());
        assert!(present(Some(EvidenceUpload::new("a.png", b"x".to_vec()))).is_some());
    }

    #[tokio::test]
    async fn test_fs_store_put_and_delete() {
        let root = std::env::temp_dir().join(format!("cleanstreet-evidence-{}", Uuid::new_v4()));
        let store = FsEvidenceStore::new(&root);
        store.ensure_dir().await.unwrap();

        let reference = store.put(b"jpeg bytes", "before_my bin.jpg").await.unwrap();
        assert!(reference.ends_with("_before_my_bin.jpg"));
        let stored = tokio::fs::read(root.join(&reference)).await.unwrap();
        assert_eq!(stored, b"jpeg bytes");

        store.delete(&reference).await.unwrap();
        assert!(!root.join(&reference).exists());

        // Deleting again is a no-op.
        store.delete(&reference).await.unwrap();

        assert!(matches!(
            store.delete("../outside.jpg").await,
            Err(EvidenceError::InvalidReference(_))
        ));

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}

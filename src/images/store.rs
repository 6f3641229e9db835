use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::shared::AppError;

/// Collaborator owning the image files referenced by travel stories.
/// Stories only hold URLs; this trait is the whole file-system boundary.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the bytes and returns a public URL for the stored image.
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, AppError>;

    /// Releases the file behind a previously returned URL.
    async fn release(&self, image_url: &str) -> Result<(), AppError>;
}

/// Filesystem-backed image store serving files from an uploads directory.
pub struct LocalImageStore {
    uploads_dir: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(uploads_dir: PathBuf, public_base_url: String) -> Self {
        Self {
            uploads_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves a URL back to a file path. Only the basename is honoured,
    /// so a crafted URL cannot reach outside the uploads directory.
    fn file_path(&self, image_url: &str) -> Option<PathBuf> {
        let name = image_url.rsplit('/').next()?;
        if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
            return None;
        }
        Some(self.uploads_dir.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    #[instrument(skip(self, bytes))]
    async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, AppError> {
        fs::create_dir_all(&self.uploads_dir).await.map_err(|e| {
            warn!(error = %e, "Failed to create uploads directory");
            AppError::Store(e.to_string())
        })?;

        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.uploads_dir.join(&filename);

        fs::write(&path, bytes).await.map_err(|e| {
            warn!(error = %e, filename = %filename, "Failed to write image file");
            AppError::Store(e.to_string())
        })?;

        debug!(filename = %filename, size = bytes.len(), "Image stored");
        Ok(format!("{}/uploads/{}", self.public_base_url, filename))
    }

    #[instrument(skip(self))]
    async fn release(&self, image_url: &str) -> Result<(), AppError> {
        let path = self.file_path(image_url).ok_or_else(|| {
            AppError::Validation("imageUrl is not a valid upload reference".to_string())
        })?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(image_url = %image_url, "Image released");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Image not found".to_string()))
            }
            Err(e) => {
                warn!(error = %e, image_url = %image_url, "Failed to release image");
                Err(AppError::Store(e.to_string()))
            }
        }
    }
}

/// In-memory image store for development and testing: remembers stored and
/// released URLs without touching the filesystem.
pub struct RecordingImageStore {
    stored: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
    fail_release: bool,
}

impl Default for RecordingImageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingImageStore {
    pub fn new() -> Self {
        Self {
            stored: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            fail_release: false,
        }
    }

    /// A store whose `release` always fails, for exercising the best-effort
    /// delete path.
    pub fn failing_release() -> Self {
        Self {
            fail_release: true,
            ..Self::new()
        }
    }

    pub fn stored_urls(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn released_urls(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn store(&self, _bytes: &[u8], original_name: &str) -> Result<String, AppError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let url = format!(
            "http://localhost:8000/uploads/{}.{}",
            Uuid::new_v4(),
            extension
        );
        self.stored.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn release(&self, image_url: &str) -> Result<(), AppError> {
        if self.fail_release {
            return Err(AppError::Store("release disabled".to_string()));
        }
        self.released.lock().unwrap().push(image_url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalImageStore {
        let dir = std::env::temp_dir().join(format!("travelog-test-{}", Uuid::new_v4()));
        LocalImageStore::new(dir, "http://localhost:8000".to_string())
    }

    #[tokio::test]
    async fn test_store_then_release_round_trip() {
        let store = temp_store();

        let url = store.store(b"png-bytes", "photo.png").await.unwrap();
        assert!(url.starts_with("http://localhost:8000/uploads/"));
        assert!(url.ends_with(".png"));

        let path = store.file_path(&url).unwrap();
        assert!(path.exists());

        store.release(&url).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_missing_file_is_not_found() {
        let store = temp_store();

        let result = store
            .release("http://localhost:8000/uploads/missing.png")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_release_rejects_traversal() {
        let store = temp_store();

        let result = store.release("http://localhost:8000/uploads/..").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_recording_store_tracks_urls() {
        let store = RecordingImageStore::new();

        let url = store.store(b"bytes", "a.jpg").await.unwrap();
        store.release(&url).await.unwrap();

        assert_eq!(store.stored_urls(), vec![url.clone()]);
        assert_eq!(store.released_urls(), vec![url]);
    }
}

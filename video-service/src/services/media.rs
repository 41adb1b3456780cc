//! External media store seam and its local/test implementations.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::MediaAsset;

/// Raw file received from a client.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MediaUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Store-side resource class derived from the declared content type.
    pub fn resource_type(&self) -> &'static str {
        match self.content_type.split('/').next() {
            Some("image") => "image",
            Some("video") | Some("audio") => "video",
            _ => "raw",
        }
    }

    fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub asset: MediaAsset,
    /// Playback length in seconds, when the store reports one.
    pub duration: Option<f64>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, ServiceError>;

    /// Returns `Ok(false)` when the store has no such asset.
    async fn delete(&self, asset: &MediaAsset) -> Result<bool, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Writes files under a directory that is served at `public_base_url`.
pub struct LocalMediaStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .await
                .map_err(|e| ServiceError::Internal(e.into()))?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn path_for(&self, asset_id: &str) -> Option<PathBuf> {
        let safe = !asset_id.is_empty()
            && asset_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !asset_id.contains("..");
        safe.then(|| self.base_path.join(asset_id))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, ServiceError> {
        let asset_id = match upload.extension() {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };
        let path = self
            .path_for(&asset_id)
            .ok_or_else(|| ServiceError::UploadFailed("Invalid asset name".to_string()))?;

        fs::write(&path, &upload.data).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to write media file");
            ServiceError::UploadFailed("Failed to store media file".to_string())
        })?;

        Ok(UploadedAsset {
            asset: MediaAsset::new(
                asset_id.clone(),
                format!("{}/{}", self.public_base_url, asset_id),
                upload.resource_type(),
            ),
            duration: None,
        })
    }

    async fn delete(&self, asset: &MediaAsset) -> Result<bool, ServiceError> {
        let Some(path) = self.path_for(&asset.asset_id) else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        fs::metadata(&self.base_path)
            .await
            .map(|_| ())
            .map_err(|e| ServiceError::Internal(e.into()))
    }
}

/// Mock media store for testing
///
/// Records every upload and delete so tests can assert on exactly which
/// assets were touched. Failures can be injected per operation.
#[derive(Default)]
pub struct MockMediaStore {
    live: Mutex<HashSet<String>>,
    uploaded: Mutex<Vec<String>>,
    delete_attempts: Mutex<Vec<String>>,
    successful_uploads_left: Mutex<Option<usize>>,
    fail_deletes: Mutex<bool>,
    blank_urls: Mutex<bool>,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload after the next `n` fails.
    pub fn fail_uploads_after(&self, n: usize) {
        if let Ok(mut left) = self.successful_uploads_left.lock() {
            *left = Some(n);
        }
    }

    pub fn fail_deletes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_deletes.lock() {
            *flag = fail;
        }
    }

    /// Uploads still store the bytes but hand back an empty URL.
    pub fn return_blank_urls(&self, blank: bool) {
        if let Ok(mut flag) = self.blank_urls.lock() {
            *flag = blank;
        }
    }

    /// Asset ids of every successful upload, in order.
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Asset ids of every delete attempt, including failed ones.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.live
            .lock()
            .map(|l| l.contains(asset_id))
            .unwrap_or(false)
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> ServiceError {
        ServiceError::Internal(anyhow::anyhow!("Mock lock poisoned: {}", e))
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, ServiceError> {
        {
            let mut left = self.successful_uploads_left.lock().map_err(Self::poisoned)?;
            match *left {
                Some(0) => {
                    return Err(ServiceError::UploadFailed(
                        "Media store unavailable".to_string(),
                    ))
                }
                Some(ref mut n) => *n -= 1,
                None => {}
            }
        }

        let resource_type = upload.resource_type();
        let asset_id = format!("mock-{}", Uuid::new_v4());
        self.live
            .lock()
            .map_err(Self::poisoned)?
            .insert(asset_id.clone());
        self.uploaded
            .lock()
            .map_err(Self::poisoned)?
            .push(asset_id.clone());

        let url = if *self.blank_urls.lock().map_err(Self::poisoned)? {
            String::new()
        } else {
            format!("https://media.test/{}/{}", resource_type, asset_id)
        };

        Ok(UploadedAsset {
            asset: MediaAsset::new(asset_id, url, resource_type),
            duration: (resource_type == "video").then_some(42.5),
        })
    }

    async fn delete(&self, asset: &MediaAsset) -> Result<bool, ServiceError> {
        self.delete_attempts
            .lock()
            .map_err(Self::poisoned)?
            .push(asset.asset_id.clone());

        if *self.fail_deletes.lock().map_err(Self::poisoned)? {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Media store refused delete"
            )));
        }

        Ok(self
            .live
            .lock()
            .map_err(Self::poisoned)?
            .remove(&asset.asset_id))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

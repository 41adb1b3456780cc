//! Coordinates media uploads and deletions with the record writes that
//! reference them.
//!
//! Ordering rules:
//! - create/replace: upload first, commit the record, then discard what
//!   the record no longer references.
//! - remove: delete the record first, then discard its assets.
//!
//! Discards are best effort. A failed discard leaves an orphan in the media
//! store, which is logged and counted but never fails the request.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;

use super::error::ServiceError;
use super::media::{MediaStore, MediaUpload, UploadedAsset};
use crate::models::MediaAsset;

#[derive(Clone)]
pub struct MediaLifecycle {
    store: Arc<dyn MediaStore>,
}

impl MediaLifecycle {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Upload one file and insist on a usable reference back.
    pub async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, ServiceError> {
        let file_name = upload.file_name.clone();
        let uploaded = self.store.upload(upload).await?;

        if !uploaded.asset.is_usable() {
            tracing::error!(file_name = %file_name, "Media store returned an unusable reference");
            if !uploaded.asset.asset_id.trim().is_empty() {
                self.discard(&uploaded.asset).await;
            }
            return Err(ServiceError::UploadFailed(
                "Media store returned no usable reference".to_string(),
            ));
        }

        metrics::counter!("media_uploads_total", "resource_type" => uploaded.asset.resource_type.clone())
            .increment(1);
        tracing::info!(asset_id = %uploaded.asset.asset_id, "Media uploaded");
        Ok(uploaded)
    }

    /// Upload in order. If any upload fails, everything already uploaded in
    /// this call is discarded before the error is returned.
    pub async fn upload_all(
        &self,
        uploads: Vec<MediaUpload>,
    ) -> Result<Vec<UploadedAsset>, ServiceError> {
        let mut done: Vec<UploadedAsset> = Vec::with_capacity(uploads.len());

        for upload in uploads {
            match self.upload(upload).await {
                Ok(uploaded) => done.push(uploaded),
                Err(e) => {
                    self.discard_uploaded(&done).await;
                    return Err(e);
                }
            }
        }

        Ok(done)
    }

    /// Upload the new files, then run `commit` with their references. If the
    /// commit fails the new uploads are discarded and the commit error is
    /// returned.
    pub async fn create<T, F, Fut>(
        &self,
        uploads: Vec<MediaUpload>,
        commit: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(Vec<UploadedAsset>) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let uploaded = self.upload_all(uploads).await?;
        let assets: Vec<MediaAsset> = uploaded.iter().map(|u| u.asset.clone()).collect();

        match commit(uploaded).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(error = %e, "Record write failed after upload, discarding new media");
                self.discard_all(&assets).await;
                Err(e)
            }
        }
    }

    /// Replace `previous` with a freshly uploaded file.
    ///
    /// The previous asset is discarded only after `commit` succeeds. If the
    /// upload fails nothing else happens. If the commit fails the new upload
    /// is discarded and `previous` stays referenced.
    pub async fn replace<T, F, Fut>(
        &self,
        upload: MediaUpload,
        previous: Option<MediaAsset>,
        commit: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(UploadedAsset) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let uploaded = self.upload(upload).await?;
        let new_asset = uploaded.asset.clone();

        match commit(uploaded).await {
            Ok(value) => {
                if let Some(previous) = previous.filter(|p| p.asset_id != new_asset.asset_id) {
                    self.discard(&previous).await;
                }
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Record write failed after upload, discarding new media");
                self.discard(&new_asset).await;
                Err(e)
            }
        }
    }

    /// Delete the record via `delete_record`, then discard `assets`. Asset
    /// discards never turn a successful record delete into a failure.
    pub async fn remove<T, F, Fut>(
        &self,
        assets: Vec<MediaAsset>,
        delete_record: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let value = delete_record().await?;
        self.discard_all(&assets).await;
        Ok(value)
    }

    /// Best-effort delete. Returns whether the store confirmed removal.
    pub async fn discard(&self, asset: &MediaAsset) -> bool {
        match self.store.delete(asset).await {
            Ok(true) => {
                tracing::info!(asset_id = %asset.asset_id, "Media discarded");
                true
            }
            Ok(false) => {
                tracing::warn!(asset_id = %asset.asset_id, "Media store had no such asset");
                false
            }
            Err(e) => {
                metrics::counter!("media_orphaned_assets_total").increment(1);
                tracing::warn!(
                    asset_id = %asset.asset_id,
                    url = %asset.url,
                    error = %e,
                    "Failed to discard media, asset orphaned"
                );
                false
            }
        }
    }

    /// Each asset is attempted independently; one failure does not skip the
    /// others.
    pub async fn discard_all(&self, assets: &[MediaAsset]) {
        join_all(assets.iter().map(|asset| self.discard(asset))).await;
    }

    async fn discard_uploaded(&self, uploaded: &[UploadedAsset]) {
        let assets: Vec<MediaAsset> = uploaded.iter().map(|u| u.asset.clone()).collect();
        self.discard_all(&assets).await;
    }
}

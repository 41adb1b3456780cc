//! Cloudinary media store client.
//!
//! Uses the signed Upload API for `upload`/`destroy` and the Admin API
//! `ping` endpoint for health checks. Requests are signed with SHA-256 over
//! the alphabetically sorted parameters followed by the API secret.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::error::ServiceError;
use super::media::{MediaStore, MediaUpload, UploadedAsset};
use crate::config::CloudinaryConfig;
use crate::models::MediaAsset;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct CloudinaryStore {
    client: Client,
    config: CloudinaryConfig,
}

/// Subset of the upload response we persist.
#[derive(Debug, Deserialize)]
pub struct CloudinaryUpload {
    pub public_id: String,
    pub secure_url: Option<String>,
    pub url: Option<String>,
    pub resource_type: String,
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryDestroy {
    result: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Internal(e.into()))?;
        Ok(Self { client, config })
    }

    /// `sha256(k1=v1&k2=v2...<secret>)` with keys sorted.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let payload = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(self.config.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type,
            action
        )
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<CloudinaryError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string())
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, ServiceError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("timestamp", timestamp.clone())]);

        let part = multipart::Part::bytes(upload.data)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| ServiceError::ValidationError(format!("Invalid content type: {}", e)))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Cloudinary upload request failed");
                ServiceError::UploadFailed("Media store unreachable".to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::UploadFailed(e.to_string()))?;

        if !status.is_success() {
            let message = Self::error_message(&body);
            tracing::error!(status = %status, message = %message, "Cloudinary upload failed");
            return Err(ServiceError::UploadFailed(message));
        }

        let uploaded: CloudinaryUpload = serde_json::from_str(&body)
            .map_err(|e| ServiceError::UploadFailed(format!("Unexpected response: {}", e)))?;
        let url = uploaded
            .secure_url
            .or(uploaded.url)
            .unwrap_or_default();

        tracing::info!(
            public_id = %uploaded.public_id,
            resource_type = %uploaded.resource_type,
            "Cloudinary asset uploaded"
        );

        Ok(UploadedAsset {
            asset: MediaAsset::new(uploaded.public_id, url, uploaded.resource_type),
            duration: uploaded.duration,
        })
    }

    async fn delete(&self, asset: &MediaAsset) -> Result<bool, ServiceError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("public_id", asset.asset_id.clone()),
            ("timestamp", timestamp.clone()),
        ]);

        let params = [
            ("public_id", asset.asset_id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.endpoint(&asset.resource_type, "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        if !status.is_success() {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Cloudinary destroy failed: {}",
                Self::error_message(&body)
            )));
        }

        let destroyed: CloudinaryDestroy = serde_json::from_str(&body)
            .map_err(|e| ServiceError::Internal(e.into()))?;
        Ok(destroyed.result == "ok")
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        let url = format!(
            "{}/{}/ping",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name
        );

        let response = self
            .client
            .get(url)
            .basic_auth(
                &self.config.api_key,
                Some(self.config.api_secret.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(anyhow::anyhow!(
                "Cloudinary ping returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn store() -> CloudinaryStore {
        CloudinaryStore::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "1234".to_string(),
            api_secret: Secret::new("abcd".to_string()),
            api_base_url: "https://api.cloudinary.com/v1_1/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn signature_is_order_independent() {
        let store = store();
        let a = store.sign(&[
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample".to_string()),
        ]);
        let b = store.sign(&[
            ("public_id", "sample".to_string()),
            ("timestamp", "1315060510".to_string()),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_covers_secret() {
        let mut other = store();
        other.config.api_secret = Secret::new("other".to_string());
        let params = [("timestamp", "1".to_string())];
        assert_ne!(store().sign(&params), other.sign(&params));
    }

    #[test]
    fn endpoints_use_resource_type() {
        let store = store();
        assert_eq!(
            store.endpoint("video", "destroy"),
            "https://api.cloudinary.com/v1_1/demo/video/destroy"
        );
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(
            CloudinaryStore::error_message(r#"{"error":{"message":"Invalid Signature"}}"#),
            "Invalid Signature"
        );
        assert_eq!(CloudinaryStore::error_message("oops"), "oops");
    }
}

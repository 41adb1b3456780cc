use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use service_core::error::AppError;
use std::collections::HashMap;

use crate::services::media::MediaUpload;

/// A fully buffered multipart form: text fields plus named files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, MediaUpload>,
}

impl MultipartForm {
    /// Buffer every part. Any single file over `max_file_bytes` is a 413.
    /// Empty file parts are treated as absent.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await.map_err(multipart_error)?;

                    if data.len() > max_file_bytes {
                        return Err(AppError::PayloadTooLarge(anyhow::anyhow!(
                            "{} exceeds the {} byte upload limit",
                            name,
                            max_file_bytes
                        )));
                    }
                    if data.is_empty() {
                        continue;
                    }

                    form.files
                        .insert(name, MediaUpload::new(file_name, content_type, data.to_vec()));
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<MediaUpload> {
        self.files.remove(name)
    }

    /// The named file, or a 400 when it is missing.
    pub fn require_file(&mut self, name: &str) -> Result<MediaUpload, AppError> {
        self.take_file(name)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("{} file is required", name)))
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(anyhow::anyhow!("Request body exceeds the upload limit"))
    } else {
        AppError::BadRequest(anyhow::anyhow!("Invalid multipart body: {}", err.body_text()))
    }
}

//! Identity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MediaAsset, OwnedResource};

/// User identity as stored. Never serialized to clients directly; see
/// `dtos::UserResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Lower-cased, unique handle.
    pub username: String,
    /// Lower-cased, unique contact address.
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar: Option<MediaAsset>,
    pub cover_image: Option<MediaAsset>,
    /// SHA-256 of the single active refresh token, if a session exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_hash: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: &str,
        email: &str,
        full_name: String,
        password_hash: String,
        avatar: Option<MediaAsset>,
        cover_image: Option<MediaAsset>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username: normalize_handle(username),
            email: normalize_handle(email),
            full_name,
            password_hash,
            avatar,
            cover_image,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A profile belongs to itself.
impl OwnedResource for User {
    const KIND: &'static str = "profile";

    fn owner_id(&self) -> &str {
        &self.id
    }
}

/// Handles and addresses compare case-insensitively.
pub fn normalize_handle(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Merge-style update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<MediaAsset>,
    pub cover_image: Option<MediaAsset>,
}

impl UserUpdate {
    /// Apply this update to an in-memory copy.
    pub fn apply(self, user: &mut User) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = self.email {
            user.email = normalize_handle(&email);
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(cover_image) = self.cover_image {
            user.cover_image = Some(cover_image);
        }
        user.updated_at = Utc::now();
    }
}

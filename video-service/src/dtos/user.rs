use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;

/// Public view of an identity. Secrets are not representable here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar.map(|a| a.url),
            cover_image: user.cover_image.map(|c| c.url),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaAsset;

    #[test]
    fn response_omits_secrets() {
        let mut user = User::new(
            "carol",
            "carol@example.com",
            "Carol".to_string(),
            "$argon2id$secret".to_string(),
            Some(MediaAsset::new("av", "https://cdn/av.png", "image")),
            None,
        );
        user.refresh_token_hash = Some("deadbeef".to_string());

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        let body = json.to_string();
        assert!(!body.contains("argon2"));
        assert!(!body.contains("deadbeef"));
        assert_eq!(json["avatar"], "https://cdn/av.png");
        assert_eq!(json["fullName"], "Carol");
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}

use std::sync::Arc;

use super::error::ServiceError;
use super::lifecycle::MediaLifecycle;
use super::media::MediaUpload;
use super::ownership::ensure_owner;
use super::store::UserStore;
use crate::models::{User, UserUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileImage {
    Avatar,
    CoverImage,
}

/// Account details and profile images for the calling identity.
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserStore>,
    lifecycle: MediaLifecycle,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserStore>, lifecycle: MediaLifecycle) -> Self {
        Self { users, lifecycle }
    }

    pub async fn update_account(
        &self,
        user_id: &str,
        full_name: String,
        email: String,
    ) -> Result<User, ServiceError> {
        let update = UserUpdate {
            full_name: Some(full_name),
            email: Some(email),
            ..Default::default()
        };

        self.users
            .update_user(user_id, update)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    /// Upload the new image, point the profile at it, then discard the old
    /// one.
    pub async fn replace_image(
        &self,
        user_id: &str,
        which: ProfileImage,
        upload: MediaUpload,
    ) -> Result<User, ServiceError> {
        let current = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        ensure_owner(&current, user_id)?;

        let previous = match which {
            ProfileImage::Avatar => current.avatar,
            ProfileImage::CoverImage => current.cover_image,
        };

        let users = self.users.clone();
        let user_id = user_id.to_string();
        self.lifecycle
            .replace(upload, previous, move |uploaded| async move {
                let update = match which {
                    ProfileImage::Avatar => UserUpdate {
                        avatar: Some(uploaded.asset),
                        ..Default::default()
                    },
                    ProfileImage::CoverImage => UserUpdate {
                        cover_image: Some(uploaded.asset),
                        ..Default::default()
                    },
                };

                users
                    .update_user(&user_id, update)
                    .await?
                    .ok_or(ServiceError::UserNotFound)
            })
            .await
    }
}

//! Persistence seams. `MongoDb` is the production implementation and
//! `InMemoryDb` backs tests.

use async_trait::async_trait;

use super::error::ServiceError;
use crate::models::{User, UserUpdate, Video, VideoUpdate};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UserAlreadyExists` when username or email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError>;

    /// Matches either field; at least one must be provided.
    async fn find_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, ServiceError>;

    /// Returns the updated record, or `None` when the user does not exist.
    async fn update_user(&self, id: &str, update: UserUpdate)
        -> Result<Option<User>, ServiceError>;

    /// Replace (or clear) the active refresh token digest. Returns whether
    /// the user existed.
    async fn set_refresh_token_hash(
        &self,
        id: &str,
        hash: Option<&str>,
    ) -> Result<bool, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct VideoQuery {
    pub owner_id: Option<String>,
    pub include_unpublished: bool,
    /// 1-based.
    pub page: u64,
    pub limit: u64,
}

impl VideoQuery {
    /// Capped at `i64::MAX`, the largest skip the document store accepts.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn insert_video(&self, video: &Video) -> Result<(), ServiceError>;

    async fn find_video_by_id(&self, id: &str) -> Result<Option<Video>, ServiceError>;

    /// Newest first. Returns the page and the total match count.
    async fn list_videos(&self, query: &VideoQuery) -> Result<(Vec<Video>, u64), ServiceError>;

    async fn update_video(
        &self,
        id: &str,
        update: VideoUpdate,
    ) -> Result<Option<Video>, ServiceError>;

    /// Returns the removed record.
    async fn delete_video(&self, id: &str) -> Result<Option<Video>, ServiceError>;
}

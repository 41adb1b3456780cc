use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::error::ServiceError;
use super::store::{UserStore, VideoQuery, VideoStore};
use crate::models::user::normalize_handle;
use crate::models::{User, UserUpdate, Video, VideoUpdate};

/// In-process store used by tests and local runs without MongoDB.
/// Enforces the same username/email uniqueness as the unique indexes.
#[derive(Default)]
pub struct InMemoryDb {
    users: Mutex<HashMap<String, User>>,
    videos: Mutex<HashMap<String, Video>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ServiceError> {
    mutex
        .lock()
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Store lock poisoned: {}", e)))
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or_default()
    }

    pub fn video_count(&self) -> usize {
        self.videos.lock().map(|v| v.len()).unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for InMemoryDb {
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut users = lock(&self.users)?;
        let taken = users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken || users.contains_key(&user.id) {
            return Err(ServiceError::UserAlreadyExists);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(lock(&self.users)?.get(id).cloned())
    }

    async fn find_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, ServiceError> {
        let username = username.map(normalize_handle);
        let email = email.map(normalize_handle);
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        Ok(lock(&self.users)?
            .values()
            .find(|u| {
                username.as_deref() == Some(u.username.as_str())
                    || email.as_deref() == Some(u.email.as_str())
            })
            .cloned())
    }

    async fn update_user(
        &self,
        id: &str,
        update: UserUpdate,
    ) -> Result<Option<User>, ServiceError> {
        let mut users = lock(&self.users)?;

        if let Some(email) = update.email.as_deref().map(normalize_handle) {
            if users.values().any(|u| u.id != id && u.email == email) {
                return Err(ServiceError::UserAlreadyExists);
            }
        }

        Ok(users.get_mut(id).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }

    async fn set_refresh_token_hash(
        &self,
        id: &str,
        hash: Option<&str>,
    ) -> Result<bool, ServiceError> {
        Ok(lock(&self.users)?
            .get_mut(id)
            .map(|user| {
                user.refresh_token_hash = hash.map(str::to_string);
                user.updated_at = chrono::Utc::now();
            })
            .is_some())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        lock(&self.users).map(|_| ())
    }
}

#[async_trait]
impl VideoStore for InMemoryDb {
    async fn insert_video(&self, video: &Video) -> Result<(), ServiceError> {
        lock(&self.videos)?.insert(video.id.clone(), video.clone());
        Ok(())
    }

    async fn find_video_by_id(&self, id: &str) -> Result<Option<Video>, ServiceError> {
        Ok(lock(&self.videos)?.get(id).cloned())
    }

    async fn list_videos(&self, query: &VideoQuery) -> Result<(Vec<Video>, u64), ServiceError> {
        let mut matching: Vec<Video> = lock(&self.videos)?
            .values()
            .filter(|v| query.owner_id.as_deref().map_or(true, |o| v.owner_id == o))
            .filter(|v| query.include_unpublished || v.is_published)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn update_video(
        &self,
        id: &str,
        update: VideoUpdate,
    ) -> Result<Option<Video>, ServiceError> {
        Ok(lock(&self.videos)?.get_mut(id).map(|video| {
            update.apply(video);
            video.clone()
        }))
    }

    async fn delete_video(&self, id: &str) -> Result<Option<Video>, ServiceError> {
        Ok(lock(&self.videos)?.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaAsset;

    fn user(username: &str, email: &str) -> User {
        User::new(username, email, "Name".to_string(), "hash".to_string(), None, None)
    }

    fn video(owner: &str, published: bool) -> Video {
        let mut video = Video::new(
            owner.to_string(),
            "title".to_string(),
            "description".to_string(),
            MediaAsset::new("v", "https://cdn/v.mp4", "video"),
            MediaAsset::new("t", "https://cdn/t.png", "image"),
            Some(3.0),
        );
        video.is_published = published;
        video
    }

    #[tokio::test]
    async fn rejects_duplicate_username_case_insensitively() {
        let db = InMemoryDb::new();
        db.insert_user(&user("Bob", "bob@example.com")).await.unwrap();

        let err = db
            .insert_user(&user("bob", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserAlreadyExists));
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn refresh_hash_on_missing_user_reports_false() {
        let db = InMemoryDb::new();
        assert!(!db.set_refresh_token_hash("nobody", Some("h")).await.unwrap());
    }

    #[tokio::test]
    async fn listing_respects_publication_and_paging() {
        let db = InMemoryDb::new();
        for _ in 0..3 {
            db.insert_video(&video("u1", true)).await.unwrap();
        }
        db.insert_video(&video("u1", false)).await.unwrap();
        db.insert_video(&video("u2", true)).await.unwrap();

        let (page, total) = db
            .list_videos(&VideoQuery {
                owner_id: Some("u1".to_string()),
                include_unpublished: false,
                page: 1,
                limit: 2,
            })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);

        let (_, total) = db
            .list_videos(&VideoQuery {
                owner_id: Some("u1".to_string()),
                include_unpublished: true,
                page: 1,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total, 4);
    }
}

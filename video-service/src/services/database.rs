use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::error::ServiceError;
use super::store::{UserStore, VideoQuery, VideoStore};
use crate::models::{MediaAsset, User, UserUpdate, Video, VideoUpdate};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for video-service");

        for (field, name) in [("username", "username_unique"), ("email", "email_unique")] {
            let mut keys = Document::new();
            keys.insert(field, 1);

            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(name.to_string())
                        .build(),
                )
                .build();

            self.users().create_index(index, None).await.map_err(|e| {
                tracing::error!("Failed to create {} index on users collection: {}", name, e);
                AppError::from(e)
            })?;
            tracing::info!("Created unique index on users.{}", field);
        }

        let owner_index = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("owner_recent_lookup".to_string())
                    .build(),
            )
            .build();

        self.videos()
            .create_index(owner_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create owner index on videos collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on videos.(owner_id, created_at)");

        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn videos(&self) -> Collection<Video> {
        self.db.collection("videos")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_user_write(err: mongodb::error::Error) -> ServiceError {
    if is_duplicate_key(&err) {
        ServiceError::UserAlreadyExists
    } else {
        ServiceError::Database(err)
    }
}

fn asset_bson(asset: &MediaAsset) -> Result<bson::Bson, ServiceError> {
    bson::to_bson(asset).map_err(|e| ServiceError::Internal(e.into()))
}

fn now_bson() -> bson::DateTime {
    bson::DateTime::from_chrono(chrono::Utc::now())
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

fn user_set(update: UserUpdate) -> Result<Document, ServiceError> {
    let mut set = doc! { "updated_at": now_bson() };
    if let Some(full_name) = update.full_name {
        set.insert("full_name", full_name);
    }
    if let Some(email) = update.email {
        set.insert("email", crate::models::user::normalize_handle(&email));
    }
    if let Some(password_hash) = update.password_hash {
        set.insert("password_hash", password_hash);
    }
    if let Some(avatar) = update.avatar {
        set.insert("avatar", asset_bson(&avatar)?);
    }
    if let Some(cover_image) = update.cover_image {
        set.insert("cover_image", asset_bson(&cover_image)?);
    }
    Ok(set)
}

fn video_set(update: VideoUpdate) -> Result<Document, ServiceError> {
    let mut set = doc! { "updated_at": now_bson() };
    if let Some(title) = update.title {
        set.insert("title", title);
    }
    if let Some(description) = update.description {
        set.insert("description", description);
    }
    if let Some(thumbnail) = update.thumbnail {
        set.insert("thumbnail", asset_bson(&thumbnail)?);
    }
    if let Some(is_published) = update.is_published {
        set.insert("is_published", is_published);
    }
    Ok(set)
}

fn video_filter(query: &VideoQuery) -> Document {
    let mut filter = Document::new();
    if let Some(owner_id) = &query.owner_id {
        filter.insert("owner_id", owner_id.clone());
    }
    if !query.include_unpublished {
        filter.insert("is_published", true);
    }
    filter
}

#[async_trait]
impl UserStore for MongoDb {
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(map_user_write)?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, ServiceError> {
        let mut clauses = Vec::new();
        if let Some(username) = username {
            clauses.push(doc! { "username": username.trim().to_lowercase() });
        }
        if let Some(email) = email {
            clauses.push(doc! { "email": email.trim().to_lowercase() });
        }
        if clauses.is_empty() {
            return Ok(None);
        }

        Ok(self
            .users()
            .find_one(doc! { "$or": clauses }, None)
            .await?)
    }

    async fn update_user(
        &self,
        id: &str,
        update: UserUpdate,
    ) -> Result<Option<User>, ServiceError> {
        self.users()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": user_set(update)? },
                return_updated(),
            )
            .await
            .map_err(map_user_write)
    }

    async fn set_refresh_token_hash(
        &self,
        id: &str,
        hash: Option<&str>,
    ) -> Result<bool, ServiceError> {
        let update = match hash {
            Some(hash) => doc! {
                "$set": { "refresh_token_hash": hash, "updated_at": now_bson() }
            },
            None => doc! {
                "$unset": { "refresh_token_hash": "" },
                "$set": { "updated_at": now_bson() }
            },
        };

        let result = self
            .users()
            .update_one(doc! { "_id": id }, update, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::Database(e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl VideoStore for MongoDb {
    async fn insert_video(&self, video: &Video) -> Result<(), ServiceError> {
        self.videos().insert_one(video, None).await?;
        Ok(())
    }

    async fn find_video_by_id(&self, id: &str) -> Result<Option<Video>, ServiceError> {
        Ok(self.videos().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_videos(&self, query: &VideoQuery) -> Result<(Vec<Video>, u64), ServiceError> {
        let filter = video_filter(query);
        let total = self.videos().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(query.skip())
            .limit(query.limit as i64)
            .build();

        let videos: Vec<Video> = self
            .videos()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;

        Ok((videos, total))
    }

    async fn update_video(
        &self,
        id: &str,
        update: VideoUpdate,
    ) -> Result<Option<Video>, ServiceError> {
        Ok(self
            .videos()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": video_set(update)? },
                return_updated(),
            )
            .await?)
    }

    async fn delete_video(&self, id: &str) -> Result<Option<Video>, ServiceError> {
        Ok(self
            .videos()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_listing_filters_unpublished() {
        let filter = video_filter(&VideoQuery {
            owner_id: None,
            include_unpublished: false,
            page: 1,
            limit: 10,
        });
        assert_eq!(filter, doc! { "is_published": true });
    }

    #[test]
    fn owner_listing_includes_drafts() {
        let filter = video_filter(&VideoQuery {
            owner_id: Some("u1".to_string()),
            include_unpublished: true,
            page: 2,
            limit: 10,
        });
        assert_eq!(filter, doc! { "owner_id": "u1" });
    }

    #[test]
    fn partial_update_only_sets_present_fields() {
        let set = video_set(VideoUpdate {
            title: Some("New".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(set.contains_key("title"));
        assert!(set.contains_key("updated_at"));
        assert!(!set.contains_key("thumbnail"));
        assert!(!set.contains_key("description"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MediaAsset, OwnedResource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    /// Seconds, as reported by the media store.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    pub is_published: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(
        owner_id: String,
        title: String,
        description: String,
        video_file: MediaAsset,
        thumbnail: MediaAsset,
        duration: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            description,
            video_file,
            thumbnail,
            duration: duration.unwrap_or_default(),
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assets(&self) -> Vec<MediaAsset> {
        vec![self.video_file.clone(), self.thumbnail.clone()]
    }
}

impl OwnedResource for Video {
    const KIND: &'static str = "video";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaAsset>,
    pub is_published: Option<bool>,
}

impl VideoUpdate {
    pub fn apply(self, video: &mut Video) {
        if let Some(title) = self.title {
            video.title = title;
        }
        if let Some(description) = self.description {
            video.description = description;
        }
        if let Some(thumbnail) = self.thumbnail {
            video.thumbnail = thumbnail;
        }
        if let Some(is_published) = self.is_published {
            video.is_published = is_published;
        }
        video.updated_at = Utc::now();
    }
}

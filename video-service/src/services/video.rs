use std::sync::Arc;

use super::error::ServiceError;
use super::lifecycle::MediaLifecycle;
use super::media::MediaUpload;
use super::ownership::ensure_owner;
use super::store::{VideoQuery, VideoStore};
use crate::models::{Video, VideoUpdate};

#[derive(Debug)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: MediaUpload,
    pub thumbnail: MediaUpload,
}

#[derive(Debug, Default)]
pub struct VideoEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaUpload>,
}

#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoStore>,
    lifecycle: MediaLifecycle,
}

impl VideoService {
    pub fn new(videos: Arc<dyn VideoStore>, lifecycle: MediaLifecycle) -> Self {
        Self { videos, lifecycle }
    }

    pub async fn publish(&self, owner_id: &str, new: NewVideo) -> Result<Video, ServiceError> {
        let videos = self.videos.clone();
        let owner_id = owner_id.to_string();
        let NewVideo {
            title,
            description,
            video_file,
            thumbnail,
        } = new;

        let video = self
            .lifecycle
            .create(vec![video_file, thumbnail], move |uploaded| async move {
                let mut uploaded = uploaded.into_iter();
                let (Some(file), Some(thumb)) = (uploaded.next(), uploaded.next()) else {
                    return Err(ServiceError::UploadFailed(
                        "Media store returned fewer assets than requested".to_string(),
                    ));
                };

                let video = Video::new(
                    owner_id,
                    title,
                    description,
                    file.asset,
                    thumb.asset,
                    file.duration,
                );
                videos.insert_video(&video).await?;
                Ok(video)
            })
            .await?;

        tracing::info!(video_id = %video.id, owner_id = %video.owner_id, "Video published");
        Ok(video)
    }

    /// Unpublished videos are visible to their owner only.
    pub async fn get(&self, video_id: &str, caller_id: &str) -> Result<Video, ServiceError> {
        let video = self.find(video_id).await?;
        if !video.is_published && video.owner_id != caller_id {
            return Err(ServiceError::VideoNotFound);
        }
        Ok(video)
    }

    /// Published videos, plus drafts when the caller lists their own.
    pub async fn list(
        &self,
        owner_id: Option<String>,
        caller_id: &str,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<Video>, u64), ServiceError> {
        let include_unpublished = owner_id.as_deref() == Some(caller_id);
        self.videos
            .list_videos(&VideoQuery {
                owner_id,
                include_unpublished,
                page,
                limit,
            })
            .await
    }

    pub async fn update(
        &self,
        video_id: &str,
        caller_id: &str,
        edit: VideoEdit,
    ) -> Result<Video, ServiceError> {
        let video = self.find(video_id).await?;
        ensure_owner(&video, caller_id)?;

        let VideoEdit {
            title,
            description,
            thumbnail,
        } = edit;

        let Some(upload) = thumbnail else {
            let update = VideoUpdate {
                title,
                description,
                ..Default::default()
            };
            return self
                .videos
                .update_video(video_id, update)
                .await?
                .ok_or(ServiceError::VideoNotFound);
        };

        let videos = self.videos.clone();
        let id = video.id.clone();
        self.lifecycle
            .replace(upload, Some(video.thumbnail), move |uploaded| async move {
                let update = VideoUpdate {
                    title,
                    description,
                    thumbnail: Some(uploaded.asset),
                    ..Default::default()
                };
                videos
                    .update_video(&id, update)
                    .await?
                    .ok_or(ServiceError::VideoNotFound)
            })
            .await
    }

    /// Record first, then both assets.
    pub async fn delete(&self, video_id: &str, caller_id: &str) -> Result<Video, ServiceError> {
        let video = self.find(video_id).await?;
        ensure_owner(&video, caller_id)?;

        let videos = self.videos.clone();
        let id = video.id.clone();
        let removed = self
            .lifecycle
            .remove(video.assets(), move || async move {
                videos
                    .delete_video(&id)
                    .await?
                    .ok_or(ServiceError::VideoNotFound)
            })
            .await?;

        tracing::info!(video_id = %removed.id, "Video deleted");
        Ok(removed)
    }

    pub async fn toggle_publish(
        &self,
        video_id: &str,
        caller_id: &str,
    ) -> Result<Video, ServiceError> {
        let video = self.find(video_id).await?;
        ensure_owner(&video, caller_id)?;

        let update = VideoUpdate {
            is_published: Some(!video.is_published),
            ..Default::default()
        };
        self.videos
            .update_video(video_id, update)
            .await?
            .ok_or(ServiceError::VideoNotFound)
    }

    async fn find(&self, video_id: &str) -> Result<Video, ServiceError> {
        self.videos
            .find_video_by_id(video_id)
            .await?
            .ok_or(ServiceError::VideoNotFound)
    }
}

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        video::{ListVideosParams, PublishStatusResponse, VideoListResponse, VideoResponse},
        ApiResponse,
    },
    middleware::CurrentUser,
    services::{NewVideo, VideoEdit},
    utils::{validation::required, MultipartForm},
    AppState,
};

fn parse_video_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid video id")))
}

pub async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListVideosParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page();
    let limit = params.limit();
    let owner = params.user_id.filter(|id| !id.trim().is_empty());

    let (videos, total) = state
        .video_service
        .list(owner, &user.id, page, limit)
        .await?;

    Ok(Json(ApiResponse::ok(
        VideoListResponse {
            videos: videos.into_iter().map(VideoResponse::from).collect(),
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        },
        "Videos fetched successfully",
    )))
}

/// Multipart form with `title` and `description` text plus `video` and
/// `thumbnail` files
pub async fn upload_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart, state.config.media.max_upload_bytes).await?;

    let new = NewVideo {
        title: required(form.text("title"), "title")?,
        description: required(form.text("description"), "description")?,
        video_file: form.require_file("video")?,
        thumbnail: form.require_file("thumbnail")?,
    };

    let video = state.video_service.publish(&user.id, new).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED,
            VideoResponse::from(video),
            "Video uploaded successfully",
        )),
    ))
}

pub async fn get_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_video_id(&video_id)?;
    let video = state.video_service.get(&video_id, &user.id).await?;

    Ok(Json(ApiResponse::ok(
        VideoResponse::from(video),
        "Video fetched successfully",
    )))
}

/// Multipart form with `title`, `description` and an optional `thumbnail`
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_video_id(&video_id)?;
    let mut form = MultipartForm::read(multipart, state.config.media.max_upload_bytes).await?;

    let edit = VideoEdit {
        title: Some(required(form.text("title"), "title")?),
        description: Some(required(form.text("description"), "description")?),
        thumbnail: form.take_file("thumbnail"),
    };

    let video = state
        .video_service
        .update(&video_id, &user.id, edit)
        .await?;

    Ok(Json(ApiResponse::ok(
        VideoResponse::from(video),
        "Video updated successfully",
    )))
}

pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_video_id(&video_id)?;
    let removed = state.video_service.delete(&video_id, &user.id).await?;

    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "id": removed.id }),
        "Video deleted successfully",
    )))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_video_id(&video_id)?;
    let video = state
        .video_service
        .toggle_publish(&video_id, &user.id)
        .await?;

    Ok(Json(ApiResponse::ok(
        PublishStatusResponse {
            id: video.id,
            is_published: video.is_published,
        },
        "Publish status toggled successfully",
    )))
}

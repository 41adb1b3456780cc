mod common;

use axum::http::StatusCode;
use common::{asset_id, body_json, empty_request, image, multipart_request, video, Part, TestApp};
use video_service::services::VideoStore;

#[tokio::test]
async fn upload_stores_both_assets_and_duration() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;

    let video = app.uploaded_video(&owner).await;

    assert_eq!(video["ownerId"], owner.user_id.as_str());
    assert_eq!(video["duration"], 42.5);
    assert_eq!(video["isPublished"], true);
    assert_eq!(app.db.video_count(), 1);
    // avatar + video file + thumbnail
    assert_eq!(app.media.uploaded().len(), 3);
}

#[tokio::test]
async fn failed_thumbnail_upload_discards_video_file() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    // The video file succeeds, the thumbnail fails.
    app.media.fail_uploads_after(1);

    let response = app
        .send(multipart_request(
            "POST",
            "/api/v1/videos/upload",
            Some(&owner.access_token),
            &[
                Part::Text("title", "Doomed"),
                Part::Text("description", "Thumbnail will fail"),
                video("video"),
                image("thumbnail"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(app.db.video_count(), 0);

    let uploaded = app.media.uploaded();
    let video_file = uploaded.last().unwrap();
    assert_eq!(app.media.delete_attempts(), vec![video_file.clone()]);
    assert!(!app.media.contains(video_file));
}

#[tokio::test]
async fn upload_requires_both_files() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;

    let response = app
        .send(multipart_request(
            "POST",
            "/api/v1/videos/upload",
            Some(&owner.access_token),
            &[
                Part::Text("title", "No thumb"),
                Part::Text("description", "Missing thumbnail"),
                video("video"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.media.uploaded().len(), 1);
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let big = vec![0u8; app.state.config.media.max_upload_bytes + 1];

    let response = app
        .send(multipart_request(
            "POST",
            "/api/v1/videos/upload",
            Some(&owner.access_token),
            &[
                Part::Text("title", "Too big"),
                Part::Text("description", "Over the limit"),
                Part::File {
                    name: "video",
                    file_name: "huge.mp4",
                    content_type: "video/mp4",
                    data: &big,
                },
                image("thumbnail"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.db.video_count(), 0);
}

#[tokio::test]
async fn malformed_video_id_is_bad_request() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;

    let response = app
        .send(empty_request(
            "GET",
            "/api/v1/videos/watch/not-a-uuid",
            Some(&owner.access_token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_video_is_not_found() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/v1/videos/delete/{}", uuid::Uuid::new_v4()),
            Some(&owner.access_token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_cannot_update_delete_or_toggle() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let intruder = app.signed_in("intruder").await;
    let video = app.uploaded_video(&owner).await;
    let id = video["id"].as_str().unwrap();
    let uploads_before = app.media.uploaded().len();

    let update = app
        .send(multipart_request(
            "PATCH",
            &format!("/api/v1/videos/update/{}", id),
            Some(&intruder.access_token),
            &[
                Part::Text("title", "Hijacked"),
                Part::Text("description", "Not mine"),
                image("thumbnail"),
            ],
        ))
        .await;
    assert_eq!(update.status(), StatusCode::FORBIDDEN);

    let delete = app
        .send(empty_request(
            "DELETE",
            &format!("/api/v1/videos/delete/{}", id),
            Some(&intruder.access_token),
        ))
        .await;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);

    let toggle = app
        .send(empty_request(
            "PATCH",
            &format!("/api/v1/videos/toggle/publish/{}", id),
            Some(&intruder.access_token),
        ))
        .await;
    assert_eq!(toggle.status(), StatusCode::FORBIDDEN);

    // Nothing was uploaded, deleted or changed.
    assert_eq!(app.media.uploaded().len(), uploads_before);
    assert!(app.media.delete_attempts().is_empty());
    let stored = app.db.find_video_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "My first video");
    assert!(stored.is_published);
    assert!(app.media.contains(&asset_id(&video["thumbnail"])));
}

#[tokio::test]
async fn owner_replaces_thumbnail_and_old_one_is_discarded() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let video = app.uploaded_video(&owner).await;
    let old_thumbnail = asset_id(&video["thumbnail"]);

    let response = app
        .send(multipart_request(
            "PATCH",
            &format!("/api/v1/videos/update/{}", video["id"].as_str().unwrap()),
            Some(&owner.access_token),
            &[
                Part::Text("title", "Renamed"),
                Part::Text("description", "Fresh thumbnail"),
                image("thumbnail"),
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["title"], "Renamed");
    assert_ne!(updated["thumbnail"], video["thumbnail"]);
    assert_eq!(updated["videoFile"], video["videoFile"]);
    assert_eq!(app.media.delete_attempts(), vec![old_thumbnail.clone()]);
    assert!(!app.media.contains(&old_thumbnail));
    assert!(app.media.contains(&asset_id(&updated["thumbnail"])));
}

#[tokio::test]
async fn thumbnail_replace_succeeds_even_if_old_asset_delete_fails() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let video = app.uploaded_video(&owner).await;
    let old_thumbnail = asset_id(&video["thumbnail"]);
    app.media.fail_deletes(true);

    let response = app
        .send(multipart_request(
            "PATCH",
            &format!("/api/v1/videos/update/{}", video["id"].as_str().unwrap()),
            Some(&owner.access_token),
            &[
                Part::Text("title", "Renamed"),
                Part::Text("description", "Delete will fail"),
                image("thumbnail"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.media.delete_attempts(), vec![old_thumbnail]);
}

#[tokio::test]
async fn failed_thumbnail_upload_keeps_record_and_previous_asset() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let video = app.uploaded_video(&owner).await;
    let id = video["id"].as_str().unwrap();
    app.media.fail_uploads_after(0);

    let response = app
        .send(multipart_request(
            "PATCH",
            &format!("/api/v1/videos/update/{}", id),
            Some(&owner.access_token),
            &[
                Part::Text("title", "Should not stick"),
                Part::Text("description", "Upload fails"),
                image("thumbnail"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(app.media.delete_attempts().is_empty());
    let stored = app.db.find_video_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "My first video");
    assert_eq!(stored.thumbnail.url, video["thumbnail"].as_str().unwrap());
}

#[tokio::test]
async fn delete_removes_record_then_attempts_both_assets() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let video = app.uploaded_video(&owner).await;
    let id = video["id"].as_str().unwrap();
    // Every asset delete fails; each must still be attempted.
    app.media.fail_deletes(true);

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/v1/videos/delete/{}", id),
            Some(&owner.access_token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.db.find_video_by_id(id).await.unwrap().is_none());

    let mut attempts = app.media.delete_attempts();
    attempts.sort();
    let mut expected = vec![asset_id(&video["videoFile"]), asset_id(&video["thumbnail"])];
    expected.sort();
    assert_eq!(attempts, expected);
}

#[tokio::test]
async fn unpublished_video_is_visible_to_owner_only() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    let viewer = app.signed_in("viewer").await;
    let video = app.uploaded_video(&owner).await;
    let id = video["id"].as_str().unwrap();

    let toggle = app
        .send(empty_request(
            "PATCH",
            &format!("/api/v1/videos/toggle/publish/{}", id),
            Some(&owner.access_token),
        ))
        .await;
    assert_eq!(toggle.status(), StatusCode::OK);
    assert_eq!(body_json(toggle).await["data"]["isPublished"], false);

    let as_viewer = app
        .send(empty_request(
            "GET",
            &format!("/api/v1/videos/watch/{}", id),
            Some(&viewer.access_token),
        ))
        .await;
    assert_eq!(as_viewer.status(), StatusCode::NOT_FOUND);

    let as_owner = app
        .send(empty_request(
            "GET",
            &format!("/api/v1/videos/watch/{}", id),
            Some(&owner.access_token),
        ))
        .await;
    assert_eq!(as_owner.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_pages_published_videos() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    for _ in 0..3 {
        app.uploaded_video(&owner).await;
    }

    let response = app
        .send(empty_request(
            "GET",
            &format!("/api/v1/videos?page=1&limit=2&userId={}", owner.user_id),
            Some(&owner.access_token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["videos"].as_array().unwrap().len(), 2);
    assert_eq!(data["total"], 3);
    assert_eq!(data["totalPages"], 2);
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;
    app.uploaded_video(&owner).await;

    let response = app
        .send(empty_request(
            "GET",
            &format!("/api/v1/videos?page={}&limit=10", u64::MAX),
            Some(&owner.access_token),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert!(data["videos"].as_array().unwrap().is_empty());
    assert_eq!(data["total"], 1);
}

#[tokio::test]
async fn upload_reads_video_part_by_name() {
    let app = TestApp::new();
    let owner = app.signed_in("director").await;

    let response = app
        .send(multipart_request(
            "POST",
            "/api/v1/videos/upload",
            Some(&owner.access_token),
            &[
                Part::Text("title", "Wrong field"),
                Part::Text("description", "Video under another name"),
                video("videoFile"),
                image("thumbnail"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.db.video_count(), 0);
}

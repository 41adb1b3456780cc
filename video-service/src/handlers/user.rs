use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::ChangePasswordRequest,
        user::{UpdateAccountRequest, UserResponse},
        ApiResponse,
    },
    middleware::CurrentUser,
    services::ProfileImage,
    utils::{validation::required, MultipartForm, Password, ValidatedJson},
    AppState,
};

pub async fn current_user(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(ApiResponse::ok(
        UserResponse::from(user),
        "User fetched successfully",
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .change_password(
            &user.id,
            &Password::new(req.old_password),
            &Password::new(req.new_password),
        )
        .await?;

    Ok(Json(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    )))
}

pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let full_name = required(Some(&req.full_name), "fullName")?;
    let email = required(Some(&req.email), "email")?;

    let updated = state
        .profile_service
        .update_account(&user.id, full_name, email)
        .await?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(updated),
        "Account details updated successfully",
    )))
}

async fn replace_image(
    state: AppState,
    user_id: &str,
    multipart: Multipart,
    which: ProfileImage,
    field: &str,
) -> Result<UserResponse, AppError> {
    let mut form = MultipartForm::read(multipart, state.config.media.max_upload_bytes).await?;
    let upload = form.require_file(field)?;

    let updated = state
        .profile_service
        .replace_image(user_id, which, upload)
        .await?;
    Ok(updated.into())
}

pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let updated = replace_image(state, &user.id, multipart, ProfileImage::Avatar, "avatar").await?;
    Ok(Json(ApiResponse::ok(updated, "Avatar updated successfully")))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let updated = replace_image(
        state,
        &user.id,
        multipart,
        ProfileImage::CoverImage,
        "coverImage",
    )
    .await?;
    Ok(Json(ApiResponse::ok(
        updated,
        "Cover image updated successfully",
    )))
}

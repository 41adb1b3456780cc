use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, TokenPairResponse},
        user::UserResponse,
        ApiResponse,
    },
    middleware::CurrentUser,
    services::{CredentialPair, NewAccount},
    utils::{
        cookies::{self, REFRESH_TOKEN_COOKIE},
        validation::{optional, required},
        MultipartForm, Password, ValidatedJson,
    },
    AppState,
};

fn with_credentials(state: &AppState, jar: CookieJar, pair: &CredentialPair) -> CookieJar {
    let jwt = state.auth_service.jwt();
    cookies::set_credentials(
        jar,
        pair,
        jwt.access_token_ttl_seconds(),
        jwt.refresh_token_ttl_seconds(),
        &state.config.cookies,
    )
}

/// Create an account from a multipart form with a required `avatar` file
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = MultipartForm::read(multipart, state.config.media.max_upload_bytes).await?;

    let request = RegisterRequest {
        full_name: required(form.text("fullName"), "fullName")?,
        username: required(form.text("username"), "username")?.to_lowercase(),
        email: required(form.text("email"), "email")?.to_lowercase(),
        password: form
            .text("password")
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("password is required")))?,
    };
    request.validate()?;

    let avatar = form.require_file("avatar")?;
    let cover_image = form.take_file("coverImage");

    let user = state
        .auth_service
        .register(
            NewAccount {
                full_name: request.full_name,
                username: request.username,
                email: request.email,
                password: Password::new(request.password),
            },
            avatar,
            cover_image,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED,
            UserResponse::from(user),
            "User registered successfully",
        )),
    ))
}

/// Login with username or email plus password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = optional(req.username.as_deref());
    let email = optional(req.email.as_deref());
    if username.is_none() && email.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "username or email is required"
        )));
    }

    let (user, pair) = state
        .auth_service
        .login(
            username.as_deref(),
            email.as_deref(),
            &Password::new(req.password),
        )
        .await?;

    let jar = with_credentials(&state, jar, &pair);
    Ok((
        jar,
        Json(ApiResponse::ok(
            LoginResponse {
                user: user.into(),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "User logged in successfully",
        )),
    ))
}

/// Revoke the refresh token and clear both cookies
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&user.id).await?;

    let jar = cookies::clear_credentials(jar, &state.config.cookies);
    Ok((
        jar,
        Json(ApiResponse::ok(serde_json::json!({}), "User logged out")),
    ))
}

/// Rotate credentials. The refresh token comes from the cookie, else the
/// JSON body.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let from_cookie = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let token = from_cookie.or_else(|| body.and_then(|Json(b)| b.refresh_token));

    let pair = state.auth_service.refresh(token.as_deref()).await?;

    let jar = with_credentials(&state, jar, &pair);
    Ok((
        jar,
        Json(ApiResponse::ok(
            TokenPairResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Access token refreshed",
        )),
    ))
}

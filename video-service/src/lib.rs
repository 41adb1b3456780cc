pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::{MediaBackend, VideoConfig};
use crate::services::{
    AuthService, JwtService, MediaLifecycle, MediaStore, ProfileService, UserStore,
    VideoService, VideoStore,
};

/// Multipart overhead allowed on top of the per-file limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: VideoConfig,
    pub users: Arc<dyn UserStore>,
    pub media: Arc<dyn MediaStore>,
    pub auth_service: AuthService,
    pub profile_service: ProfileService,
    pub video_service: VideoService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        config: VideoConfig,
        users: Arc<dyn UserStore>,
        videos: Arc<dyn VideoStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let lifecycle = MediaLifecycle::new(media.clone());

        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );
        let register_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.register_attempts,
            config.rate_limit.register_window_seconds,
        );

        Self {
            auth_service: AuthService::new(users.clone(), jwt, lifecycle.clone()),
            profile_service: ProfileService::new(users.clone(), lifecycle.clone()),
            video_service: VideoService::new(videos, lifecycle),
            config,
            users,
            media,
            login_rate_limiter,
            register_rate_limiter,
        }
    }
}

fn cors_layer(config: &VideoConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/api/v1/users/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/api/v1/users/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let session_routes = Router::new()
        .route("/api/v1/users/logout", post(handlers::auth::logout))
        .route(
            "/api/v1/users/change-password",
            post(handlers::user::change_password),
        )
        .route(
            "/api/v1/users/current-user",
            get(handlers::user::current_user),
        )
        .route(
            "/api/v1/users/profile-update",
            patch(handlers::user::update_account),
        )
        .route(
            "/api/v1/users/update-avatar",
            patch(handlers::user::update_avatar),
        )
        .route(
            "/api/v1/users/update-cover-image",
            patch(handlers::user::update_cover_image),
        )
        .route("/api/v1/videos", get(handlers::video::list_videos))
        .route("/api/v1/videos/upload", post(handlers::video::upload_video))
        .route(
            "/api/v1/videos/watch/:video_id",
            get(handlers::video::get_video),
        )
        .route(
            "/api/v1/videos/update/:video_id",
            patch(handlers::video::update_video),
        )
        .route(
            "/api/v1/videos/delete/:video_id",
            delete(handlers::video::delete_video),
        )
        .route(
            "/api/v1/videos/toggle/publish/:video_id",
            patch(handlers::video::toggle_publish),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    let body_limit = state
        .config
        .media
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/api/v1/users/refresh-token",
            post(handlers::auth::refresh),
        )
        .merge(login_route)
        .merge(register_route)
        .merge(session_routes);

    if state.config.media.backend == MediaBackend::Local {
        app = app.nest_service("/media", ServeDir::new(&state.config.media.local_path));
    }

    app.with_state(state.clone())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
}

/// Store and media store reachability
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::ServiceUnavailable
    })?;

    state.media.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Media store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up",
            "media": "up"
        }
    })))
}

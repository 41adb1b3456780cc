//! Shared harness for video-service integration tests.
//!
//! Builds the real router over `InMemoryDb` and `MockMediaStore`, so every
//! test runs without MongoDB or a media provider.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use video_service::{
    build_router,
    config::{
        CookieConfig, Environment, JwtConfig, MediaBackend, MediaConfig, MongoConfig,
        RateLimitConfig, SameSitePolicy, SecurityConfig, VideoConfig,
    },
    services::{InMemoryDb, MockMediaStore},
    AppState,
};

pub const ACCESS_SECRET: &str = "test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &str = "test-refresh-secret-0123456789abcdef";
pub const PASSWORD: &str = "s3cret-passw0rd";

const BOUNDARY: &str = "----video-service-test-boundary";

pub fn test_config() -> VideoConfig {
    VideoConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "video-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: "mongodb://unused".to_string(),
            database: "unused".to_string(),
        },
        jwt: JwtConfig {
            access_token_secret: Secret::new(ACCESS_SECRET.to_string()),
            access_token_expiry_minutes: 15,
            refresh_token_secret: Secret::new(REFRESH_SECRET.to_string()),
            refresh_token_expiry_days: 10,
        },
        cookies: CookieConfig {
            secure: true,
            same_site: SameSitePolicy::Strict,
        },
        media: MediaConfig {
            backend: MediaBackend::Cloudinary,
            local_path: "unused".to_string(),
            public_base_url: "https://media.test".to_string(),
            cloudinary: None,
            max_upload_bytes: 64 * 1024,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            register_attempts: 100,
            register_window_seconds: 60,
        },
    }
}

/// Credentials returned by a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn image(name: &str) -> Part<'_> {
    Part::File {
        name,
        file_name: "image.png",
        content_type: "image/png",
        data: b"\x89PNG fake image bytes",
    }
}

pub fn video(name: &str) -> Part<'_> {
    Part::File {
        name,
        file_name: "clip.mp4",
        content_type: "video/mp4",
        data: b"fake mp4 bytes",
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(method: &str, uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// `name -> value` for every Set-Cookie header on the response.
pub fn set_cookies(response: &Response<Body>) -> HashMap<String, String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| {
            let pair = v.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Raw Set-Cookie header lines, for attribute assertions.
pub fn set_cookie_lines(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub db: Arc<InMemoryDb>,
    pub media: Arc<MockMediaStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: VideoConfig) -> Self {
        let db = Arc::new(InMemoryDb::new());
        let media = Arc::new(MockMediaStore::new());
        let state = AppState::new(config, db.clone(), db.clone(), media.clone());
        let router = build_router(state.clone());
        Self {
            router,
            state,
            db,
            media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, username: &str) -> Response<Body> {
        let email = format!("{}@example.com", username);
        self.send(multipart_request(
            "POST",
            "/api/v1/users/register",
            None,
            &[
                Part::Text("fullName", "Test User"),
                Part::Text("username", username),
                Part::Text("email", &email),
                Part::Text("password", PASSWORD),
                image("avatar"),
            ],
        ))
        .await
    }

    pub async fn login(&self, username: &str) -> Response<Body> {
        self.send(json_request(
            "POST",
            "/api/v1/users/login",
            None,
            serde_json::json!({ "username": username, "password": PASSWORD }),
        ))
        .await
    }

    /// Register and log in, returning the issued credentials.
    pub async fn signed_in(&self, username: &str) -> Session {
        let response = self.register(username).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self.login(username).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        Session {
            user_id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
            access_token: body["data"]["accessToken"].as_str().unwrap().to_string(),
            refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    /// Upload a video owned by `session` and return its JSON representation.
    pub async fn uploaded_video(&self, session: &Session) -> Value {
        let response = self
            .send(multipart_request(
                "POST",
                "/api/v1/videos/upload",
                Some(&session.access_token),
                &[
                    Part::Text("title", "My first video"),
                    Part::Text("description", "Testing uploads"),
                    video("video"),
                    image("thumbnail"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }
}

/// Asset id embedded in a `MockMediaStore` URL.
pub fn asset_id(url: &Value) -> String {
    url.as_str()
        .and_then(|u| u.rsplit('/').next())
        .unwrap()
        .to_string()
}

use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Process-wide configuration, built once at start-up and carried in `AppState`.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub cookies: CookieConfig,
    pub media: MediaConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// One secret and lifetime per credential class.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_token_secret: Secret<String>,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_secret: Secret<String>,
    pub refresh_token_expiry_days: i64,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub local_path: String,
    pub public_base_url: String,
    pub cloudinary: Option<CloudinaryConfig>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaBackend {
    Local,
    Cloudinary,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
}

impl VideoConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let backend: MediaBackend = get_env("MEDIA_BACKEND", Some("local"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let cloudinary = if backend == MediaBackend::Cloudinary {
            Some(CloudinaryConfig {
                cloud_name: get_env("CLOUDINARY_CLOUD_NAME", None, is_prod)?,
                api_key: get_env("CLOUDINARY_API_KEY", None, is_prod)?,
                api_secret: Secret::new(get_env("CLOUDINARY_API_SECRET", None, is_prod)?),
                api_base_url: env::var("CLOUDINARY_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string()),
            })
        } else {
            None
        };

        let config = VideoConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("video-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("videotube"), is_prod)?,
            },
            jwt: JwtConfig {
                access_token_secret: Secret::new(get_env("ACCESS_TOKEN_SECRET", None, is_prod)?),
                access_token_expiry_minutes: parse_num(get_env(
                    "ACCESS_TOKEN_EXPIRY_MINUTES",
                    Some("60"),
                    is_prod,
                )?)?,
                refresh_token_secret: Secret::new(get_env("REFRESH_TOKEN_SECRET", None, is_prod)?),
                refresh_token_expiry_days: parse_num(get_env(
                    "REFRESH_TOKEN_EXPIRY_DAYS",
                    Some("10"),
                    is_prod,
                )?)?,
            },
            cookies: CookieConfig {
                secure: get_env("COOKIE_SECURE", Some("true"), is_prod)?
                    .parse()
                    .unwrap_or(true),
                same_site: get_env("COOKIE_SAME_SITE", Some("strict"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            media: MediaConfig {
                backend,
                local_path: get_env("MEDIA_LOCAL_PATH", Some("public/media"), false)?,
                public_base_url: get_env(
                    "MEDIA_PUBLIC_BASE_URL",
                    Some("http://localhost:8000/media"),
                    false,
                )?,
                cloudinary,
                max_upload_bytes: parse_num(get_env(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    Some("104857600"),
                    is_prod,
                )?)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: get_env("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                login_window_seconds: get_env(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                register_attempts: get_env("RATE_LIMIT_REGISTER_ATTEMPTS", Some("3"), is_prod)?
                    .parse()
                    .unwrap_or(3),
                register_window_seconds: get_env(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    Some("3600"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(3600),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.access_token_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCESS_TOKEN_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.jwt.refresh_token_expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REFRESH_TOKEN_EXPIRY_DAYS must be positive"
            )));
        }

        if self.jwt.access_token_secret.expose_secret().is_empty()
            || self.jwt.refresh_token_secret.expose_secret().is_empty()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Token secrets must not be empty"
            )));
        }

        if self.jwt.access_token_secret.expose_secret()
            == self.jwt.refresh_token_secret.expose_secret()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
            )));
        }

        if self.media.max_upload_bytes == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MEDIA_MAX_UPLOAD_BYTES must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if !self.cookies.secure {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "COOKIE_SECURE cannot be disabled in production"
                )));
            }
        }

        Ok(())
    }
}

fn parse_num<T: std::str::FromStr>(value: String) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", value, e)))
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for MediaBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(MediaBackend::Local),
            "cloudinary" => Ok(MediaBackend::Cloudinary),
            _ => Err(format!("Invalid media backend: {}", s)),
        }
    }
}

impl std::str::FromStr for SameSitePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(SameSitePolicy::Strict),
            "lax" => Ok(SameSitePolicy::Lax),
            "none" => Ok(SameSitePolicy::None),
            _ => Err(format!("Invalid same-site policy: {}", s)),
        }
    }
}

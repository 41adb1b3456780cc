pub mod auth;
pub mod metrics;
pub mod user;
pub mod video;

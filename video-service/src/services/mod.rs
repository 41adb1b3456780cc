pub mod auth;
pub mod cloudinary;
pub mod database;
pub mod error;
pub mod jwt;
pub mod lifecycle;
pub mod media;
pub mod memory;
pub mod metrics;
pub mod ownership;
pub mod profile;
pub mod store;
pub mod video;

pub use auth::{AuthService, NewAccount};
pub use cloudinary::CloudinaryStore;
pub use database::MongoDb;
pub use error::ServiceError;
pub use jwt::{CredentialError, CredentialPair, JwtService};
pub use lifecycle::MediaLifecycle;
pub use media::{LocalMediaStore, MediaStore, MediaUpload, MockMediaStore, UploadedAsset};
pub use memory::InMemoryDb;
pub use profile::{ProfileImage, ProfileService};
pub use store::{UserStore, VideoQuery, VideoStore};
pub use video::{NewVideo, VideoEdit, VideoService};

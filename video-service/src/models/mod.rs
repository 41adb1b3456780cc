pub mod media;
pub mod user;
pub mod video;

pub use media::MediaAsset;
pub use user::{User, UserUpdate};
pub use video::{Video, VideoUpdate};

/// A persisted record that exactly one identity may replace or delete.
pub trait OwnedResource {
    /// Human-readable kind, used in rejection messages.
    const KIND: &'static str;

    fn owner_id(&self) -> &str;
}

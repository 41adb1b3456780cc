use serde::{Deserialize, Serialize};

/// Pointer to bytes held by the external media store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Store-side identifier used for deletion.
    pub asset_id: String,
    /// Publicly resolvable URL.
    pub url: String,
    /// Store-side resource class (`image`, `video`, `raw`).
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
}

fn default_resource_type() -> String {
    "image".to_string()
}

impl MediaAsset {
    pub fn new(
        asset_id: impl Into<String>,
        url: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            url: url.into(),
            resource_type: resource_type.into(),
        }
    }

    /// A reference is usable only when both halves are present.
    pub fn is_usable(&self) -> bool {
        !self.asset_id.trim().is_empty() && !self.url.trim().is_empty()
    }
}

//! Content-derived resource versions.
//!
//! Every write stamps `meta.version` with a weak ETag computed from the
//! resource content, so two reads of an unchanged resource always report the
//! same version and any attribute change yields a new one.
//!
//! ```rust
//! use scim_provisioning::resource::version::ResourceVersion;
//!
//! let version = ResourceVersion::from_content(br#"{"userName":"alice"}"#);
//! let etag = version.to_string();
//! assert!(etag.starts_with("W/\""));
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque version identifier rendered as a weak ETag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceVersion {
    opaque: String,
}

impl ResourceVersion {
    /// Create a version by hashing raw content.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();
        // first 8 bytes keep the ETag short
        Self {
            opaque: BASE64.encode(&hash[..8]),
        }
    }

    /// Create a version from the JSON form of a serializable resource.
    pub fn from_resource<T: Serialize>(resource: &T) -> Result<Self, serde_json::Error> {
        let content = serde_json::to_vec(resource)?;
        Ok(Self::from_content(&content))
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.opaque)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_content_same_version() {
        let a = ResourceVersion::from_content(b"alice");
        let b = ResourceVersion::from_content(b"alice");
        let c = ResourceVersion::from_content(b"bob");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_resource_tracks_changes() {
        let before = ResourceVersion::from_resource(&json!({"active": true})).unwrap();
        let after = ResourceVersion::from_resource(&json!({"active": false})).unwrap();
        assert_ne!(before, after);
    }
}

//! Meta attribute for provisioned resources.
//!
//! Meta carries the server-owned lifecycle data of a resource: when it was
//! created, when it last changed, where it lives and which version it is at.
//! Callers may send a `meta` object but the provider overwrites every field
//! it owns.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-maintained resource metadata.
///
/// Timestamps are optional because a resource supplied by a caller has not
/// been stamped yet. Every stored resource has both set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Meta {
    /// Create a Meta for a new resource stamped at `now`.
    pub fn for_creation(resource_type: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            created: Some(now),
            last_modified: Some(now),
            location: None,
            version: None,
        }
    }

    /// Get the created timestamp.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Get the last modified timestamp.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Get the location URI.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Get the version identifier.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Build the metadata for a modified resource.
    ///
    /// `created`, `resource_type` and `location` come from the stored
    /// metadata. The new `last_modified` is `now`, pushed forward when
    /// needed so it is strictly later than the stored value.
    pub fn for_modification(stored: &Meta, now: DateTime<Utc>) -> Self {
        Self {
            resource_type: stored.resource_type.clone(),
            created: stored.created,
            last_modified: Some(next_modification_time(stored.last_modified, now)),
            location: stored.location.clone(),
            version: None,
        }
    }

    /// Generate a location URI for the resource.
    pub fn generate_location(base_url: &str, endpoint: &str, resource_id: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            endpoint,
            resource_id
        )
    }
}

/// Pick the modification timestamp that follows `previous`.
///
/// Clock readings can repeat or step backwards; the result is never earlier
/// than one tick after `previous`.
pub fn next_modification_time(
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match previous {
        Some(previous) if now <= previous => previous + TimeDelta::microseconds(1),
        _ => now,
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_default();
        write!(
            f,
            "Meta(resourceType={}, created={}, lastModified={})",
            self.resource_type.as_deref().unwrap_or(""),
            stamp(self.created),
            stamp(self.last_modified)
        )
    }
}

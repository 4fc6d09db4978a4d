//! Resource model for provisioned identities.
//!
//! Users and groups are concrete, strongly typed structs. [`Resource`] is the
//! generic view over both that the provider contract speaks in, and
//! [`ScimResource`] is the trait the per-type provider is generic over.
//!
//! # Key Components
//!
//! * [`User`] / [`Group`] - Concrete resource variants
//! * [`Resource`] - Exactly one variant per stored record
//! * [`Meta`] - Server-maintained lifecycle metadata
//! * [`RequestContext`] - Correlation identifier for a request
//! * [`version`] - Content-derived weak ETags

pub mod context;
pub mod group;
pub mod meta;
pub mod user;
pub mod version;

pub use context::RequestContext;
pub use group::{Group, GroupMember};
pub use meta::Meta;
pub use user::{Email, Name, User};
pub use version::ResourceVersion;

use crate::error::{ScimError, ScimResult};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Core User schema URI.
pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
/// Enterprise User extension schema URI. Users carrying it are still Users.
pub const ENTERPRISE_USER_SCHEMA: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
/// Core Group schema URI.
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// The kinds of resource this crate provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    User,
    Group,
}

impl ResourceType {
    /// Resource type name as used in `meta.resourceType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::User => "User",
            ResourceType::Group => "Group",
        }
    }

    /// Core schema URI for the type.
    pub fn schema_uri(&self) -> &'static str {
        match self {
            ResourceType::User => USER_SCHEMA,
            ResourceType::Group => GROUP_SCHEMA,
        }
    }

    /// Endpoint segment used when building `meta.location`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceType::User => "Users",
            ResourceType::Group => "Groups",
        }
    }

    /// Resolve a schema identifier or resource type name.
    ///
    /// Accepts the core schema URIs, the enterprise user extension URI, and
    /// the bare type names.
    pub fn from_schema_identifier(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.eq_ignore_ascii_case(USER_SCHEMA)
            || identifier.eq_ignore_ascii_case(ENTERPRISE_USER_SCHEMA)
            || identifier.eq_ignore_ascii_case("User")
        {
            Some(ResourceType::User)
        } else if identifier.eq_ignore_ascii_case(GROUP_SCHEMA)
            || identifier.eq_ignore_ascii_case("Group")
        {
            Some(ResourceType::Group)
        } else {
            None
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour shared by every concrete resource type.
///
/// The provider relies on this to assign identifiers, stamp metadata and
/// check the natural key without knowing which variant it handles.
pub trait ScimResource: Clone + Serialize + Send + Sync + 'static {
    /// Which variant this type is.
    const RESOURCE_TYPE: ResourceType;
    /// Attribute name of the natural key, used in error messages.
    const NATURAL_KEY: &'static str;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;

    /// The caller-meaningful uniqueness field, if set.
    fn natural_key(&self) -> Option<&str>;

    fn into_resource(self) -> Resource;
}

/// Generic view over a provisioned resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    User(User),
    Group(Group),
}

impl Resource {
    /// Parse a resource from JSON, choosing the variant from `schemas`.
    pub fn from_json(data: Value) -> ScimResult<Self> {
        let resource_type = data
            .get("schemas")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .find_map(ResourceType::from_schema_identifier)
            .ok_or_else(|| {
                ScimError::UnsupportedResourceType(
                    data.get("schemas")
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "<missing schemas>".to_string()),
                )
            })?;

        Ok(match resource_type {
            ResourceType::User => Resource::User(serde_json::from_value(data)?),
            ResourceType::Group => Resource::Group(serde_json::from_value(data)?),
        })
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> ScimResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::User(_) => ResourceType::User,
            Resource::Group(_) => ResourceType::Group,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::User(user) => user.id(),
            Resource::Group(group) => group.id(),
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Resource::User(user) => user.meta(),
            Resource::Group(group) => group.meta(),
        }
    }

    pub fn natural_key(&self) -> Option<&str> {
        match self {
            Resource::User(user) => user.natural_key(),
            Resource::Group(group) => group.natural_key(),
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Resource::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Resource::Group(group) => Some(group),
            _ => None,
        }
    }
}

//! Static dispatch tables mapping filter attribute paths to typed accessors.
//!
//! Each filterable resource type publishes a fixed table. Lookup is
//! case-sensitive on the documented attribute names; a path missing from the
//! table fails compilation instead of silently matching nothing.

use crate::resource::{Group, User};
use chrono::{DateTime, Utc};

/// How an attribute is read and therefore which comparisons it supports.
pub enum AttributeKind<T> {
    /// String attribute, compared case-insensitively with `eq`
    Text(fn(&T) -> Option<&str>),
    /// Boolean attribute, compared with `eq`
    Boolean(fn(&T) -> bool),
    /// Timestamp attribute, compared with `ge` / `le`
    Timestamp(fn(&T) -> Option<DateTime<Utc>>),
}

impl<T> Clone for AttributeKind<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeKind<T> {}

/// One row of a dispatch table.
pub struct FilterAttribute<T> {
    pub path: &'static str,
    pub kind: AttributeKind<T>,
}

/// Resource types that filters can be compiled against.
pub trait Filterable: Sized + 'static {
    /// The full dispatch table for this type.
    fn filter_attributes() -> &'static [FilterAttribute<Self>];

    /// Resolve an attribute path against the dispatch table.
    fn filter_attribute(path: &str) -> Option<AttributeKind<Self>> {
        Self::filter_attributes()
            .iter()
            .find(|attribute| attribute.path == path)
            .map(|attribute| attribute.kind)
    }
}

fn user_name(user: &User) -> Option<&str> {
    user.user_name.as_deref()
}

fn user_display_name(user: &User) -> Option<&str> {
    user.display_name.as_deref()
}

fn user_external_id(user: &User) -> Option<&str> {
    user.external_id.as_deref()
}

fn user_active(user: &User) -> bool {
    user.active
}

fn user_last_modified(user: &User) -> Option<DateTime<Utc>> {
    user.meta.last_modified
}

const USER_ATTRIBUTES: &[FilterAttribute<User>] = &[
    FilterAttribute {
        path: "userName",
        kind: AttributeKind::Text(user_name),
    },
    FilterAttribute {
        path: "displayName",
        kind: AttributeKind::Text(user_display_name),
    },
    FilterAttribute {
        path: "externalId",
        kind: AttributeKind::Text(user_external_id),
    },
    FilterAttribute {
        path: "active",
        kind: AttributeKind::Boolean(user_active),
    },
    FilterAttribute {
        path: "meta.lastModified",
        kind: AttributeKind::Timestamp(user_last_modified),
    },
];

impl Filterable for User {
    fn filter_attributes() -> &'static [FilterAttribute<Self>] {
        USER_ATTRIBUTES
    }
}

fn group_display_name(group: &Group) -> Option<&str> {
    group.display_name.as_deref()
}

fn group_external_id(group: &Group) -> Option<&str> {
    group.external_id.as_deref()
}

fn group_last_modified(group: &Group) -> Option<DateTime<Utc>> {
    group.meta.last_modified
}

const GROUP_ATTRIBUTES: &[FilterAttribute<Group>] = &[
    FilterAttribute {
        path: "displayName",
        kind: AttributeKind::Text(group_display_name),
    },
    FilterAttribute {
        path: "externalId",
        kind: AttributeKind::Text(group_external_id),
    },
    FilterAttribute {
        path: "meta.lastModified",
        kind: AttributeKind::Timestamp(group_last_modified),
    },
];

impl Filterable for Group {
    fn filter_attributes() -> &'static [FilterAttribute<Self>] {
        GROUP_ATTRIBUTES
    }
}

//! User resource (core User schema).

use super::{Meta, ResourceType, ScimResource, USER_SCHEMA};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// A provisioned user.
///
/// `user_name` is the natural key. It is optional in the type because a
/// request may omit it; the provider rejects such requests on create and
/// replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default = "User::default_schemas")]
    pub schemas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<Email>,
    #[serde(default)]
    pub meta: Meta,
}

/// Components of a user's real name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
}

impl Name {
    pub(crate) fn is_empty(&self) -> bool {
        self.formatted.is_none() && self.family_name.is_none() && self.given_name.is_none()
    }
}

/// An email address entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

impl User {
    fn default_schemas() -> Vec<String> {
        vec![USER_SCHEMA.to_string()]
    }

    /// Create an active user with the given userName.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            schemas: Self::default_schemas(),
            user_name: Some(user_name.into()),
            active: true,
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_email(mut self, value: impl Into<String>, primary: bool) -> Self {
        self.emails.push(Email {
            value: value.into(),
            email_type: Some("work".to_string()),
            primary,
        });
        self
    }

    /// Set the identifier. Only tests and repositories loading stored data
    /// should need this; the provider assigns identifiers itself.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl ScimResource for User {
    const RESOURCE_TYPE: ResourceType = ResourceType::User;
    const NATURAL_KEY: &'static str = "userName";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn natural_key(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    fn into_resource(self) -> Resource {
        Resource::User(self)
    }
}

impl From<User> for Resource {
    fn from(user: User) -> Self {
        Resource::User(user)
    }
}

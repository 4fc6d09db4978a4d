//! Group resource (core Group schema) and its member references.

use super::{GROUP_SCHEMA, Meta, ResourceType, ScimResource};
use crate::error::{ValidationError, ValidationResult};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// A provisioned group.
///
/// `display_name` is the natural key. Member order is preserved exactly as
/// supplied and as modified by PATCH.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default = "Group::default_schemas")]
    pub schemas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub meta: Meta,
}

impl Group {
    fn default_schemas() -> Vec<String> {
        vec![GROUP_SCHEMA.to_string()]
    }

    /// Create an empty group with the given displayName.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            schemas: Self::default_schemas(),
            display_name: Some(display_name.into()),
            ..Default::default()
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_member(mut self, member: GroupMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append members whose `value` is not already present, keeping order.
    pub fn add_members(&mut self, members: impl IntoIterator<Item = GroupMember>) {
        for member in members {
            if !self.members.iter().any(|m| m.value == member.value) {
                self.members.push(member);
            }
        }
    }

    /// Remove the member referencing `value`. Returns whether one was removed.
    pub fn remove_member(&mut self, value: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.value != value);
        self.members.len() != before
    }
}

impl ScimResource for Group {
    const RESOURCE_TYPE: ResourceType = ResourceType::Group;
    const NATURAL_KEY: &'static str = "displayName";

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
        self.display_name.as_deref()
    }

    fn into_resource(self) -> Resource {
        Resource::Group(self)
    }
}

impl From<Group> for Resource {
    fn from(group: Group) -> Self {
        Resource::Group(group)
    }
}

/// A reference from a group to one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Identifier of the member resource
    pub value: String,
    /// Human-readable display name for the member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// The type of member ("User" or "Group")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
}

impl GroupMember {
    /// Creates a new group member with validation.
    pub fn new(
        value: impl Into<String>,
        display: Option<String>,
        member_type: Option<String>,
    ) -> ValidationResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::missing_required("members.value"));
        }

        if let Some(ref mtype) = member_type {
            if mtype != "User" && mtype != "Group" {
                return Err(ValidationError::custom(format!(
                    "Member type must be 'User' or 'Group', got '{}'",
                    mtype
                )));
            }
        }

        Ok(Self {
            value,
            display,
            member_type,
        })
    }

    /// Creates a member referencing a User resource.
    pub fn new_user(value: impl Into<String>, display: Option<String>) -> ValidationResult<Self> {
        Self::new(value, display, Some("User".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_validation() {
        assert!(GroupMember::new_user("user-1", None).is_ok());
        assert!(GroupMember::new("  ", None, None).is_err());
        assert!(GroupMember::new("user-1", None, Some("Device".to_string())).is_err());
    }

    #[test]
    fn test_add_members_skips_duplicates() {
        let mut group = Group::new("Team A");
        let alice = GroupMember::new_user("alice", None).unwrap();
        let bob = GroupMember::new_user("bob", None).unwrap();

        group.add_members(vec![alice.clone(), bob.clone(), alice.clone()]);
        assert_eq!(group.members, vec![alice, bob]);
    }

    #[test]
    fn test_remove_member() {
        let mut group = Group::new("Team A")
            .with_member(GroupMember::new_user("alice", None).unwrap())
            .with_member(GroupMember::new_user("bob", None).unwrap());

        assert!(group.remove_member("alice"));
        assert!(!group.remove_member("alice"));
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].value, "bob");
    }

    #[test]
    fn test_member_serialization() {
        let member = GroupMember::new_user("u1", Some("Alice".to_string())).unwrap();
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["type"], "User");
        assert_eq!(json["display"], "Alice");
    }
}

//! Partial updates of provisioned resources.
//!
//! A [`PatchRequest`] is an ordered list of [`PatchOperation`]s. [`apply`]
//! runs them against a copy of the resource, so a failing operation leaves
//! the caller's value untouched and no partially patched state escapes.
//!
//! Each resource type declares the paths it accepts by implementing
//! [`Patchable`]. Identifiers and metadata are owned by the provider and are
//! never reachable through a patch path.
//!
//! ```rust
//! use scim_provisioning::patch::{PatchOperation, PatchRequest, apply};
//! use scim_provisioning::resource::User;
//! use serde_json::json;
//!
//! let user = User::new("alice");
//! let request = PatchRequest::new(vec![
//!     PatchOperation::replace("active", json!(false)),
//!     PatchOperation::add("displayName", json!("Alice Smith")),
//! ]);
//!
//! let patched = apply(&user, &request).unwrap();
//! assert!(!patched.active);
//! assert_eq!(patched.display_name.as_deref(), Some("Alice Smith"));
//! assert!(user.active);
//! ```

mod group;
mod user;

use crate::error::{ScimError, ScimResult, ValidationError};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Schema URI identifying a PATCH message body.
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Kind of modification a patch operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl FromStr for PatchOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(PatchOp::Add),
            "replace" => Ok(PatchOp::Replace),
            "remove" => Ok(PatchOp::Remove),
            other => Err(format!("unknown patch operation '{}'", other)),
        }
    }
}

impl TryFrom<String> for PatchOp {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
        })
    }
}

/// One step of a patch request.
///
/// A missing `path` deserializes as empty and is rejected when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// Whether a non-null value accompanies the operation.
    pub(crate) fn carries_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_null())
    }

    /// The value of an add or replace, which must be present.
    pub(crate) fn required_value(&self) -> ScimResult<&Value> {
        self.value.as_ref().filter(|v| !v.is_null()).ok_or_else(|| {
            ValidationError::invalid_patch_value(
                &self.path,
                format!("'{}' operation requires a value", self.op),
            )
            .into()
        })
    }

    /// New string for the path: `None` when removing.
    pub(crate) fn string_value(&self) -> ScimResult<Option<String>> {
        if self.op == PatchOp::Remove {
            return Ok(None);
        }
        match self.required_value()? {
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(self.type_error("a string", other)),
        }
    }

    /// New boolean for the path: `None` when removing.
    ///
    /// Accepts JSON booleans and their string forms, in any case.
    pub(crate) fn bool_value(&self) -> ScimResult<Option<bool>> {
        if self.op == PatchOp::Remove {
            return Ok(None);
        }
        match self.required_value()? {
            Value::Bool(b) => Ok(Some(*b)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Some(true)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Some(false)),
            other => Err(self.type_error("a boolean", other)),
        }
    }

    /// Deserialize the value as a list of `E`, accepting a single object too.
    pub(crate) fn list_value<E>(&self) -> ScimResult<Vec<E>>
    where
        E: for<'de> Deserialize<'de>,
    {
        let value = self.required_value()?;
        let items = match value {
            Value::Array(items) => items.clone(),
            Value::Object(_) => vec![value.clone()],
            other => return Err(self.type_error("an object or array", other)),
        };
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| {
                    ScimError::from(ValidationError::invalid_patch_value(
                        &self.path,
                        e.to_string(),
                    ))
                })
            })
            .collect()
    }

    pub(crate) fn type_error(&self, expected: &str, actual: &Value) -> ScimError {
        ValidationError::invalid_patch_value(
            &self.path,
            format!("expected {}, found {}", expected, actual),
        )
        .into()
    }

    pub(crate) fn unsupported_path(&self) -> ScimError {
        ScimError::unsupported_patch_path(&self.path)
    }
}

/// An ordered list of patch operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    #[serde(default = "PatchRequest::default_schemas")]
    pub schemas: Vec<String>,
    #[serde(rename = "Operations", alias = "operations")]
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    fn default_schemas() -> Vec<String> {
        vec![PATCH_OP_SCHEMA.to_string()]
    }

    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self {
            schemas: Self::default_schemas(),
            operations,
        }
    }
}

/// A patch body as received, recognised or not.
///
/// Only PATCH messages carrying [`PATCH_OP_SCHEMA`] are applied; anything
/// else is kept so the provider can report what it was handed.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchPayload {
    Operations(PatchRequest),
    Unrecognized(String),
}

impl PatchPayload {
    /// Classify a JSON body by its `schemas` attribute.
    ///
    /// A body declaring the PatchOp schema must also be well formed;
    /// otherwise the JSON error is returned.
    pub fn from_json(body: Value) -> ScimResult<Self> {
        let recognised = body
            .get("schemas")
            .and_then(Value::as_array)
            .is_some_and(|schemas| {
                schemas
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| s.eq_ignore_ascii_case(PATCH_OP_SCHEMA))
            });

        if recognised {
            Ok(PatchPayload::Operations(serde_json::from_value(body)?))
        } else {
            let description = body
                .get("schemas")
                .map(Value::to_string)
                .unwrap_or_else(|| "<missing schemas>".to_string());
            Ok(PatchPayload::Unrecognized(description))
        }
    }
}

impl From<PatchRequest> for PatchPayload {
    fn from(request: PatchRequest) -> Self {
        PatchPayload::Operations(request)
    }
}

/// Resource types that accept patch operations.
pub trait Patchable {
    /// Apply one operation in place.
    ///
    /// Implementations may leave `self` partially modified on error;
    /// [`apply`] only ever hands them a scratch copy.
    fn apply_operation(&mut self, operation: &PatchOperation) -> ScimResult<()>;
}

/// Apply every operation of `request`, in order, to a copy of `resource`.
pub fn apply<T: Patchable + Clone>(resource: &T, request: &PatchRequest) -> ScimResult<T> {
    let mut patched = resource.clone();
    for operation in &request.operations {
        trace!("Applying patch operation {} '{}'", operation.op, operation.path);
        patched.apply_operation(operation)?;
    }
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_op_is_case_insensitive() {
        let op: PatchOperation =
            serde_json::from_value(json!({"op": "Replace", "path": "active", "value": false}))
                .unwrap();
        assert_eq!(op.op, PatchOp::Replace);
        assert!(serde_json::from_value::<PatchOperation>(json!({"op": "move", "path": "x"})).is_err());
        assert_eq!(serde_json::to_value(PatchOp::Remove).unwrap(), json!("remove"));
    }

    #[test]
    fn test_missing_path_defaults_to_empty() {
        let op: PatchOperation =
            serde_json::from_value(json!({"op": "add", "value": {"active": true}})).unwrap();
        assert_eq!(op.path, "");
    }

    #[test]
    fn test_payload_recognition() {
        let payload = PatchPayload::from_json(json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": [{"op": "remove", "path": "title"}]
        }))
        .unwrap();
        match payload {
            PatchPayload::Operations(request) => assert_eq!(request.operations.len(), 1),
            other => panic!("expected operations, got {:?}", other),
        }

        let payload = PatchPayload::from_json(json!({
            "schemas": ["urn:example:CustomPatch"],
            "changes": []
        }))
        .unwrap();
        assert!(matches!(payload, PatchPayload::Unrecognized(s) if s.contains("CustomPatch")));
    }

    #[test]
    fn test_malformed_patch_message_is_json_error() {
        let result = PatchPayload::from_json(json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": "not a list"
        }));
        assert!(matches!(result, Err(ScimError::Json(_))));
    }

    #[test]
    fn test_value_helpers() {
        assert_eq!(
            PatchOperation::replace("active", json!("False")).bool_value().unwrap(),
            Some(false)
        );
        assert_eq!(PatchOperation::remove("active").bool_value().unwrap(), None);
        assert!(PatchOperation::replace("active", json!(1)).bool_value().is_err());

        let missing = PatchOperation {
            op: PatchOp::Add,
            path: "title".to_string(),
            value: None,
        };
        assert!(matches!(
            missing.string_value(),
            Err(ScimError::Validation(ValidationError::InvalidPatchValue { .. }))
        ));
    }
}

//! Request shapes of the provider contract.

use crate::error::{ScimError, ScimResult, ValidationError, ValidationResult};
use crate::patch::{PatchPayload, PatchRequest};
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Addresses one stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    /// Schema URI or type name the identifier belongs to
    pub schema_identifier: String,
    /// Server-assigned resource id
    pub identifier: String,
}

impl ResourceIdentifier {
    pub fn new(schema_identifier: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            schema_identifier: schema_identifier.into(),
            identifier: identifier.into(),
        }
    }

    /// Identifier of a resource of a known type.
    pub fn of(resource_type: ResourceType, identifier: impl Into<String>) -> Self {
        Self::new(resource_type.schema_uri(), identifier)
    }

    /// The id, rejected when blank.
    pub fn require_id(&self) -> ValidationResult<&str> {
        let id = self.identifier.trim();
        if id.is_empty() {
            return Err(ValidationError::MissingId);
        }
        Ok(id)
    }
}

/// Parameters of a retrieve request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalParameters {
    pub resource_identifier: ResourceIdentifier,
}

impl RetrievalParameters {
    pub fn new(resource_identifier: ResourceIdentifier) -> Self {
        Self {
            resource_identifier,
        }
    }
}

impl From<ResourceIdentifier> for RetrievalParameters {
    fn from(resource_identifier: ResourceIdentifier) -> Self {
        Self::new(resource_identifier)
    }
}

/// A patch request addressed to one resource.
///
/// Both halves are optional so that an incomplete request can be reported
/// precisely instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    pub resource_identifier: Option<ResourceIdentifier>,
    pub payload: Option<PatchPayload>,
}

impl Patch {
    pub fn new(resource_identifier: ResourceIdentifier, request: PatchRequest) -> Self {
        Self {
            resource_identifier: Some(resource_identifier),
            payload: Some(PatchPayload::Operations(request)),
        }
    }

    /// Build a patch from a raw JSON body.
    pub fn from_json(resource_identifier: ResourceIdentifier, body: Value) -> ScimResult<Self> {
        Ok(Self {
            resource_identifier: Some(resource_identifier),
            payload: Some(PatchPayload::from_json(body)?),
        })
    }

    /// The addressed resource, which must name a non-blank id.
    pub fn target(&self) -> ValidationResult<&ResourceIdentifier> {
        let target = self
            .resource_identifier
            .as_ref()
            .ok_or(ValidationError::MissingPatchTarget)?;
        target.require_id()?;
        Ok(target)
    }

    /// The operations to apply, if the payload was recognised.
    pub fn operations(&self) -> ScimResult<&PatchRequest> {
        match &self.payload {
            None => Err(ValidationError::MissingPatchPayload.into()),
            Some(PatchPayload::Operations(request)) => Ok(request),
            Some(PatchPayload::Unrecognized(payload)) => Err(ScimError::UnsupportedPatchPayload {
                payload: payload.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{PATCH_OP_SCHEMA, PatchOperation};
    use serde_json::json;

    #[test]
    fn test_patch_target_validation() {
        assert_eq!(
            Patch::default().target(),
            Err(ValidationError::MissingPatchTarget)
        );

        let blank = Patch {
            resource_identifier: Some(ResourceIdentifier::of(ResourceType::User, " ")),
            payload: None,
        };
        assert_eq!(blank.target(), Err(ValidationError::MissingId));
    }

    #[test]
    fn test_patch_operations() {
        let identifier = ResourceIdentifier::of(ResourceType::Group, "g1");
        let missing = Patch {
            resource_identifier: Some(identifier.clone()),
            payload: None,
        };
        assert!(matches!(
            missing.operations(),
            Err(ScimError::Validation(ValidationError::MissingPatchPayload))
        ));

        let foreign = Patch::from_json(identifier.clone(), json!({"schemas": ["urn:x"]})).unwrap();
        assert!(matches!(
            foreign.operations(),
            Err(ScimError::UnsupportedPatchPayload { .. })
        ));

        let patch = Patch::from_json(
            identifier,
            json!({
                "schemas": [PATCH_OP_SCHEMA],
                "Operations": [{"op": "remove", "path": "members"}]
            }),
        )
        .unwrap();
        assert_eq!(
            patch.operations().unwrap().operations,
            vec![PatchOperation::remove("members")]
        );
    }
}

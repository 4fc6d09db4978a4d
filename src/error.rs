//! Error types for SCIM provisioning operations.
//!
//! Every failure the core can report is a variant of [`ScimError`]. Request
//! shape problems are grouped under [`ValidationError`] so a transport layer
//! can map the whole family to a single "bad request" outcome.

/// Main error type for provisioning operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Malformed or missing request data
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Natural key collision on create
    #[error("Conflict: {resource_type} with {attribute} '{value}' already exists")]
    Conflict {
        resource_type: String,
        attribute: String,
        value: String,
    },

    /// No resource stored under the requested identifier
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// Filter term is structurally invalid (blank path or value, unparsable comparison value)
    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    /// Filter references an attribute the engine does not implement
    #[error("Filter attribute path '{path}' is not supported")]
    UnsupportedFilterAttribute { path: String },

    /// Filter uses an operator the attribute does not support
    #[error("Filter operator '{operator}' is not supported for attribute '{path}'")]
    UnsupportedFilterOperator { operator: String, path: String },

    /// Patch operation targets an unknown path
    #[error("Patch path '{path}' is not supported")]
    UnsupportedPatchPath { path: String },

    /// Patch request body is not a recognised PATCH message
    #[error("Patch payload '{payload}' is not supported")]
    UnsupportedPatchPayload { payload: String },

    /// Schema identifier or resource type routes to no provider
    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// Failure surfaced by the repository port
    #[error("Persistence error during {operation}: {source}")]
    Persistence {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Repository call exceeded the configured deadline
    #[error("Repository operation '{operation}' timed out")]
    Timeout { operation: String },

    /// Provider configuration is unusable
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request validation failures.
///
/// These all describe a request the caller must fix before retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Client provided id in creation
    #[error("Client cannot provide 'id' during resource creation")]
    ClientProvidedId,

    /// Missing id attribute
    #[error("Missing required 'id' attribute")]
    MissingId,

    /// Required attribute is missing or blank
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Query without a schema identifier
    #[error("Query parameters must name a schema identifier")]
    MissingSchemaIdentifier,

    /// Request without a correlation identifier
    #[error("Request must carry a correlation identifier")]
    MissingCorrelationIdentifier,

    /// Patch request without a target resource
    #[error("Patch request must identify the target resource")]
    MissingPatchTarget,

    /// Patch request without an operations payload
    #[error("Patch request must carry a payload")]
    MissingPatchPayload,

    /// Patch value absent or of the wrong type for its path
    #[error("Patch value for '{path}' is invalid: {details}")]
    InvalidPatchValue { path: String, details: String },

    /// Resource schema does not match the provider handling it
    #[error("Resource of type '{actual}' cannot be handled as '{expected}'")]
    ResourceTypeMismatch { expected: String, actual: String },

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

impl ScimError {
    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a natural key conflict error
    pub fn conflict(
        resource_type: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
        }
    }

    /// Create an unsupported filter attribute error
    pub fn unsupported_filter_attribute(path: impl Into<String>) -> Self {
        Self::UnsupportedFilterAttribute { path: path.into() }
    }

    /// Create an unsupported filter operator error
    pub fn unsupported_filter_operator(operator: impl ToString, path: impl Into<String>) -> Self {
        Self::UnsupportedFilterOperator {
            operator: operator.to_string(),
            path: path.into(),
        }
    }

    /// Create an unsupported patch path error
    pub fn unsupported_patch_path(path: impl Into<String>) -> Self {
        Self::UnsupportedPatchPath { path: path.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a repository error with the operation it interrupted
    pub fn persistence<E>(operation: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            operation: operation.into(),
            source: Box::new(error),
        }
    }

    /// Whether this error describes a request the caller must correct.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Persistence { .. } | Self::Timeout { .. } | Self::Configuration { .. }
        )
    }
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid patch value error
    pub fn invalid_patch_value(path: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidPatchValue {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type ValidationResult<T> = Result<T, ValidationError>;

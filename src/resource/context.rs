//! Request context for provisioning operations.

use crate::error::{ValidationError, ValidationResult};
use uuid::Uuid;

/// Request context for provisioning operations.
///
/// Carries the correlation identifier a transport layer assigns to each
/// request so log lines from every layer can be tied together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Unique identifier for this request
    pub request_id: String,
}

impl RequestContext {
    /// Create a new request context with a specific request ID.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Create a new request context with a generated request ID.
    pub fn with_generated_id() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Reject contexts whose correlation identifier is blank.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.request_id.trim().is_empty() {
            return Err(ValidationError::MissingCorrelationIdentifier);
        }
        Ok(())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestContext::with_generated_id();
        let b = RequestContext::with_generated_id();
        assert_ne!(a.request_id, b.request_id);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_blank_request_id_rejected() {
        assert_eq!(
            RequestContext::new("  ").validate(),
            Err(ValidationError::MissingCorrelationIdentifier)
        );
    }
}

//! SCIM 2.0 provisioning core for Rust.
//!
//! Sits between a transport layer and a persistence backend and owns the
//! request-processing logic of an identity provisioning service: matching
//! filter expressions against stored resources, applying PATCH operations,
//! and enforcing identifier, uniqueness and metadata rules around create,
//! replace, update and delete.
//!
//! # Core Components
//!
//! - [`ScimProvider`] - Routes generic [`Resource`] requests to per-type providers
//! - [`ResourceProvider`] - Create/retrieve/replace/update/delete/query for one type
//! - [`Repository`] - Async persistence port, with [`InMemoryRepository`] as reference
//! - [`filter`] - Filter model, parser and predicate compiler
//! - [`patch`] - PATCH engine
//! - [`query`] - Query executor
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scim_provisioning::{InMemoryRepository, QueryParameters, RequestContext, ScimProvider};
//! use scim_provisioning::resource::{Group, USER_SCHEMA, User};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ScimProvider::new(
//!     InMemoryRepository::<User>::new(),
//!     InMemoryRepository::<Group>::new(),
//! );
//! let context = RequestContext::with_generated_id();
//!
//! provider.create(User::new("bjensen").into(), &context).await?;
//!
//! let query = QueryParameters::from_filter_str(USER_SCHEMA, r#"userName eq "BJensen""#)?;
//! let found = provider.query(&query, &context).await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod patch;
pub mod provider;
pub mod query;
pub mod repository;
pub mod resource;

// Re-export commonly used types for convenience
pub use error::{ScimError, ScimResult, ValidationError};
pub use filter::{ComparisonOperator, Conjunction, FilterTerm, parse_filter};
pub use patch::{PatchOp, PatchOperation, PatchPayload, PatchRequest};
pub use provider::{
    Patch, ProviderConfig, ResourceIdentifier, ResourceProvider, RetrievalParameters,
    ScimProvider, ScimProviderBuilder,
};
pub use query::{PaginationParameters, QueryParameters};
pub use repository::{InMemoryRepository, Repository, RepositoryFailure};
pub use resource::{RequestContext, Resource, ResourceType};

//! Persistence port for provisioned resources.
//!
//! The provider never talks to a database directly. It drives a
//! [`Repository`] per resource type, one that knows how to persist whole
//! resources and nothing about SCIM semantics beyond the natural key used by
//! [`Repository::check_exists`].
//!
//! # Design
//!
//! - **Whole-resource writes**: `create` and `update_by_id` store the
//!   resource exactly as handed over; the provider has already stamped ids
//!   and metadata.
//! - **Listing for queries**: filtering happens above the port, so a backend
//!   only has to return every stored resource in a stable order.
//! - **Classified failures**: backends report errors through
//!   [`RepositoryFailure`] so the provider can tell a uniqueness violation or
//!   a vanished record apart from an infrastructure fault.
//! - **Async first**: every operation returns a `Send` future.

pub mod in_memory;

pub use in_memory::{InMemoryRepository, RepositoryError};

use std::future::Future;

/// Classification of repository errors the provider reacts to.
///
/// Anything not classified is reported to callers as a persistence failure.
pub trait RepositoryFailure: std::error::Error + Send + Sync + 'static {
    /// The write was refused because the natural key or id is taken.
    fn is_uniqueness_violation(&self) -> bool {
        false
    }

    /// The record addressed by id does not exist.
    fn is_not_found(&self) -> bool {
        false
    }
}

/// Persistence operations for resources of type `T`.
///
/// Implementations must be safe to call concurrently from any number of
/// tasks.
pub trait Repository<T>: Send + Sync {
    /// The error type returned by repository operations.
    type Error: RepositoryFailure;

    /// Persist a new resource. Its id is already assigned.
    fn create(&self, resource: T) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Fetch a resource by id; `None` when nothing is stored under it.
    fn get_by_id(&self, id: &str) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send;

    /// Every stored resource, in a stable order.
    fn list_all(&self) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send;

    /// Whether a stored resource has the given id or natural key.
    fn check_exists(
        &self,
        id: Option<&str>,
        natural_key: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Overwrite the resource stored under `id`.
    fn update_by_id(
        &self,
        id: &str,
        resource: T,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Remove the resource stored under `id`. Removing nothing is not an error.
    fn delete_by_id(&self, id: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

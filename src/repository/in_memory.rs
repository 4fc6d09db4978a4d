//! In-memory repository implementation.
//!
//! Thread-safe, insertion ordered, and intended for tests, demos and
//! embedding where persistence across restarts is not required.
//!
//! Unlike a plain map, the repository enforces natural-key uniqueness itself
//! while holding its write lock, so two concurrent creates with the same
//! natural key cannot both succeed even though the provider's own existence
//! check runs before the write.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_provisioning::repository::{InMemoryRepository, Repository};
//! use scim_provisioning::resource::User;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryRepository::<User>::new();
//!
//! repository.create(User::new("john.doe").with_id("u1")).await?;
//! assert!(repository.check_exists(None, "John.Doe").await?);
//!
//! let stored = repository.get_by_id("u1").await?;
//! assert_eq!(stored.and_then(|u| u.user_name), Some("john.doe".to_string()));
//!
//! repository.delete_by_id("u1").await?;
//! assert!(repository.list_all().await?.is_empty());
//! # Ok(())
//! # }
//! ```

use super::{Repository, RepositoryFailure};
use crate::resource::ScimResource;
use log::{debug, trace};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Errors reported by [`InMemoryRepository`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Another stored resource already uses the natural key
    #[error("{resource_type} with natural key '{natural_key}' already exists")]
    DuplicateNaturalKey {
        resource_type: String,
        natural_key: String,
    },

    /// Another stored resource already uses the id
    #[error("{resource_type} with id '{id}' already exists")]
    DuplicateId { resource_type: String, id: String },

    /// No resource stored under the id
    #[error("{resource_type} with id '{id}' not found")]
    NotFound { resource_type: String, id: String },

    /// The resource cannot be stored as given
    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },
}

impl RepositoryFailure for RepositoryError {
    fn is_uniqueness_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::DuplicateNaturalKey { .. } | RepositoryError::DuplicateId { .. }
        )
    }

    fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Thread-safe in-memory repository for one resource type.
///
/// Cloning is cheap and every clone shares the same records.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    records: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: ScimResource> InMemoryRepository<T> {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored resources.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the repository holds no resources.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    fn natural_key_taken(records: &[T], natural_key: &str, except_id: Option<&str>) -> bool {
        let wanted = natural_key.to_lowercase();
        records.iter().any(|record| {
            except_id.is_none_or(|except| record.id() != Some(except))
                && record
                    .natural_key()
                    .is_some_and(|key| key.to_lowercase() == wanted)
        })
    }

    fn duplicate_natural_key(natural_key: &str) -> RepositoryError {
        RepositoryError::DuplicateNaturalKey {
            resource_type: T::RESOURCE_TYPE.to_string(),
            natural_key: natural_key.to_string(),
        }
    }
}

impl<T: ScimResource> Repository<T> for InMemoryRepository<T> {
    type Error = RepositoryError;

    async fn create(&self, resource: T) -> Result<(), Self::Error> {
        let id = resource
            .id()
            .ok_or_else(|| RepositoryError::InvalidResource {
                message: format!("{} must have an id before it is stored", T::RESOURCE_TYPE),
            })?
            .to_string();

        let mut records = self.records.write().await;

        if records.iter().any(|record| record.id() == Some(id.as_str())) {
            return Err(RepositoryError::DuplicateId {
                resource_type: T::RESOURCE_TYPE.to_string(),
                id,
            });
        }
        if let Some(natural_key) = resource.natural_key() {
            if Self::natural_key_taken(&records, natural_key, None) {
                return Err(Self::duplicate_natural_key(natural_key));
            }
        }

        debug!("Storing {} '{}'", T::RESOURCE_TYPE, id);
        records.push(resource);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>, Self::Error> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id() == Some(id)).cloned())
    }

    async fn list_all(&self) -> Result<Vec<T>, Self::Error> {
        let records = self.records.read().await;
        trace!("Listing {} stored {}(s)", records.len(), T::RESOURCE_TYPE);
        Ok(records.clone())
    }

    async fn check_exists(&self, id: Option<&str>, natural_key: &str) -> Result<bool, Self::Error> {
        let records = self.records.read().await;
        let id_taken = id.is_some_and(|id| records.iter().any(|record| record.id() == Some(id)));
        Ok(id_taken || Self::natural_key_taken(&records, natural_key, None))
    }

    async fn update_by_id(&self, id: &str, resource: T) -> Result<(), Self::Error> {
        let mut records = self.records.write().await;

        if let Some(natural_key) = resource.natural_key() {
            if Self::natural_key_taken(&records, natural_key, Some(id)) {
                return Err(Self::duplicate_natural_key(natural_key));
            }
        }

        let slot = records
            .iter_mut()
            .find(|record| record.id() == Some(id))
            .ok_or_else(|| RepositoryError::NotFound {
                resource_type: T::RESOURCE_TYPE.to_string(),
                id: id.to_string(),
            })?;

        debug!("Updating {} '{}'", T::RESOURCE_TYPE, id);
        *slot = resource;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), Self::Error> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id() != Some(id));
        debug!(
            "Deleted {} '{}' (existed: {})",
            T::RESOURCE_TYPE,
            id,
            records.len() != before
        );
        Ok(())
    }
}

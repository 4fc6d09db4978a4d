//! Per-type orchestration of the provisioning operations.

use super::config::ProviderConfig;
use super::request::{Patch, ResourceIdentifier, RetrievalParameters};
use crate::error::{ScimError, ScimResult, ValidationError};
use crate::filter::Filterable;
use crate::patch::{Patchable, apply};
use crate::query::{QueryParameters, execute};
use crate::repository::{Repository, RepositoryFailure};
use crate::resource::{Meta, RequestContext, ResourceType, ResourceVersion, ScimResource};
use chrono::Utc;
use log::{debug, info, trace, warn};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// What a repository call was about, for error classification.
#[derive(Default)]
struct Subject<'a> {
    id: Option<&'a str>,
    natural_key: Option<&'a str>,
}

/// Provider for one resource type over a [`Repository`].
///
/// Owns every server-side invariant: identifiers are assigned here,
/// `meta` is stamped here, and natural keys are checked here before the
/// repository sees a new resource. Holds no state besides the repository
/// and configuration, so any number of operations may run concurrently.
pub struct ResourceProvider<T, R> {
    repository: R,
    config: Arc<ProviderConfig>,
    _resource: PhantomData<fn() -> T>,
}

impl<T, R: Clone> Clone for ResourceProvider<T, R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            config: Arc::clone(&self.config),
            _resource: PhantomData,
        }
    }
}

impl<T, R> std::fmt::Debug for ResourceProvider<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T, R> ResourceProvider<T, R>
where
    T: ScimResource + Filterable + Patchable,
    R: Repository<T>,
{
    /// Create a provider with the default configuration.
    pub fn new(repository: R) -> Self {
        Self::with_shared_config(repository, Arc::new(ProviderConfig::default()))
    }

    /// Create a provider after validating `config`.
    pub fn with_config(repository: R, config: ProviderConfig) -> ScimResult<Self> {
        config.validate()?;
        Ok(Self::with_shared_config(repository, Arc::new(config)))
    }

    pub(crate) fn with_shared_config(repository: R, config: Arc<ProviderConfig>) -> Self {
        Self {
            repository,
            config,
            _resource: PhantomData,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Store a new resource.
    ///
    /// The caller must not supply an id and must supply the natural key.
    /// Returns the resource as stored, with its id and metadata.
    pub async fn create(&self, mut resource: T, context: &RequestContext) -> ScimResult<T> {
        info!(
            "Creating {} resource (request: '{}')",
            T::RESOURCE_TYPE,
            context.request_id
        );
        trace!(
            "Create data: {}",
            serde_json::to_string(&resource).unwrap_or_else(|_| "invalid json".to_string())
        );

        if resource.id().is_some() {
            warn!(
                "Rejecting {} create with client-provided id (request: '{}')",
                T::RESOURCE_TYPE,
                context.request_id
            );
            return Err(ValidationError::ClientProvidedId.into());
        }
        let natural_key = Self::require_natural_key(&resource)?.to_string();

        let exists = self
            .call(
                "check_exists",
                Subject::default(),
                self.repository.check_exists(None, &natural_key),
            )
            .await?;
        if exists {
            warn!(
                "{} with {} '{}' already exists (request: '{}')",
                T::RESOURCE_TYPE,
                T::NATURAL_KEY,
                natural_key,
                context.request_id
            );
            return Err(Self::conflict(&natural_key));
        }

        let id = Uuid::new_v4().to_string();
        resource.set_id(id.clone());
        *resource.meta_mut() = Meta::for_creation(T::RESOURCE_TYPE.as_str(), Utc::now());
        self.finish_meta(&mut resource, &id)?;

        let subject = Subject {
            id: Some(&id),
            natural_key: Some(&natural_key),
        };
        self.call("create", subject, self.repository.create(resource.clone()))
            .await?;

        debug!(
            "Created {} '{}' (request: '{}')",
            T::RESOURCE_TYPE,
            id,
            context.request_id
        );
        Ok(resource)
    }

    /// Fetch one resource by id.
    pub async fn retrieve(
        &self,
        parameters: &RetrievalParameters,
        context: &RequestContext,
    ) -> ScimResult<T> {
        context.validate()?;
        let id = self.resolve_identifier(&parameters.resource_identifier)?;

        debug!(
            "Getting {} resource with ID '{}' (request: '{}')",
            T::RESOURCE_TYPE,
            id,
            context.request_id
        );

        self.load(id).await
    }

    /// Overwrite a stored resource with the caller's version.
    ///
    /// `created` is kept from the stored resource and `last_modified` moves
    /// strictly forward. Returns the resource as stored.
    pub async fn replace(&self, mut resource: T, context: &RequestContext) -> ScimResult<T> {
        let id = resource
            .id()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingId)?
            .to_string();

        info!(
            "Replacing {} resource with ID '{}' (request: '{}')",
            T::RESOURCE_TYPE,
            id,
            context.request_id
        );
        trace!(
            "Replace data: {}",
            serde_json::to_string(&resource).unwrap_or_else(|_| "invalid json".to_string())
        );

        let natural_key = Self::require_natural_key(&resource)?.to_string();
        let existing = self.load(&id).await?;

        resource.set_id(id.clone());
        *resource.meta_mut() = Meta::for_modification(existing.meta(), Utc::now());
        self.finish_meta(&mut resource, &id)?;

        let subject = Subject {
            id: Some(&id),
            natural_key: Some(&natural_key),
        };
        self.call(
            "update_by_id",
            subject,
            self.repository.update_by_id(&id, resource.clone()),
        )
        .await?;

        Ok(resource)
    }

    /// Apply a patch to a stored resource.
    ///
    /// Nothing is written unless every operation succeeds. Returns the
    /// resource as stored.
    pub async fn update(&self, patch: &Patch, context: &RequestContext) -> ScimResult<T> {
        let id = self.resolve_identifier(patch.target()?)?;
        let request = patch.operations()?;

        info!(
            "Patching {} resource with ID '{}' ({} operation(s), request: '{}')",
            T::RESOURCE_TYPE,
            id,
            request.operations.len(),
            context.request_id
        );

        let existing = self.load(id).await?;
        let mut patched = apply(&existing, request)?;
        Self::require_natural_key(&patched)?;

        *patched.meta_mut() = Meta::for_modification(existing.meta(), Utc::now());
        self.finish_meta(&mut patched, id)?;

        let subject = Subject {
            id: Some(id),
            natural_key: patched.natural_key(),
        };
        self.call(
            "update_by_id",
            subject,
            self.repository.update_by_id(id, patched.clone()),
        )
        .await?;

        Ok(patched)
    }

    /// Remove a resource. Removing an id that is not stored succeeds.
    pub async fn delete(
        &self,
        identifier: &ResourceIdentifier,
        context: &RequestContext,
    ) -> ScimResult<()> {
        let id = self.resolve_identifier(identifier)?;

        info!(
            "Deleting {} resource with ID '{}' (request: '{}')",
            T::RESOURCE_TYPE,
            id,
            context.request_id
        );

        let subject = Subject {
            id: Some(id),
            natural_key: None,
        };
        self.call("delete_by_id", subject, self.repository.delete_by_id(id))
            .await
    }

    /// Return the stored resources matching the query, in repository order.
    pub async fn query(
        &self,
        parameters: &QueryParameters,
        context: &RequestContext,
    ) -> ScimResult<Vec<T>> {
        context.validate()?;
        parameters.validate()?;
        self.check_schema(&parameters.schema_identifier)?;

        info!(
            "Querying {} resources with {} filter alternative(s) (request: '{}')",
            T::RESOURCE_TYPE,
            parameters.alternate_filters.len(),
            context.request_id
        );

        let all = self
            .call("list_all", Subject::default(), self.repository.list_all())
            .await?;
        execute(all, parameters)
    }

    async fn load(&self, id: &str) -> ScimResult<T> {
        let subject = Subject {
            id: Some(id),
            natural_key: None,
        };
        self.call("get_by_id", subject, self.repository.get_by_id(id))
            .await?
            .ok_or_else(|| {
                debug!("{} '{}' not found", T::RESOURCE_TYPE, id);
                ScimError::resource_not_found(T::RESOURCE_TYPE.as_str(), id)
            })
    }

    /// Run a repository call under the configured deadline and classify
    /// its failure.
    async fn call<V, E>(
        &self,
        operation: &'static str,
        subject: Subject<'_>,
        future: impl Future<Output = Result<V, E>>,
    ) -> ScimResult<V>
    where
        E: RepositoryFailure,
    {
        let outcome = match self.config.repository_timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| {
                warn!(
                    "Repository operation '{}' on {} exceeded {:?}",
                    operation,
                    T::RESOURCE_TYPE,
                    limit
                );
                ScimError::Timeout {
                    operation: operation.to_string(),
                }
            })?,
            None => future.await,
        };

        outcome.map_err(|error| match subject {
            Subject {
                natural_key: Some(natural_key),
                ..
            } if error.is_uniqueness_violation() => Self::conflict(natural_key),
            Subject { id: Some(id), .. } if error.is_not_found() => {
                ScimError::resource_not_found(T::RESOURCE_TYPE.as_str(), id)
            }
            _ => {
                warn!(
                    "Repository operation '{}' on {} failed: {}",
                    operation,
                    T::RESOURCE_TYPE,
                    error
                );
                ScimError::persistence(operation, error)
            }
        })
    }

    /// Set location and version once everything else is final.
    fn finish_meta(&self, resource: &mut T, id: &str) -> ScimResult<()> {
        let meta = resource.meta_mut();
        meta.location = Some(
            self.config
                .resource_location(T::RESOURCE_TYPE.endpoint(), id),
        );
        meta.version = None;

        let version = ResourceVersion::from_resource(&*resource)?;
        resource.meta_mut().version = Some(version.to_string());
        Ok(())
    }

    fn resolve_identifier<'a>(&self, identifier: &'a ResourceIdentifier) -> ScimResult<&'a str> {
        self.check_schema(&identifier.schema_identifier)?;
        Ok(identifier.require_id()?)
    }

    /// Reject schema identifiers that name the other resource type.
    fn check_schema(&self, schema_identifier: &str) -> ScimResult<()> {
        match ResourceType::from_schema_identifier(schema_identifier) {
            Some(resource_type) if resource_type != T::RESOURCE_TYPE => {
                Err(ValidationError::ResourceTypeMismatch {
                    expected: T::RESOURCE_TYPE.to_string(),
                    actual: resource_type.to_string(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn require_natural_key(resource: &T) -> ScimResult<&str> {
        resource
            .natural_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ValidationError::missing_required(T::NATURAL_KEY).into())
    }

    fn conflict(natural_key: &str) -> ScimError {
        ScimError::conflict(T::RESOURCE_TYPE.as_str(), T::NATURAL_KEY, natural_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Conjunction, FilterTerm};
    use crate::patch::{PatchOperation, PatchRequest};
    use crate::repository::{InMemoryRepository, RepositoryError};
    use crate::resource::{Group, User};
    use serde_json::json;
    use std::time::Duration;

    fn user_provider() -> ResourceProvider<User, InMemoryRepository<User>> {
        ResourceProvider::new(InMemoryRepository::new())
    }

    fn ctx() -> RequestContext {
        RequestContext::new("test-request")
    }

    fn user_id(id: &str) -> ResourceIdentifier {
        ResourceIdentifier::of(ResourceType::User, id)
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_meta() {
        let provider = user_provider();
        let created = provider.create(User::new("alice"), &ctx()).await.unwrap();

        let id = created.id.clone().unwrap();
        assert!(!id.is_empty());
        let meta = &created.meta;
        assert_eq!(meta.resource_type.as_deref(), Some("User"));
        assert_eq!(meta.created, meta.last_modified);
        assert_eq!(
            meta.location.as_deref(),
            Some(format!("https://localhost/v2/Users/{}", id).as_str())
        );
        assert!(meta.version.as_deref().is_some_and(|v| v.starts_with("W/\"")));
    }

    #[tokio::test]
    async fn test_create_rejects_client_id_and_missing_key() {
        let provider = user_provider();

        let error = provider
            .create(User::new("alice").with_id("mine"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ScimError::Validation(ValidationError::ClientProvidedId)
        ));

        let mut nameless = User::new("x");
        nameless.user_name = Some("  ".to_string());
        let error = provider.create(nameless, &ctx()).await.unwrap_err();
        assert!(matches!(
            error,
            ScimError::Validation(ValidationError::MissingRequiredAttribute { .. })
        ));
        assert!(provider.repository().is_empty().await);
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let provider = user_provider();
        provider.create(User::new("alice"), &ctx()).await.unwrap();

        let error = provider.create(User::new("alice"), &ctx()).await.unwrap_err();
        assert!(matches!(error, ScimError::Conflict { attribute, .. } if attribute == "userName"));
    }

    #[tokio::test]
    async fn test_replace_keeps_created() {
        let provider = user_provider();
        let created = provider.create(User::new("alice"), &ctx()).await.unwrap();

        let mut changed = created.clone().with_display_name("Alice");
        changed.meta = Meta::default();
        let replaced = provider.replace(changed, &ctx()).await.unwrap();

        assert_eq!(replaced.meta.created, created.meta.created);
        assert!(replaced.meta.last_modified > created.meta.last_modified);
        assert_ne!(replaced.meta.version, created.meta.version);
        assert_eq!(replaced.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_replace_errors() {
        let provider = user_provider();
        let error = provider.replace(User::new("alice"), &ctx()).await.unwrap_err();
        assert!(matches!(error, ScimError::Validation(ValidationError::MissingId)));

        let error = provider
            .replace(User::new("alice").with_id("missing"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(error, ScimError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let provider = user_provider();
        let created = provider.create(User::new("alice"), &ctx()).await.unwrap();
        let id = created.id.clone().unwrap();

        let patch = Patch::new(
            user_id(&id),
            PatchRequest::new(vec![PatchOperation::replace("active", json!(false))]),
        );
        let patched = provider.update(&patch, &ctx()).await.unwrap();
        assert!(!patched.active);
        assert!(patched.meta.last_modified > created.meta.last_modified);

        let stored = provider
            .retrieve(&RetrievalParameters::new(user_id(&id)), &ctx())
            .await
            .unwrap();
        assert_eq!(stored, patched);
    }

    #[tokio::test]
    async fn test_failed_patch_writes_nothing() {
        let provider = user_provider();
        let created = provider.create(User::new("alice"), &ctx()).await.unwrap();
        let id = created.id.clone().unwrap();

        let patch = Patch::new(
            user_id(&id),
            PatchRequest::new(vec![
                PatchOperation::replace("displayName", json!("Alice")),
                PatchOperation::replace("id", json!("other")),
            ]),
        );
        assert!(matches!(
            provider.update(&patch, &ctx()).await,
            Err(ScimError::UnsupportedPatchPath { .. })
        ));

        let stored = provider.load(&id).await.unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_patch_cannot_clear_natural_key() {
        let provider = user_provider();
        let created = provider.create(User::new("alice"), &ctx()).await.unwrap();
        let id = created.id.clone().unwrap();

        for operation in [
            PatchOperation::remove("userName"),
            PatchOperation::replace("userName", json!("   ")),
        ] {
            let patch = Patch::new(user_id(&id), PatchRequest::new(vec![operation]));
            let error = provider.update(&patch, &ctx()).await.unwrap_err();
            assert!(matches!(
                error,
                ScimError::Validation(ValidationError::MissingRequiredAttribute { attribute })
                    if attribute == "userName"
            ));
        }
        assert_eq!(provider.load(&id).await.unwrap(), created);

        let groups = ResourceProvider::new(InMemoryRepository::<Group>::new());
        let team = groups.create(Group::new("Team A"), &ctx()).await.unwrap();
        let patch = Patch::new(
            ResourceIdentifier::of(ResourceType::Group, team.id.clone().unwrap()),
            PatchRequest::new(vec![PatchOperation::remove("displayName")]),
        );
        let error = groups.update(&patch, &ctx()).await.unwrap_err();
        assert!(matches!(
            error,
            ScimError::Validation(ValidationError::MissingRequiredAttribute { attribute })
                if attribute == "displayName"
        ));
    }

    #[tokio::test]
    async fn test_schema_mismatch() {
        let provider = user_provider();
        let parameters = RetrievalParameters::new(ResourceIdentifier::of(ResourceType::Group, "1"));
        let error = provider.retrieve(&parameters, &ctx()).await.unwrap_err();
        assert!(matches!(
            error,
            ScimError::Validation(ValidationError::ResourceTypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_requires_correlation_id() {
        let provider = user_provider();
        let error = provider
            .query(&QueryParameters::new("User"), &RequestContext::new(""))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ScimError::Validation(ValidationError::MissingCorrelationIdentifier)
        ));
    }

    #[tokio::test]
    async fn test_group_provider_query() {
        let provider = ResourceProvider::new(InMemoryRepository::<Group>::new());
        provider.create(Group::new("Team A"), &ctx()).await.unwrap();
        provider
            .create(Group::new("Team B").with_external_id("b"), &ctx())
            .await
            .unwrap();

        let parameters = QueryParameters::new("Group")
            .with_filter(Conjunction::new(FilterTerm::equals("externalId", "B")));
        let groups = provider.query(&parameters, &ctx()).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].display_name.as_deref(), Some("Team B"));
    }

    /// Repository whose calls never complete.
    struct StalledRepository;

    impl Repository<User> for StalledRepository {
        type Error = RepositoryError;

        async fn create(&self, _resource: User) -> Result<(), Self::Error> {
            std::future::pending().await
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<User>, Self::Error> {
            std::future::pending().await
        }

        async fn list_all(&self) -> Result<Vec<User>, Self::Error> {
            std::future::pending().await
        }

        async fn check_exists(
            &self,
            _id: Option<&str>,
            _natural_key: &str,
        ) -> Result<bool, Self::Error> {
            std::future::pending().await
        }

        async fn update_by_id(&self, _id: &str, _resource: User) -> Result<(), Self::Error> {
            std::future::pending().await
        }

        async fn delete_by_id(&self, _id: &str) -> Result<(), Self::Error> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_repository_timeout() {
        let config = ProviderConfig {
            repository_timeout: Some(Duration::from_millis(20)),
            ..ProviderConfig::default()
        };
        let provider = ResourceProvider::<User, _>::with_config(StalledRepository, config).unwrap();

        let error = provider
            .query(&QueryParameters::new("User"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(error, ScimError::Timeout { operation } if operation == "list_all"));
    }
}

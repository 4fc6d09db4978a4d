//! Provisioning operations over users and groups.
//!
//! [`ResourceProvider`] implements create, retrieve, replace, update, delete
//! and query for one concrete resource type over a [`Repository`].
//! [`ScimProvider`] combines a user provider and a group provider behind the
//! generic [`Resource`] contract, routing each request by resource variant
//! or schema identifier.
//!
//! # Example
//!
//! ```rust
//! use scim_provisioning::provider::{ResourceIdentifier, RetrievalParameters, ScimProvider};
//! use scim_provisioning::repository::InMemoryRepository;
//! use scim_provisioning::resource::{Group, RequestContext, ResourceType, User};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ScimProvider::new(
//!     InMemoryRepository::<User>::new(),
//!     InMemoryRepository::<Group>::new(),
//! );
//! let context = RequestContext::with_generated_id();
//!
//! let created = provider.create(User::new("alice").into(), &context).await?;
//! let id = created.id().unwrap_or_default().to_string();
//!
//! let parameters = RetrievalParameters::new(ResourceIdentifier::of(ResourceType::User, id));
//! let fetched = provider.retrieve(&parameters, &context).await?;
//! assert_eq!(fetched, created);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod request;
pub mod resource_provider;

pub use config::{ProviderConfig, ScimProviderBuilder};
pub use request::{Patch, ResourceIdentifier, RetrievalParameters};
pub use resource_provider::ResourceProvider;

use crate::error::{ScimError, ScimResult};
use crate::query::QueryParameters;
use crate::repository::Repository;
use crate::resource::{Group, RequestContext, Resource, ResourceType, ScimResource, User};
use std::sync::Arc;

/// Routes generic resource requests to the user or group provider.
#[derive(Debug)]
pub struct ScimProvider<UR, GR> {
    users: ResourceProvider<User, UR>,
    groups: ResourceProvider<Group, GR>,
    config: Arc<ProviderConfig>,
}

impl<UR: Clone, GR: Clone> Clone for ScimProvider<UR, GR> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            groups: self.groups.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<UR, GR> ScimProvider<UR, GR>
where
    UR: Repository<User>,
    GR: Repository<Group>,
{
    /// Create a provider with the default configuration.
    pub fn new(users: UR, groups: GR) -> Self {
        Self::from_parts(users, groups, Arc::new(ProviderConfig::default()))
    }

    /// Create a provider after validating `config`.
    pub fn with_config(users: UR, groups: GR, config: ProviderConfig) -> ScimResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(users, groups, Arc::new(config)))
    }

    fn from_parts(users: UR, groups: GR, config: Arc<ProviderConfig>) -> Self {
        Self {
            users: ResourceProvider::with_shared_config(users, Arc::clone(&config)),
            groups: ResourceProvider::with_shared_config(groups, Arc::clone(&config)),
            config,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The provider handling users.
    pub fn users(&self) -> &ResourceProvider<User, UR> {
        &self.users
    }

    /// The provider handling groups.
    pub fn groups(&self) -> &ResourceProvider<Group, GR> {
        &self.groups
    }

    pub async fn create(&self, resource: Resource, context: &RequestContext) -> ScimResult<Resource> {
        match resource {
            Resource::User(user) => Ok(self.users.create(user, context).await?.into_resource()),
            Resource::Group(group) => Ok(self.groups.create(group, context).await?.into_resource()),
        }
    }

    pub async fn retrieve(
        &self,
        parameters: &RetrievalParameters,
        context: &RequestContext,
    ) -> ScimResult<Resource> {
        match route(&parameters.resource_identifier.schema_identifier)? {
            ResourceType::User => Ok(self.users.retrieve(parameters, context).await?.into()),
            ResourceType::Group => Ok(self.groups.retrieve(parameters, context).await?.into()),
        }
    }

    pub async fn replace(&self, resource: Resource, context: &RequestContext) -> ScimResult<Resource> {
        match resource {
            Resource::User(user) => Ok(self.users.replace(user, context).await?.into()),
            Resource::Group(group) => Ok(self.groups.replace(group, context).await?.into()),
        }
    }

    /// Apply a patch. The patched resource is not returned.
    pub async fn update(&self, patch: &Patch, context: &RequestContext) -> ScimResult<()> {
        let target = patch.target()?;
        match route(&target.schema_identifier)? {
            ResourceType::User => self.users.update(patch, context).await.map(drop),
            ResourceType::Group => self.groups.update(patch, context).await.map(drop),
        }
    }

    pub async fn delete(
        &self,
        identifier: &ResourceIdentifier,
        context: &RequestContext,
    ) -> ScimResult<()> {
        match route(&identifier.schema_identifier)? {
            ResourceType::User => self.users.delete(identifier, context).await,
            ResourceType::Group => self.groups.delete(identifier, context).await,
        }
    }

    pub async fn query(
        &self,
        parameters: &QueryParameters,
        context: &RequestContext,
    ) -> ScimResult<Vec<Resource>> {
        context.validate()?;
        parameters.validate()?;

        let resources = match route(&parameters.schema_identifier)? {
            ResourceType::User => into_resources(self.users.query(parameters, context).await?),
            ResourceType::Group => into_resources(self.groups.query(parameters, context).await?),
        };
        Ok(resources)
    }
}

fn route(schema_identifier: &str) -> ScimResult<ResourceType> {
    ResourceType::from_schema_identifier(schema_identifier)
        .ok_or_else(|| ScimError::UnsupportedResourceType(schema_identifier.to_string()))
}

fn into_resources<T: ScimResource>(resources: Vec<T>) -> Vec<Resource> {
    resources.into_iter().map(ScimResource::into_resource).collect()
}

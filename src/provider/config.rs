//! Provider configuration and the builder used to assemble a provider.
//!
//! The configuration decides how `meta.location` URLs are formed and how
//! long a single repository call may take.

use super::ScimProvider;
use crate::error::{ScimError, ScimResult};
use crate::repository::Repository;
use crate::resource::{Group, Meta, User};
use std::time::Duration;

/// Configuration shared by every resource provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the service, without the protocol version segment.
    /// Examples: "https://scim.example.com", "http://localhost:8080"
    pub base_url: String,

    /// Protocol version segment used in URLs. Defaults to "v2".
    pub scim_version: String,

    /// Deadline applied to every repository call. `None` waits indefinitely.
    pub repository_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            scim_version: "v2".to_string(),
            repository_timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Build the `meta.location` URL of a resource.
    ///
    /// ```rust
    /// use scim_provisioning::provider::ProviderConfig;
    ///
    /// let config = ProviderConfig {
    ///     base_url: "https://scim.example.com/".to_string(),
    ///     ..ProviderConfig::default()
    /// };
    /// assert_eq!(
    ///     config.resource_location("Users", "42"),
    ///     "https://scim.example.com/v2/Users/42"
    /// );
    /// ```
    pub fn resource_location(&self, endpoint: &str, resource_id: &str) -> String {
        let base = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.scim_version
        );
        Meta::generate_location(&base, endpoint, resource_id)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ScimResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ScimError::configuration("Base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ScimError::configuration(
                "Base URL must start with http:// or https://",
            ));
        }

        if self.scim_version.trim().is_empty() {
            return Err(ScimError::configuration("SCIM version cannot be empty"));
        }

        if self.repository_timeout == Some(Duration::ZERO) {
            return Err(ScimError::configuration(
                "Repository timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Builder for configuring and creating a [`ScimProvider`].
///
/// # Examples
///
/// ```rust
/// use scim_provisioning::provider::ScimProviderBuilder;
/// use scim_provisioning::repository::InMemoryRepository;
/// use scim_provisioning::resource::{Group, User};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let users = InMemoryRepository::<User>::new();
/// let groups = InMemoryRepository::<Group>::new();
/// let provider = ScimProviderBuilder::new(users, groups)
///     .with_base_url("https://scim.company.com")
///     .with_repository_timeout(Duration::from_secs(5))
///     .build()?;
/// assert_eq!(provider.config().scim_version, "v2");
/// # Ok(())
/// # }
/// ```
pub struct ScimProviderBuilder<UR, GR> {
    users: UR,
    groups: GR,
    config: ProviderConfig,
}

impl<UR, GR> ScimProviderBuilder<UR, GR>
where
    UR: Repository<User>,
    GR: Repository<Group>,
{
    /// Start from the default configuration.
    pub fn new(users: UR, groups: GR) -> Self {
        Self {
            users,
            groups,
            config: ProviderConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Defaults to "v2" if not specified.
    pub fn with_scim_version(mut self, version: impl Into<String>) -> Self {
        self.config.scim_version = version.into();
        self
    }

    pub fn with_repository_timeout(mut self, timeout: Duration) -> Self {
        self.config.repository_timeout = Some(timeout);
        self
    }

    /// Validate the configuration and create the provider.
    pub fn build(self) -> ScimResult<ScimProvider<UR, GR>> {
        ScimProvider::with_config(self.users, self.groups, self.config)
    }
}

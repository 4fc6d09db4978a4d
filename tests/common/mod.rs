//! Shared fixtures for the integration suites.
//!
//! Provides provider constructors, resource builders and scripted
//! repositories whose answers a test controls directly.

#![allow(dead_code)]

use scim_provisioning::repository::{InMemoryRepository, Repository, RepositoryFailure};
use scim_provisioning::resource::{Group, GroupMember, RequestContext, User};
use scim_provisioning::ScimProvider;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type TestProvider = ScimProvider<InMemoryRepository<User>, InMemoryRepository<Group>>;

static LOGGER: Once = Once::new();

/// Route `log` output through env_logger once per test binary.
pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn provider() -> TestProvider {
    init_logging();
    ScimProvider::new(InMemoryRepository::new(), InMemoryRepository::new())
}

pub fn context() -> RequestContext {
    RequestContext::with_generated_id()
}

/// Five users used by the filter and pagination scenarios.
///
/// | userName | active | externalId |
/// |----------|--------|------------|
/// | alice    | true   | ext0       |
/// | bob      | true   | ext1       |
/// | carol    | false  | ext2       |
/// | dave     | true   | -          |
/// | erin     | false  | ext1x      |
pub fn five_users() -> Vec<User> {
    vec![
        User::new("alice").with_external_id("ext0"),
        User::new("bob").with_external_id("ext1"),
        User::new("carol").with_active(false).with_external_id("ext2"),
        User::new("dave").with_display_name("Dave"),
        User::new("erin").with_active(false).with_external_id("ext1x"),
    ]
}

pub fn group_with_members(display_name: &str, member_ids: &[&str]) -> Group {
    member_ids.iter().fold(Group::new(display_name), |group, id| {
        group.with_member(GroupMember::new_user(*id, None).expect("valid member"))
    })
}

/// Store every user and return them as stored, in order.
pub async fn seed_users(provider: &TestProvider, users: Vec<User>) -> Vec<User> {
    let context = context();
    let mut stored = Vec::with_capacity(users.len());
    for user in users {
        stored.push(provider.users().create(user, &context).await.expect("seed user"));
    }
    stored
}

pub fn user_names<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<&'a str> {
    users
        .into_iter()
        .filter_map(|u| u.user_name.as_deref())
        .collect()
}

/// Failure raised by [`ScriptedRepository`].
#[derive(Debug, thiserror::Error)]
pub enum ScriptedError {
    #[error("backend unavailable")]
    Unavailable,
    #[error("unique constraint violated")]
    Unique,
}

impl RepositoryFailure for ScriptedError {
    fn is_uniqueness_violation(&self) -> bool {
        matches!(self, ScriptedError::Unique)
    }
}

/// Repository with fixed answers, counting writes.
#[derive(Debug, Default)]
pub struct ScriptedRepository {
    pub exists: bool,
    pub fail_writes: bool,
    pub unique_violation_on_create: bool,
    pub stored: Option<User>,
    pub writes: AtomicUsize,
}

impl ScriptedRepository {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write(&self) -> Result<(), ScriptedError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.unique_violation_on_create {
            Err(ScriptedError::Unique)
        } else if self.fail_writes {
            Err(ScriptedError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Repository<User> for ScriptedRepository {
    type Error = ScriptedError;

    async fn create(&self, _resource: User) -> Result<(), Self::Error> {
        self.write()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, Self::Error> {
        Ok(self
            .stored
            .clone()
            .filter(|user| user.id.as_deref() == Some(id)))
    }

    async fn list_all(&self) -> Result<Vec<User>, Self::Error> {
        if self.fail_writes {
            return Err(ScriptedError::Unavailable);
        }
        Ok(self.stored.clone().into_iter().collect())
    }

    async fn check_exists(&self, _id: Option<&str>, _natural_key: &str) -> Result<bool, Self::Error> {
        Ok(self.exists)
    }

    async fn update_by_id(&self, _id: &str, _resource: User) -> Result<(), Self::Error> {
        self.write()
    }

    async fn delete_by_id(&self, _id: &str) -> Result<(), Self::Error> {
        self.write()
    }
}

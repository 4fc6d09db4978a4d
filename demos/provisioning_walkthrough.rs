//! Provisioning Walkthrough
//!
//! Drives one provider through the life of a user and a group: create,
//! filtered query, replace, patch and delete. Run with
//! `RUST_LOG=debug` to see the provider's log output.

use scim_provisioning::patch::{PATCH_OP_SCHEMA, PatchOperation, PatchRequest};
use scim_provisioning::provider::{Patch, ResourceIdentifier, RetrievalParameters};
use scim_provisioning::resource::{GROUP_SCHEMA, Group, GroupMember, ResourceType, USER_SCHEMA, User};
use scim_provisioning::{
    InMemoryRepository, QueryParameters, RequestContext, ScimError, ScimProviderBuilder,
};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let provider = ScimProviderBuilder::new(
        InMemoryRepository::<User>::new(),
        InMemoryRepository::<Group>::new(),
    )
    .with_base_url("https://idp.example.com")
    .with_repository_timeout(Duration::from_secs(2))
    .build()?;

    let context = RequestContext::new("walkthrough-1");

    println!("Creating users...");
    let mut ids = Vec::new();
    for (user_name, display_name) in [("bjensen", "Barbara Jensen"), ("jsmith", "John Smith")] {
        let user = provider
            .users()
            .create(User::new(user_name).with_display_name(display_name), &context)
            .await?;
        println!(
            "  {} -> id {} at {}",
            user_name,
            user.id.as_deref().unwrap_or("?"),
            user.meta.location().unwrap_or("?")
        );
        ids.push(user.id.unwrap_or_default());
    }

    match provider.users().create(User::new("bjensen"), &context).await {
        Err(ScimError::Conflict { .. }) => println!("  duplicate bjensen rejected"),
        other => println!("  unexpected outcome for duplicate: {:?}", other),
    }

    println!("\nCreating a group...");
    let mut group = Group::new("Tour Guides");
    for id in &ids {
        group = group.with_member(GroupMember::new_user(id.clone(), None)?);
    }
    let group = provider.groups().create(group, &context).await?;
    let group_id = group.id.clone().unwrap_or_default();
    println!("  Tour Guides has {} member(s)", group.members.len());

    println!("\nQuerying...");
    let query = QueryParameters::from_filter_str(
        USER_SCHEMA,
        r#"userName eq "BJENSEN" or displayName eq "john smith""#,
    )?;
    for resource in provider.query(&query, &context).await? {
        println!("  matched {}", resource.natural_key().unwrap_or("?"));
    }

    println!("\nReplacing bjensen...");
    let replacement = User::new("bjensen")
        .with_id(ids[0].clone())
        .with_display_name("Babs Jensen")
        .with_email("bjensen@example.com", true);
    let replaced = provider.users().replace(replacement, &context).await?;
    println!("  version now {}", replaced.meta.version().unwrap_or("?"));

    println!("\nPatching...");
    let deactivate = Patch::new(
        ResourceIdentifier::of(ResourceType::User, ids[1].clone()),
        PatchRequest::new(vec![PatchOperation::replace("active", json!(false))]),
    );
    provider.update(&deactivate, &context).await?;

    let drop_member = Patch::from_json(
        ResourceIdentifier::new(GROUP_SCHEMA, group_id.clone()),
        json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": [
                {"op": "remove", "path": format!("members[value eq \"{}\"]", ids[1])}
            ]
        }),
    )?;
    provider.update(&drop_member, &context).await?;

    let group = provider
        .retrieve(
            &RetrievalParameters::new(ResourceIdentifier::new(GROUP_SCHEMA, group_id.clone())),
            &context,
        )
        .await?;
    println!(
        "  Tour Guides now has {} member(s)",
        group.as_group().map(|g| g.members.len()).unwrap_or(0)
    );

    let inactive = QueryParameters::new(USER_SCHEMA)
        .with_filters(scim_provisioning::parse_filter("active eq false")?);
    println!(
        "  inactive users: {}",
        provider.query(&inactive, &context).await?.len()
    );

    println!("\nDeleting...");
    for id in &ids {
        provider
            .delete(&ResourceIdentifier::of(ResourceType::User, id.clone()), &context)
            .await?;
    }
    provider
        .delete(&ResourceIdentifier::new(GROUP_SCHEMA, group_id), &context)
        .await?;

    let remaining = provider
        .query(&QueryParameters::new(USER_SCHEMA), &context)
        .await?;
    println!("  {} user(s) remain", remaining.len());

    Ok(())
}

//! engine::operations
//!
//! Validated wrappers around adapter calls.
//!
//! # Design
//!
//! Adapters trust their inputs. Everything a caller hands to the engine is
//! checked here first, and every object an adapter returns is checked
//! before it reaches the caller:
//!
//! - the reference's domain must match the client's context
//! - field validation runs before any network effect
//! - `create` applies defaults; in-place `update` and `delete` never do
//! - deleting a resource marked destructive needs destructive calls enabled
//! - returned objects pass server-side validation
//!
//! Nothing here retries. Errors from the adapter propagate unchanged.

use std::fmt;

use tracing::{debug, info, warn};

use crate::core::errors::{Error, Result};
use crate::core::reference::OrganizationReference;
use crate::core::resource::{Info, Object, Organization, OrganizationInfo, ResourceKey};
use crate::core::validation::Validator;
use crate::forge::{ListParent, OrganizationsClient, ReadClient, WriteClient};

/// How an update was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Patched in place.
    InPlace,
    /// Deleted and created again, for backends without an update verb.
    Recreated,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::InPlace => write!(f, "in-place"),
            UpdateMode::Recreated => write!(f, "recreated"),
        }
    }
}

fn validate_key<I: Info>(key: &I::Key) -> Result<()> {
    let mut v = Validator::new(I::KIND.name());
    v.nested("reference", key);
    v.into_result()
}

/// Check an object returned by an adapter for `expected`.
fn accept<I: Info>(expected: &I::Key, object: Object<I>) -> Result<Object<I>> {
    if object.key() != expected {
        return Err(Error::Invariant(format!(
            "asked for {} {} but the backend returned {}",
            I::KIND,
            expected,
            object.key()
        )));
    }
    object.validate_server_data()?;
    Ok(object)
}

/// Fetch one resource.
///
/// # Errors
///
/// - `DomainUnsupported` if the reference targets another domain
/// - field errors if the reference is incomplete
/// - `NotFound` and other adapter errors unchanged
/// - `InvalidServerData` / `Invariant` if the backend's answer is malformed
pub async fn get<C>(client: &C, key: &<C::Info as Info>::Key) -> Result<Object<C::Info>>
where
    C: ReadClient + ?Sized,
{
    client.context().check_domain(key.domain())?;
    validate_key::<C::Info>(key)?;

    let object = client.get(key).await?;
    accept(key, object)
}

/// List every resource under `parent`.
///
/// Every returned object passes server-side validation; one bad object
/// fails the whole listing.
///
/// # Errors
///
/// `DomainUnsupported` before any call if `parent` targets another domain.
pub async fn list<C>(client: &C, parent: &C::Parent) -> Result<Vec<Object<C::Info>>>
where
    C: ReadClient + ?Sized,
{
    let kind = <C::Info as Info>::KIND;
    if let Some(domain) = parent.scope_domain() {
        client.context().check_domain(domain)?;
    }
    let objects = client.list(parent).await?;
    for object in &objects {
        object.validate_server_data()?;
    }
    debug!(%kind, count = objects.len(), "listed resources");
    Ok(objects)
}

/// List the direct sub-organizations of `org`.
///
/// Each child must pass server-side validation and hang directly off
/// `org`; a child elsewhere in the tree is an `Invariant` break.
///
/// # Errors
///
/// - `DomainUnsupported`, field errors: before any network call
/// - `ProviderNoSupport` on flat providers, from the adapter
pub async fn children<C>(client: &C, org: &OrganizationReference) -> Result<Vec<Organization>>
where
    C: OrganizationsClient + ?Sized,
{
    client.context().check_domain(&org.domain)?;
    validate_key::<OrganizationInfo>(org)?;

    let children = client.children(org).await?;
    for child in &children {
        if child.key().parent().as_ref() != Some(org) {
            return Err(Error::Invariant(format!(
                "asked for children of {} but the backend returned {}",
                org,
                child.key()
            )));
        }
        child.validate_server_data()?;
    }
    debug!(organization = %org, count = children.len(), "listed sub-organizations");
    Ok(children)
}

/// Create a resource, applying defaults first.
///
/// # Errors
///
/// - `DomainUnsupported`, field errors: before any network call
/// - `AlreadyExists` if the resource exists; no object is returned
pub async fn create<C>(
    client: &C,
    key: &<C::Info as Info>::Key,
    info: C::Info,
) -> Result<Object<C::Info>>
where
    C: WriteClient + ?Sized,
{
    let kind = <C::Info as Info>::KIND;
    client.context().check_domain(key.domain())?;

    let mut desired = Object::new(key.clone(), info);
    desired.apply_defaults();
    desired.validate_create()?;

    let created = client.create(key, desired.get()).await?;
    let created = accept(key, created)?;
    info!(%kind, resource = %key, "created");
    Ok(created)
}

/// Push the declared info of `object` to the backend.
///
/// In place, only the fields `object` declares are changed. On success
/// `object` is replaced by the backend's refreshed copy.
///
/// If the backend has no update verb the resource is deleted and recreated
/// from `object`'s info, which callers observe as [`UpdateMode::Recreated`].
/// Recreation is a create: fields the info leaves unset get their defaults,
/// so pass an object fetched with [`get`] and merged with
/// [`Info::merge_declared`], as [`reconcile`](super::reconcile) does.
///
/// On failure the backend may have applied part of the change; nothing is
/// rolled back.
pub async fn update<C>(client: &C, object: &mut Object<C::Info>) -> Result<UpdateMode>
where
    C: WriteClient + ?Sized,
{
    let kind = <C::Info as Info>::KIND;
    let key = object.key().clone();
    client.context().check_domain(key.domain())?;
    object.validate_update()?;

    if client.capabilities().update {
        let refreshed = client.update(object).await?;
        *object = accept(&key, refreshed)?;
        info!(%kind, resource = %key, "updated");
        return Ok(UpdateMode::InPlace);
    }

    if <C::Info as Info>::DESTRUCTIVE_DELETE {
        client
            .context()
            .check_destructive(&format!("recreating {} {}", kind, key))?;
    }

    warn!(
        %kind,
        resource = %key,
        "backend has no update verb, deleting and recreating"
    );
    let mut info = object.get();
    info.apply_defaults();
    client.delete(&key).await?;
    let recreated = client.create(&key, info).await?;
    *object = accept(&key, recreated)?;
    Ok(UpdateMode::Recreated)
}

/// Delete a resource. The envelope is consumed and cannot be reused.
///
/// # Errors
///
/// `DestructiveCallDisallowed` for destructive kinds (repositories) unless
/// the client's context enables destructive calls.
pub async fn delete<C>(client: &C, object: Object<C::Info>) -> Result<()>
where
    C: WriteClient + ?Sized,
{
    let kind = <C::Info as Info>::KIND;
    let key = object.key();
    client.context().check_domain(key.domain())?;
    object.validate_delete()?;

    if <C::Info as Info>::DESTRUCTIVE_DELETE {
        client
            .context()
            .check_destructive(&format!("deleting {} {}", kind, key))?;
    }

    client.delete(key).await?;
    info!(%kind, resource = %key, "deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::core::reference::{OrganizationReference, OwnerReference, RepositoryReference};
    use crate::core::resource::RepositoryInfo;
    use crate::forge::{ClientContext, ProviderId};

    /// Answers every `get` with the same repository, whatever was asked.
    struct Misrouting {
        context: ClientContext,
        answer: Object<RepositoryInfo>,
    }

    #[async_trait]
    impl ReadClient for Misrouting {
        type Info = RepositoryInfo;
        type Parent = OwnerReference;

        fn context(&self) -> &ClientContext {
            &self.context
        }

        async fn get(&self, _key: &RepositoryReference) -> Result<Object<RepositoryInfo>> {
            Ok(self.answer.clone())
        }

        async fn list(&self, _parent: &OwnerReference) -> Result<Vec<Object<RepositoryInfo>>> {
            Ok(vec![self.answer.clone()])
        }
    }

    fn repo(name: &str) -> RepositoryReference {
        RepositoryReference::new(OrganizationReference::new("github.com", "acme"), name)
    }

    fn misrouting(answer: RepositoryReference) -> Misrouting {
        let mut info = RepositoryInfo::default();
        info.apply_defaults();
        Misrouting {
            context: ClientContext::new(ProviderId::GitHub, "github.com"),
            answer: Object::from_server(answer, info, serde_json::Value::Null),
        }
    }

    #[tokio::test]
    async fn wrong_resource_is_an_invariant_break() {
        let client = misrouting(repo("other"));
        let err = get(&client, &repo("widgets")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[tokio::test]
    async fn nameless_resource_is_an_invariant_break() {
        let client = misrouting(repo(""));
        let err = list(&client, &OwnerReference::from(OrganizationReference::new("github.com", "acme")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[tokio::test]
    async fn incomplete_reference_rejected_before_call() {
        let client = misrouting(repo("widgets"));
        let err = get(&client, &repo("")).await.unwrap_err();
        assert!(err.is(ErrorKind::FieldRequired));
    }

    #[test]
    fn update_mode_display() {
        assert_eq!(UpdateMode::InPlace.to_string(), "in-place");
        assert_eq!(UpdateMode::Recreated.to_string(), "recreated");
    }
}

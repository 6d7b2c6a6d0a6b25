//! forge::traits
//!
//! The contract every provider adapter implements to plug into the engine.
//!
//! # Design
//!
//! One client trait per resource kind. [`ReadClient`] covers `get` and
//! `list`; [`WriteClient`] adds `create`, `update` and `delete`. Each
//! backend supplies one implementation per kind and bundles them behind a
//! [`Provider`].
//!
//! The traits are async because adapters perform network I/O. Dropping a
//! returned future cancels the single request in flight; callers impose
//! deadlines with `tokio::time::timeout` or similar.
//!
//! # Error contract
//!
//! Adapters translate their own HTTP status codes or SDK errors into
//! [`Error`](crate::core::errors::Error):
//!
//! - `get` returns `NotFound` when the resource is absent, never a generic error
//! - `list` exhausts every page; a failing page fails the whole call
//! - `create` returns `AlreadyExists` on a duplicate-name conflict
//! - `update` and `delete` follow the same rules
//! - rejected credentials map to `Unauthorized`, throttling to `RateLimited`
//!
//! Adapters are not expected to validate inputs; the engine does that
//! before calling them.

use async_trait::async_trait;

use super::context::ClientContext;
use crate::core::errors::Result;
use crate::core::reference::{OrganizationReference, OwnerReference, RepositoryReference};
use crate::core::resource::{
    DeployKeyInfo, Info, Object, Organization, OrganizationInfo, RepositoryInfo, TeamAccessInfo,
    TeamInfo,
};

/// What a client can do beyond the mandatory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether the backend can update a resource in place. Without it the
    /// engine deletes and recreates.
    pub update: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { update: true }
    }
}

/// A reference a listing can be scoped to.
pub trait ListParent: Send + Sync {
    /// Host the listing targets, if the scope names one.
    fn scope_domain(&self) -> Option<&str>;
}

/// Listing organizations is scoped to the client's own domain.
impl ListParent for () {
    fn scope_domain(&self) -> Option<&str> {
        None
    }
}

impl ListParent for OrganizationReference {
    fn scope_domain(&self) -> Option<&str> {
        Some(&self.domain)
    }
}

impl ListParent for OwnerReference {
    fn scope_domain(&self) -> Option<&str> {
        Some(self.domain())
    }
}

impl ListParent for RepositoryReference {
    fn scope_domain(&self) -> Option<&str> {
        Some(self.domain())
    }
}

/// Read access to one resource kind.
#[async_trait]
pub trait ReadClient: Send + Sync {
    /// The declared info of the resource this client serves.
    type Info: Info;

    /// The reference a listing is scoped to.
    type Parent: ListParent;

    /// The context this client was built with.
    fn context(&self) -> &ClientContext;

    /// Fetch one resource.
    ///
    /// # Errors
    ///
    /// `NotFound` if it does not exist.
    async fn get(&self, key: &<Self::Info as Info>::Key) -> Result<Object<Self::Info>>;

    /// List every resource under `parent`, following all pages.
    async fn list(&self, parent: &Self::Parent) -> Result<Vec<Object<Self::Info>>>;
}

/// Read and write access to one resource kind.
#[async_trait]
pub trait WriteClient: ReadClient {
    /// What this backend supports for the resource kind.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Create a resource from an already defaulted and validated info.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if a resource with the same identity exists.
    async fn create(
        &self,
        key: &<Self::Info as Info>::Key,
        info: Self::Info,
    ) -> Result<Object<Self::Info>>;

    /// Push the declared info of `object` to the backend, returning the
    /// refreshed object.
    ///
    /// Only called when [`Capabilities::update`] is set.
    async fn update(&self, object: &Object<Self::Info>) -> Result<Object<Self::Info>>;

    /// Delete the resource.
    async fn delete(&self, key: &<Self::Info as Info>::Key) -> Result<()>;
}

/// Organizations visible to the client.
#[async_trait]
pub trait OrganizationsClient: ReadClient<Info = OrganizationInfo, Parent = ()> {
    /// Direct sub-organizations of `org`.
    ///
    /// # Errors
    ///
    /// `ProviderNoSupport` on providers with flat organizations.
    async fn children(&self, org: &OrganizationReference) -> Result<Vec<Organization>>;
}

/// Teams of an organization.
pub trait TeamsClient: ReadClient<Info = TeamInfo, Parent = OrganizationReference> {}

impl<T> TeamsClient for T where T: ReadClient<Info = TeamInfo, Parent = OrganizationReference> {}

/// Repositories of an organization or user.
pub trait RepositoriesClient: WriteClient<Info = RepositoryInfo, Parent = OwnerReference> {}

impl<T> RepositoriesClient for T where T: WriteClient<Info = RepositoryInfo, Parent = OwnerReference>
{}

/// Deploy keys of a repository.
pub trait DeployKeysClient:
    WriteClient<Info = DeployKeyInfo, Parent = RepositoryReference>
{
}

impl<T> DeployKeysClient for T where
    T: WriteClient<Info = DeployKeyInfo, Parent = RepositoryReference>
{
}

/// Team access bindings of a repository.
pub trait TeamAccessClient:
    WriteClient<Info = TeamAccessInfo, Parent = RepositoryReference>
{
}

impl<T> TeamAccessClient for T where
    T: WriteClient<Info = TeamAccessInfo, Parent = RepositoryReference>
{
}

/// A backend: one client per resource kind sharing one context.
pub trait Provider: Send + Sync {
    /// The shared context.
    fn context(&self) -> &ClientContext;

    /// Organizations.
    fn organizations(&self) -> &dyn OrganizationsClient;

    /// Teams.
    fn teams(&self) -> &dyn TeamsClient;

    /// Repositories.
    fn repositories(&self) -> &dyn RepositoriesClient;

    /// Deploy keys.
    fn deploy_keys(&self) -> &dyn DeployKeysClient;

    /// Team access bindings.
    fn team_access(&self) -> &dyn TeamAccessClient;
}

//! forge::mock
//!
//! In-memory provider for deterministic testing.
//!
//! # Design
//!
//! [`MockProvider`] implements every client trait over a shared in-memory
//! store. It behaves like a well-behaved backend:
//!
//! - `get` on an absent resource returns `NotFound`
//! - `create` on an existing resource returns `AlreadyExists`
//! - listings are served in pages of [`MockProvider::with_page_size`] items
//! - created objects are hydrated: defaults filled in, plus a payload with
//!   an id and timestamps
//! - `update` patches: only fields the object declares are changed
//! - team access bindings have no update verb unless enabled
//! - flat providers reject anything under a sub-organization with
//!   `ProviderNoSupport`; teams need a top-level organization everywhere
//!
//! Failures can be injected per operation and resource kind with
//! [`FailOn`], and every call is recorded as a [`MockOperation`].
//!
//! # Example
//!
//! ```
//! use forgestate::core::reference::OrganizationReference;
//! use forgestate::core::resource::{DeployKeyInfo, DeployKeyReference, RepositoryInfo};
//! use forgestate::core::reference::RepositoryReference;
//! use forgestate::engine;
//! use forgestate::forge::mock::MockProvider;
//! use forgestate::forge::{ClientContext, Provider, ProviderId};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new(ClientContext::new(ProviderId::GitHub, "github.com"));
//! let repo = RepositoryReference::new(OrganizationReference::new("github.com", "acme"), "api");
//!
//! engine::create(provider.repositories(), &repo, RepositoryInfo::default())
//!     .await
//!     .unwrap();
//!
//! let key = DeployKeyReference::new(repo.clone(), "ci");
//! let created = engine::create(provider.deploy_keys(), &key, DeployKeyInfo::new("ci", "ssh-ed25519 AAAA"))
//!     .await
//!     .unwrap();
//! assert_eq!(created.info().read_only, Some(true));
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::context::ClientContext;
use super::traits::{
    Capabilities, DeployKeysClient, ListParent, OrganizationsClient, Provider, ReadClient,
    RepositoriesClient, TeamAccessClient, TeamsClient, WriteClient,
};
use crate::core::errors::{Error, Result};
use crate::core::reference::{OrganizationReference, OwnerReference, RepositoryReference};
use crate::core::resource::{
    DeployKey, DeployKeyInfo, DeployKeyReference, Info, Object, Organization, OrganizationInfo,
    Repository, RepositoryInfo, ResourceKind, Team, TeamAccess, TeamAccessInfo,
    TeamAccessReference, TeamInfo, TeamReference,
};
use crate::engine::pagination::{all_pages, Page};

/// Default number of items per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Which operation should fail, and with what.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `get` for the kind.
    Get(ResourceKind, Error),
    /// Fail every page fetch of `list` for the kind.
    List(ResourceKind, Error),
    /// Fail `children` of organizations.
    Children(Error),
    /// Fail `create` for the kind.
    Create(ResourceKind, Error),
    /// Fail `update` for the kind.
    Update(ResourceKind, Error),
    /// Fail `delete` for the kind.
    Delete(ResourceKind, Error),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    /// `get` of one resource.
    Get {
        kind: ResourceKind,
        resource: String,
    },
    /// One page fetched by `list`; `cursor` is `None` for the first page.
    ListPage {
        kind: ResourceKind,
        cursor: Option<String>,
    },
    /// `children` of an organization.
    Children {
        organization: String,
    },
    /// `create` of one resource.
    Create {
        kind: ResourceKind,
        resource: String,
    },
    /// In-place `update` of one resource.
    Update {
        kind: ResourceKind,
        resource: String,
    },
    /// `delete` of one resource.
    Delete {
        kind: ResourceKind,
        resource: String,
    },
}

impl MockOperation {
    /// Whether the operation changes backend state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            MockOperation::Create { .. } | MockOperation::Update { .. } | MockOperation::Delete { .. }
        )
    }

    /// The resource kind the operation targeted.
    pub fn kind(&self) -> ResourceKind {
        match self {
            MockOperation::Get { kind, .. }
            | MockOperation::ListPage { kind, .. }
            | MockOperation::Create { kind, .. }
            | MockOperation::Update { kind, .. }
            | MockOperation::Delete { kind, .. } => *kind,
            MockOperation::Children { .. } => ResourceKind::Organization,
        }
    }
}

/// Shared mutable state.
#[derive(Debug)]
pub struct MockState {
    organizations: HashMap<OrganizationReference, Organization>,
    teams: HashMap<TeamReference, Team>,
    repositories: HashMap<RepositoryReference, Repository>,
    deploy_keys: HashMap<DeployKeyReference, DeployKey>,
    team_access: HashMap<TeamAccessReference, TeamAccess>,
    next_id: u64,
    page_size: usize,
    without_update: HashSet<ResourceKind>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

impl MockState {
    fn new() -> Self {
        Self {
            organizations: HashMap::new(),
            teams: HashMap::new(),
            repositories: HashMap::new(),
            deploy_keys: HashMap::new(),
            team_access: HashMap::new(),
            next_id: 1,
            page_size: DEFAULT_PAGE_SIZE,
            without_update: HashSet::from([ResourceKind::TeamAccess]),
            fail_on: None,
            operations: Vec::new(),
        }
    }

    /// Backend payload for a freshly written resource.
    fn payload(&mut self, previous: Option<&Value>) -> Value {
        let now = Utc::now().to_rfc3339();
        match previous.and_then(|p| p.get("id").cloned()) {
            Some(id) => {
                let created_at = previous
                    .and_then(|p| p.get("created_at").cloned())
                    .unwrap_or_else(|| Value::String(now.clone()));
                json!({ "id": id, "created_at": created_at, "updated_at": now })
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                json!({ "id": id, "created_at": now, "updated_at": now })
            }
        }
    }

    fn check_fail(
        &self,
        matches: impl Fn(&FailOn) -> Option<ResourceKind>,
        kind: ResourceKind,
    ) -> Result<()> {
        match &self.fail_on {
            Some(fail) if matches(fail) == Some(kind) => Err(failure_error(fail)),
            _ => Ok(()),
        }
    }

    fn require_repository(&self, repository: &RepositoryReference) -> Result<()> {
        if self.repositories.contains_key(repository) {
            Ok(())
        } else {
            Err(Error::not_found(format!("repository {}", repository)))
        }
    }
}

fn failure_error(fail: &FailOn) -> Error {
    match fail {
        FailOn::Get(_, e)
        | FailOn::List(_, e)
        | FailOn::Children(e)
        | FailOn::Create(_, e)
        | FailOn::Update(_, e)
        | FailOn::Delete(_, e) => e.clone(),
    }
}

/// A resource kind the mock can store.
pub trait Stored: Info {
    /// The reference listings are scoped to.
    type Parent: ListParent;

    /// The map holding resources of this kind.
    fn table(state: &MockState) -> &HashMap<Self::Key, Object<Self>>;

    /// Mutable access to the map holding resources of this kind.
    fn table_mut(state: &mut MockState) -> &mut HashMap<Self::Key, Object<Self>>;

    /// Whether `key` is listed under `parent`.
    fn listed_under(key: &Self::Key, parent: &Self::Parent) -> bool;

    /// Check that whatever `key` hangs off exists.
    fn check_parent(_state: &MockState, _key: &Self::Key) -> Result<()> {
        Ok(())
    }

    /// Check that the provider can address `key` at all.
    fn check_key(_context: &ClientContext, _key: &Self::Key) -> Result<()> {
        Ok(())
    }

    /// Check that the provider can list under `parent` at all.
    fn check_scope(_context: &ClientContext, _parent: &Self::Parent) -> Result<()> {
        Ok(())
    }
}

/// Flat providers have no sub-organizations to host resources under.
fn check_owner(context: &ClientContext, owner: &OwnerReference) -> Result<()> {
    match owner {
        OwnerReference::Organization(org) => context.check_flat_organization(org),
        OwnerReference::User(_) => Ok(()),
    }
}

/// Teams exist on top-level organizations only.
fn check_team_scope(context: &ClientContext, org: &OrganizationReference) -> Result<()> {
    context.check_flat_organization(org)?;
    context.check_top_level(org)
}

/// A stored kind that supports create, update and delete.
pub trait Writable: Stored {
    /// Remove resources that hang off `key`.
    fn cascade(_state: &mut MockState, _key: &Self::Key) {}
}

impl Stored for OrganizationInfo {
    type Parent = ();

    fn table(state: &MockState) -> &HashMap<Self::Key, Object<Self>> {
        &state.organizations
    }

    fn table_mut(state: &mut MockState) -> &mut HashMap<Self::Key, Object<Self>> {
        &mut state.organizations
    }

    fn listed_under(key: &Self::Key, _parent: &()) -> bool {
        key.is_top_level()
    }

    fn check_key(context: &ClientContext, key: &Self::Key) -> Result<()> {
        context.check_flat_organization(key)
    }
}

impl Stored for TeamInfo {
    type Parent = OrganizationReference;

    fn table(state: &MockState) -> &HashMap<Self::Key, Object<Self>> {
        &state.teams
    }

    fn table_mut(state: &mut MockState) -> &mut HashMap<Self::Key, Object<Self>> {
        &mut state.teams
    }

    fn listed_under(key: &Self::Key, parent: &OrganizationReference) -> bool {
        &key.organization == parent
    }

    fn check_key(context: &ClientContext, key: &Self::Key) -> Result<()> {
        check_team_scope(context, &key.organization)
    }

    fn check_scope(context: &ClientContext, parent: &OrganizationReference) -> Result<()> {
        check_team_scope(context, parent)
    }
}

impl Stored for RepositoryInfo {
    type Parent = OwnerReference;

    fn table(state: &MockState) -> &HashMap<Self::Key, Object<Self>> {
        &state.repositories
    }

    fn table_mut(state: &mut MockState) -> &mut HashMap<Self::Key, Object<Self>> {
        &mut state.repositories
    }

    fn listed_under(key: &Self::Key, parent: &OwnerReference) -> bool {
        &key.owner == parent
    }

    fn check_key(context: &ClientContext, key: &Self::Key) -> Result<()> {
        check_owner(context, &key.owner)
    }

    fn check_scope(context: &ClientContext, parent: &OwnerReference) -> Result<()> {
        check_owner(context, parent)
    }
}

impl Writable for RepositoryInfo {
    fn cascade(state: &mut MockState, key: &Self::Key) {
        state.deploy_keys.retain(|k, _| &k.repository != key);
        state.team_access.retain(|k, _| &k.repository != key);
    }
}

impl Stored for DeployKeyInfo {
    type Parent = RepositoryReference;

    fn table(state: &MockState) -> &HashMap<Self::Key, Object<Self>> {
        &state.deploy_keys
    }

    fn table_mut(state: &mut MockState) -> &mut HashMap<Self::Key, Object<Self>> {
        &mut state.deploy_keys
    }

    fn listed_under(key: &Self::Key, parent: &RepositoryReference) -> bool {
        &key.repository == parent
    }

    fn check_key(context: &ClientContext, key: &Self::Key) -> Result<()> {
        check_owner(context, &key.repository.owner)
    }

    fn check_scope(context: &ClientContext, parent: &RepositoryReference) -> Result<()> {
        check_owner(context, &parent.owner)
    }

    fn check_parent(state: &MockState, key: &Self::Key) -> Result<()> {
        state.require_repository(&key.repository)
    }
}

impl Writable for DeployKeyInfo {}

impl Stored for TeamAccessInfo {
    type Parent = RepositoryReference;

    fn table(state: &MockState) -> &HashMap<Self::Key, Object<Self>> {
        &state.team_access
    }

    fn table_mut(state: &mut MockState) -> &mut HashMap<Self::Key, Object<Self>> {
        &mut state.team_access
    }

    fn listed_under(key: &Self::Key, parent: &RepositoryReference) -> bool {
        &key.repository == parent
    }

    fn check_key(context: &ClientContext, key: &Self::Key) -> Result<()> {
        check_owner(context, &key.repository.owner)
    }

    fn check_scope(context: &ClientContext, parent: &RepositoryReference) -> Result<()> {
        check_owner(context, &parent.owner)
    }

    fn check_parent(state: &MockState, key: &Self::Key) -> Result<()> {
        state.require_repository(&key.repository)?;
        if let OwnerReference::Organization(org) = &key.repository.owner {
            let team = TeamReference::new(org.clone(), key.team.clone());
            if !state.teams.contains_key(&team) {
                return Err(Error::not_found(format!("team {}", team)));
            }
        }
        Ok(())
    }
}

impl Writable for TeamAccessInfo {}

/// Client for one resource kind over the shared store.
#[derive(Debug)]
pub struct MockClient<I> {
    context: ClientContext,
    state: Arc<Mutex<MockState>>,
    _kind: PhantomData<fn() -> I>,
}

impl<I> Clone for MockClient<I> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            state: Arc::clone(&self.state),
            _kind: PhantomData,
        }
    }
}

/// Organizations client.
pub type MockOrganizations = MockClient<OrganizationInfo>;
/// Teams client.
pub type MockTeams = MockClient<TeamInfo>;
/// Repositories client.
pub type MockRepositories = MockClient<RepositoryInfo>;
/// Deploy keys client.
pub type MockDeployKeys = MockClient<DeployKeyInfo>;
/// Team access client.
pub type MockTeamAccess = MockClient<TeamAccessInfo>;

impl<I: Stored> MockClient<I> {
    fn new(context: ClientContext, state: Arc<Mutex<MockState>>) -> Self {
        Self {
            context,
            state,
            _kind: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    fn fetch_page(&self, items: &[Object<I>], cursor: Option<String>) -> Result<Page<Object<I>>> {
        let mut state = self.lock();
        state.operations.push(MockOperation::ListPage {
            kind: I::KIND,
            cursor: cursor.clone(),
        });
        state.check_fail(
            |f| match f {
                FailOn::List(kind, _) => Some(*kind),
                _ => None,
            },
            I::KIND,
        )?;

        let start = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| Error::Invariant(format!("mock cursor {:?} is not an offset", c)))?,
        };
        let size = state.page_size.max(1);
        let end = (start + size).min(items.len());
        let page = items.get(start..end).unwrap_or_default().to_vec();
        Ok(if end < items.len() {
            Page::with_next(page, end.to_string())
        } else {
            Page::last(page)
        })
    }
}

#[async_trait]
impl<I: Stored> ReadClient for MockClient<I>
where
    I::Parent: 'static,
{
    type Info = I;
    type Parent = I::Parent;

    fn context(&self) -> &ClientContext {
        &self.context
    }

    async fn get(&self, key: &I::Key) -> Result<Object<I>> {
        self.record(MockOperation::Get {
            kind: I::KIND,
            resource: key.to_string(),
        });

        let state = self.lock();
        state.check_fail(
            |f| match f {
                FailOn::Get(kind, _) => Some(*kind),
                _ => None,
            },
            I::KIND,
        )?;
        I::check_key(&self.context, key)?;

        I::table(&state)
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{} {}", I::KIND, key)))
    }

    async fn list(&self, parent: &I::Parent) -> Result<Vec<Object<I>>> {
        I::check_scope(&self.context, parent)?;
        let items: Vec<Object<I>> = {
            let state = self.lock();
            let mut items: Vec<Object<I>> = I::table(&state)
                .values()
                .filter(|o| I::listed_under(o.key(), parent))
                .cloned()
                .collect();
            items.sort_by_key(|o| o.key().to_string());
            items
        };

        all_pages(|cursor| {
            let page = self.fetch_page(&items, cursor);
            async move { page }
        })
        .await
    }
}

#[async_trait]
impl<I: Writable> WriteClient for MockClient<I>
where
    I::Parent: 'static,
{
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update: !self.lock().without_update.contains(&I::KIND),
        }
    }

    async fn create(&self, key: &I::Key, mut info: I) -> Result<Object<I>> {
        self.record(MockOperation::Create {
            kind: I::KIND,
            resource: key.to_string(),
        });

        let mut state = self.lock();
        state.check_fail(
            |f| match f {
                FailOn::Create(kind, _) => Some(*kind),
                _ => None,
            },
            I::KIND,
        )?;
        I::check_key(&self.context, key)?;

        if I::table(&state).contains_key(key) {
            return Err(Error::already_exists(format!("{} {}", I::KIND, key)));
        }
        I::check_parent(&state, key)?;

        info.apply_defaults();
        let payload = state.payload(None);
        let object = Object::from_server(key.clone(), info, payload);
        I::table_mut(&mut state).insert(key.clone(), object.clone());
        Ok(object)
    }

    async fn update(&self, object: &Object<I>) -> Result<Object<I>> {
        let key = object.key();
        self.record(MockOperation::Update {
            kind: I::KIND,
            resource: key.to_string(),
        });

        let mut state = self.lock();
        if state.without_update.contains(&I::KIND) {
            return Err(Error::ProviderNoSupport(format!("updating {}", I::KIND)));
        }
        state.check_fail(
            |f| match f {
                FailOn::Update(kind, _) => Some(*kind),
                _ => None,
            },
            I::KIND,
        )?;
        I::check_key(&self.context, key)?;

        let current = I::table(&state)
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{} {}", I::KIND, key)))?;

        let mut info = current.get();
        info.merge_declared(object.info());
        let payload = state.payload(Some(current.internal()));
        let updated = Object::from_server(key.clone(), info, payload);
        I::table_mut(&mut state).insert(key.clone(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, key: &I::Key) -> Result<()> {
        self.record(MockOperation::Delete {
            kind: I::KIND,
            resource: key.to_string(),
        });

        let mut state = self.lock();
        state.check_fail(
            |f| match f {
                FailOn::Delete(kind, _) => Some(*kind),
                _ => None,
            },
            I::KIND,
        )?;
        I::check_key(&self.context, key)?;

        if I::table_mut(&mut state).remove(key).is_none() {
            return Err(Error::not_found(format!("{} {}", I::KIND, key)));
        }
        I::cascade(&mut state, key);
        Ok(())
    }
}

#[async_trait]
impl OrganizationsClient for MockOrganizations {
    async fn children(&self, org: &OrganizationReference) -> Result<Vec<Organization>> {
        self.record(MockOperation::Children {
            organization: org.to_string(),
        });
        self.context.check_domain(&org.domain)?;
        if self.context.provider().flat_organizations() {
            return Err(Error::ProviderNoSupport(format!(
                "{} has no sub-organizations",
                self.context.provider()
            )));
        }

        let state = self.lock();
        if let Some(FailOn::Children(e)) = &state.fail_on {
            return Err(e.clone());
        }
        if !state.organizations.contains_key(org) {
            return Err(Error::not_found(format!("{} {}", ResourceKind::Organization, org)));
        }

        let mut children: Vec<Organization> = state
            .organizations
            .values()
            .filter(|o| o.key().parent().as_ref() == Some(org))
            .cloned()
            .collect();
        children.sort_by_key(|o| o.key().to_string());
        Ok(children)
    }
}

/// Mock backend: one client per resource kind over a shared store.
///
/// Thread-safe via an internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone)]
pub struct MockProvider {
    context: ClientContext,
    state: Arc<Mutex<MockState>>,
    organizations: MockOrganizations,
    teams: MockTeams,
    repositories: MockRepositories,
    deploy_keys: MockDeployKeys,
    team_access: MockTeamAccess,
}

impl MockProvider {
    /// Create an empty backend serving `context`.
    pub fn new(context: ClientContext) -> Self {
        let state = Arc::new(Mutex::new(MockState::new()));
        Self {
            organizations: MockClient::new(context.clone(), Arc::clone(&state)),
            teams: MockClient::new(context.clone(), Arc::clone(&state)),
            repositories: MockClient::new(context.clone(), Arc::clone(&state)),
            deploy_keys: MockClient::new(context.clone(), Arc::clone(&state)),
            team_access: MockClient::new(context.clone(), Arc::clone(&state)),
            context,
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn seed<I: Stored>(self, key: I::Key, mut info: I) -> Self {
        info.apply_defaults();
        {
            let mut state = self.lock();
            let payload = state.payload(None);
            I::table_mut(&mut state).insert(key.clone(), Object::from_server(key, info, payload));
        }
        self
    }

    /// Seed an organization (and its ancestors).
    pub fn with_organization(mut self, org: OrganizationReference) -> Self {
        let mut chain = vec![org.clone()];
        let mut current = org;
        while let Some(parent) = current.parent() {
            chain.push(parent.clone());
            current = parent;
        }
        for org in chain {
            let exists = self.lock().organizations.contains_key(&org);
            if !exists {
                let info = OrganizationInfo {
                    name: Some(org.identity().to_string()),
                    description: None,
                };
                self = self.seed(org, info);
            }
        }
        self
    }

    /// Seed a team with members.
    pub fn with_team<S: Into<String>>(
        self,
        team: TeamReference,
        members: impl IntoIterator<Item = S>,
    ) -> Self {
        let info = TeamInfo {
            name: team.name.clone(),
            members: members.into_iter().map(Into::into).collect(),
        };
        self.with_organization(team.organization.clone()).seed(team, info)
    }

    /// Seed a repository. Defaults are applied as the backend would.
    pub fn with_repository(self, repository: RepositoryReference, info: RepositoryInfo) -> Self {
        self.seed(repository, info)
    }

    /// Seed an object verbatim, bypassing defaults and checks.
    ///
    /// Useful to simulate a backend returning malformed data.
    pub fn with_raw<I: Stored>(self, object: Object<I>) -> Self {
        {
            let mut state = self.lock();
            I::table_mut(&mut state).insert(object.key().clone(), object);
        }
        self
    }

    /// Serve listings in pages of `size` items.
    pub fn with_page_size(self, size: usize) -> Self {
        self.lock().page_size = size;
        self
    }

    /// Toggle whether the backend has an update verb for `kind`.
    pub fn with_update_support(self, kind: ResourceKind, supported: bool) -> Self {
        {
            let mut state = self.lock();
            if supported {
                state.without_update.remove(&kind);
            } else {
                state.without_update.insert(kind);
            }
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use forgestate::core::errors::Error;
    /// use forgestate::core::resource::ResourceKind;
    /// use forgestate::forge::mock::{FailOn, MockProvider};
    /// use forgestate::forge::{ClientContext, ProviderId};
    ///
    /// let provider = MockProvider::new(ClientContext::new(ProviderId::GitHub, "github.com"))
    ///     .fail_on(FailOn::Get(ResourceKind::Repository, Error::RateLimited("slow down".into())));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// All recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Recorded operations that changed state.
    pub fn writes(&self) -> Vec<MockOperation> {
        self.lock()
            .operations
            .iter()
            .filter(|op| op.is_write())
            .cloned()
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Look up a stored object without recording an operation.
    pub fn stored<I: Stored>(&self, key: &I::Key) -> Option<Object<I>> {
        I::table(&self.lock()).get(key).cloned()
    }

    /// Number of stored objects of a kind.
    pub fn count<I: Stored>(&self) -> usize {
        I::table(&self.lock()).len()
    }
}

impl Provider for MockProvider {
    fn context(&self) -> &ClientContext {
        &self.context
    }

    fn organizations(&self) -> &dyn OrganizationsClient {
        &self.organizations
    }

    fn teams(&self) -> &dyn TeamsClient {
        &self.teams
    }

    fn repositories(&self) -> &dyn RepositoriesClient {
        &self.repositories
    }

    fn deploy_keys(&self) -> &dyn DeployKeysClient {
        &self.deploy_keys
    }

    fn team_access(&self) -> &dyn TeamAccessClient {
        &self.team_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::core::resource::RepositoryVisibility;
    use crate::forge::ProviderId;

    fn github() -> MockProvider {
        MockProvider::new(ClientContext::new(ProviderId::GitHub, "github.com"))
    }

    fn acme() -> OrganizationReference {
        OrganizationReference::new("github.com", "acme")
    }

    fn repo(name: &str) -> RepositoryReference {
        RepositoryReference::new(acme(), name)
    }

    mod read {
        use super::*;

        #[tokio::test]
        async fn get_missing_is_not_found() {
            let provider = github();
            let err = provider.repositories().get(&repo("nope")).await.unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn seeded_repository_is_hydrated() {
            let provider = github().with_repository(repo("api"), RepositoryInfo::default());
            let got = provider.repositories().get(&repo("api")).await.unwrap();
            assert_eq!(got.info().visibility, Some(RepositoryVisibility::Private));
            assert_eq!(got.info().default_branch.as_deref(), Some("main"));
            assert!(got.internal().get("id").is_some());
        }

        #[tokio::test]
        async fn list_spans_pages_in_order() {
            let mut provider = github().with_page_size(2);
            for name in ["e", "a", "d", "b", "c"] {
                provider = provider.with_repository(repo(name), RepositoryInfo::default());
            }

            let owner = OwnerReference::from(acme());
            let listed = provider.repositories().list(&owner).await.unwrap();
            let names: Vec<_> = listed.iter().map(|o| o.key().repository_name.clone()).collect();
            assert_eq!(names, vec!["a", "b", "c", "d", "e"]);

            let pages = provider
                .operations()
                .into_iter()
                .filter(|op| matches!(op, MockOperation::ListPage { .. }))
                .count();
            assert_eq!(pages, 3);
        }

        #[tokio::test]
        async fn list_failure_is_not_partial() {
            let provider = github()
                .with_repository(repo("a"), RepositoryInfo::default())
                .fail_on(FailOn::List(
                    ResourceKind::Repository,
                    Error::RateLimited("throttled".into()),
                ));

            let owner = OwnerReference::from(acme());
            let err = provider.repositories().list(&owner).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RateLimited);
        }

        #[tokio::test]
        async fn organizations_list_top_level_only() {
            let provider = MockProvider::new(ClientContext::new(ProviderId::GitLab, "gitlab.com"))
                .with_organization(
                    OrganizationReference::new("gitlab.com", "acme").with_sub_organizations(["platform"]),
                );

            let orgs = provider.organizations().list(&()).await.unwrap();
            assert_eq!(orgs.len(), 1);
            assert_eq!(orgs[0].key().organization, "acme");
        }

        #[tokio::test]
        async fn children_on_nested_provider() {
            let top = OrganizationReference::new("gitlab.com", "acme");
            let provider = MockProvider::new(ClientContext::new(ProviderId::GitLab, "gitlab.com"))
                .with_organization(top.child("platform"))
                .with_organization(top.child("web"));

            let children = provider.organizations().children(&top).await.unwrap();
            let names: Vec<_> = children.iter().map(|o| o.key().identity().to_string()).collect();
            assert_eq!(names, vec!["platform", "web"]);
        }

        #[tokio::test]
        async fn children_on_flat_provider_unsupported() {
            let provider = github().with_organization(acme());
            let err = provider.organizations().children(&acme()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ProviderNoSupport);
        }

        #[tokio::test]
        async fn teams_listed_per_organization() {
            let other = OrganizationReference::new("github.com", "other");
            let provider = github()
                .with_team(TeamReference::new(acme(), "core"), ["alice"])
                .with_team(TeamReference::new(other, "ops"), Vec::<String>::new());

            let teams = provider.teams().list(&acme()).await.unwrap();
            assert_eq!(teams.len(), 1);
            assert_eq!(teams[0].info().members, vec!["alice".to_string()]);
        }
    }

    mod write {
        use super::*;

        #[tokio::test]
        async fn create_duplicate_already_exists() {
            let provider = github().with_repository(repo("api"), RepositoryInfo::default());
            let err = provider
                .repositories()
                .create(&repo("api"), RepositoryInfo::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        }

        #[tokio::test]
        async fn create_assigns_sequential_ids() {
            let provider = github();
            let a = provider
                .repositories()
                .create(&repo("a"), RepositoryInfo::default())
                .await
                .unwrap();
            let b = provider
                .repositories()
                .create(&repo("b"), RepositoryInfo::default())
                .await
                .unwrap();
            assert_eq!(a.internal()["id"], 1);
            assert_eq!(b.internal()["id"], 2);
        }

        #[tokio::test]
        async fn update_keeps_id() {
            let provider = github().with_repository(repo("api"), RepositoryInfo::default());
            let mut object = provider.repositories().get(&repo("api")).await.unwrap();
            let id = object.internal()["id"].clone();

            object
                .set(RepositoryInfo::default().with_description("hello"))
                .unwrap();
            let updated = provider.repositories().update(&object).await.unwrap();
            assert_eq!(updated.internal()["id"], id);
            assert_eq!(updated.info().description.as_deref(), Some("hello"));
        }

        #[tokio::test]
        async fn deploy_key_needs_repository() {
            let provider = github();
            let key = DeployKeyReference::new(repo("missing"), "ci");
            let err = provider
                .deploy_keys()
                .create(&key, DeployKeyInfo::new("ci", "ssh-ed25519 AAAA"))
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn team_access_needs_team_and_has_no_update() {
            let provider = github().with_repository(repo("api"), RepositoryInfo::default());
            let key = TeamAccessReference::new(repo("api"), "core");

            assert!(!provider.team_access().capabilities().update);
            let err = provider
                .team_access()
                .create(&key, TeamAccessInfo::new("core"))
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn deleting_repository_cascades() {
            let provider = github().with_repository(repo("api"), RepositoryInfo::default());
            let key = DeployKeyReference::new(repo("api"), "ci");
            provider
                .deploy_keys()
                .create(&key, DeployKeyInfo::new("ci", "ssh-ed25519 AAAA"))
                .await
                .unwrap();

            provider.repositories().delete(&repo("api")).await.unwrap();
            assert_eq!(provider.count::<DeployKeyInfo>(), 0);
        }

        #[tokio::test]
        async fn fail_on_create_records_then_fails() {
            let provider = github().fail_on(FailOn::Create(
                ResourceKind::Repository,
                Error::Unauthorized("bad token".into()),
            ));
            let err = provider
                .repositories()
                .create(&repo("api"), RepositoryInfo::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
            assert_eq!(provider.writes().len(), 1);
            assert_eq!(provider.count::<RepositoryInfo>(), 0);

            provider.clear_fail_on();
            provider
                .repositories()
                .create(&repo("api"), RepositoryInfo::default())
                .await
                .unwrap();
        }
    }
}

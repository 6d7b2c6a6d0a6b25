//! Integration tests for the engine against the in-memory provider.
//!
//! These tests verify:
//! - Reconciliation outcomes (create, update, recreate, no-op)
//! - Failure semantics (validation first, aborting on Get errors, create races)
//! - Context checks (domain, destructive calls, flat organizations)
//! - Listing across pages

use forgestate::core::errors::{Error, ErrorKind};
use forgestate::core::reference::{
    parse_repository_url, parse_user_repository_url, OrganizationReference, OwnerReference,
    RepositoryReference,
};
use forgestate::core::resource::{
    DeployKeyInfo, DeployKeyReference, Object, OrganizationInfo, RepositoryInfo,
    RepositoryPermission, RepositoryVisibility, ResourceKind, TeamAccessInfo,
    TeamAccessReference, TeamReference,
};
use forgestate::engine::{self, reconcile, Outcome, ReconcileState, UpdateMode};
use forgestate::forge::mock::{FailOn, MockOperation, MockProvider};
use forgestate::forge::{ClientContext, Provider, ProviderId};

fn github() -> MockProvider {
    MockProvider::new(ClientContext::new(ProviderId::GitHub, "github.com"))
}

fn acme() -> OrganizationReference {
    OrganizationReference::new("github.com", "acme")
}

fn widgets() -> RepositoryReference {
    parse_repository_url("https://github.com/acme/widgets.git", true).unwrap()
}

fn private_with_description(description: &str) -> RepositoryInfo {
    RepositoryInfo::default()
        .with_visibility(RepositoryVisibility::Private)
        .with_description(description)
}

mod outcomes {
    use super::*;

    #[tokio::test]
    async fn matching_declared_fields_is_noop() {
        let provider = github().with_repository(widgets(), private_with_description("x"));

        // default_branch is unset on the desired side and not compared
        let result = reconcile(provider.repositories(), &widgets(), private_with_description("x"))
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Unchanged);
        assert!(!result.action_taken());
        assert_eq!(result.outcome.state(), ReconcileState::NoOp);
        assert!(provider.writes().is_empty());
    }

    #[tokio::test]
    async fn missing_deploy_key_is_created() {
        let provider = github().with_repository(widgets(), RepositoryInfo::default());
        let key = DeployKeyReference::new(widgets(), "ci");

        let result = reconcile(
            provider.deploy_keys(),
            &key,
            DeployKeyInfo::new("ci", "ssh-ed25519 AAAAC3Nza ci@example"),
        )
        .await
        .unwrap();

        assert_eq!(result.outcome, Outcome::Created);
        assert!(result.action_taken());
        assert_eq!(result.object.info().read_only, Some(true));

        let ops = provider.operations();
        assert!(matches!(ops[0], MockOperation::Get { kind: ResourceKind::DeployKey, .. }));
        assert!(matches!(ops[1], MockOperation::Create { kind: ResourceKind::DeployKey, .. }));
    }

    #[tokio::test]
    async fn second_reconcile_is_noop() {
        let provider = github();
        let desired = private_with_description("widgets service");

        let first = reconcile(provider.repositories(), &widgets(), desired.clone())
            .await
            .unwrap();
        let second = reconcile(provider.repositories(), &widgets(), desired)
            .await
            .unwrap();

        assert!(first.action_taken());
        assert!(!second.action_taken());
        assert_eq!(provider.writes().len(), 1);
    }

    #[tokio::test]
    async fn differing_repository_updated_in_place() {
        let provider = github().with_repository(widgets(), private_with_description("old"));

        let result = reconcile(provider.repositories(), &widgets(), private_with_description("new"))
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Updated(UpdateMode::InPlace));
        let stored = provider.stored::<RepositoryInfo>(&widgets()).unwrap();
        assert_eq!(stored.info().description.as_deref(), Some("new"));

        let writes = provider.writes();
        assert_eq!(writes.len(), 1);
        assert!(matches!(writes[0], MockOperation::Update { .. }));
    }

    #[tokio::test]
    async fn update_keeps_undeclared_fields() {
        let seeded = RepositoryInfo::default()
            .with_visibility(RepositoryVisibility::Public)
            .with_default_branch("trunk")
            .with_homepage("https://widgets.example")
            .with_description("old");
        let provider = github().with_repository(widgets(), seeded);

        let result = reconcile(
            provider.repositories(),
            &widgets(),
            RepositoryInfo::default().with_description("new"),
        )
        .await
        .unwrap();
        assert_eq!(result.outcome, Outcome::Updated(UpdateMode::InPlace));

        let stored = provider.stored::<RepositoryInfo>(&widgets()).unwrap();
        assert_eq!(stored.info().description.as_deref(), Some("new"));
        assert_eq!(stored.info().visibility, Some(RepositoryVisibility::Public));
        assert_eq!(stored.info().default_branch.as_deref(), Some("trunk"));
        assert_eq!(stored.info().homepage.as_deref(), Some("https://widgets.example"));
        assert_eq!(result.object.info(), stored.info());
    }

    #[tokio::test]
    async fn unset_homepage_is_not_compared() {
        let seeded = private_with_description("x").with_homepage("https://widgets.example");
        let provider = github().with_repository(widgets(), seeded);

        let result = reconcile(provider.repositories(), &widgets(), private_with_description("x"))
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Unchanged);
        assert!(provider.writes().is_empty());
    }

    #[tokio::test]
    async fn engine_update_patches_declared_fields_only() {
        let seeded = RepositoryInfo::default()
            .with_visibility(RepositoryVisibility::Internal)
            .with_default_branch("trunk");
        let provider = github().with_repository(widgets(), seeded);

        let mut partial = Object::new(widgets(), RepositoryInfo::default().with_description("docs"));
        let mode = engine::update(provider.repositories(), &mut partial).await.unwrap();

        assert_eq!(mode, UpdateMode::InPlace);
        assert_eq!(partial.info().visibility, Some(RepositoryVisibility::Internal));
        assert_eq!(partial.info().default_branch.as_deref(), Some("trunk"));
        assert_eq!(partial.info().description.as_deref(), Some("docs"));
    }

    #[tokio::test]
    async fn team_access_change_recreates() {
        let provider = github()
            .with_team(TeamReference::new(acme(), "core"), ["alice"])
            .with_repository(widgets(), RepositoryInfo::default());
        let key = TeamAccessReference::new(widgets(), "core");

        let created = reconcile(
            provider.team_access(),
            &key,
            TeamAccessInfo::new("core").with_permission(RepositoryPermission::Push),
        )
        .await
        .unwrap();
        assert_eq!(created.outcome, Outcome::Created);

        provider.clear_operations();
        let changed = reconcile(
            provider.team_access(),
            &key,
            TeamAccessInfo::new("core").with_permission(RepositoryPermission::Admin),
        )
        .await
        .unwrap();

        assert_eq!(changed.outcome, Outcome::Updated(UpdateMode::Recreated));
        assert!(changed.action_taken());
        assert_eq!(
            changed.object.info().permission,
            Some(RepositoryPermission::Admin)
        );

        let writes = provider.writes();
        assert!(matches!(writes[0], MockOperation::Delete { .. }));
        assert!(matches!(writes[1], MockOperation::Create { .. }));
    }

    #[tokio::test]
    async fn team_access_updated_in_place_when_supported() {
        let provider = github()
            .with_team(TeamReference::new(acme(), "core"), Vec::<String>::new())
            .with_repository(widgets(), RepositoryInfo::default())
            .with_update_support(ResourceKind::TeamAccess, true);
        let key = TeamAccessReference::new(widgets(), "core");

        reconcile(provider.team_access(), &key, TeamAccessInfo::new("core"))
            .await
            .unwrap();
        let changed = reconcile(
            provider.team_access(),
            &key,
            TeamAccessInfo::new("core").with_permission(RepositoryPermission::Maintain),
        )
        .await
        .unwrap();

        assert_eq!(changed.outcome, Outcome::Updated(UpdateMode::InPlace));
    }

    #[tokio::test]
    async fn user_owned_repository() {
        let provider = github();
        let repo = parse_user_repository_url("https://github.com/octocat/hello").unwrap();

        let result = reconcile(provider.repositories(), &repo, RepositoryInfo::default())
            .await
            .unwrap();
        assert_eq!(result.outcome, Outcome::Created);

        let owner = repo.owner.clone();
        let listed = engine::list(provider.repositories(), &owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].key().is_organization_owned());
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn validation_fails_before_any_call() {
        let provider = github().with_repository(widgets(), RepositoryInfo::default());
        let key = DeployKeyReference::new(widgets(), "ci");

        let err = reconcile(provider.deploy_keys(), &key, DeployKeyInfo::new("ci", Vec::<u8>::new()))
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::FieldRequired));
        assert!(provider.operations().is_empty());
    }

    #[tokio::test]
    async fn missing_and_invalid_fields_reported_together() {
        let provider = github();
        let key = DeployKeyReference::new(widgets(), "ci");

        // empty name is missing, non-UTF-8 key material is invalid
        let err = reconcile(provider.deploy_keys(), &key, DeployKeyInfo::new("", vec![0xffu8, 0xfe]))
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::Multi));
        assert!(err.is(ErrorKind::FieldRequired));
        assert!(err.is(ErrorKind::FieldInvalid));
        assert!(!err.is(ErrorKind::FieldEnumInvalid));
        assert!(provider.operations().is_empty());
    }

    #[tokio::test]
    async fn create_existing_repository_already_exists() {
        let provider = github().with_repository(widgets(), RepositoryInfo::default());

        let err = engine::create(provider.repositories(), &widgets(), RepositoryInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn get_error_aborts() {
        let provider = github().fail_on(FailOn::Get(
            ResourceKind::Repository,
            Error::RateLimited("retry after 60s".into()),
        ));

        let err = reconcile(provider.repositories(), &widgets(), RepositoryInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(provider.writes().is_empty());
    }

    #[tokio::test]
    async fn racing_create_surfaces_already_exists() {
        let provider = github().fail_on(FailOn::Create(
            ResourceKind::Repository,
            Error::already_exists("repository created concurrently"),
        ));

        let err = reconcile(provider.repositories(), &widgets(), RepositoryInfo::default())
            .await
            .unwrap_err();

        assert!(err.is(ErrorKind::AlreadyExists));
    }

    #[tokio::test]
    async fn malformed_server_data_rejected() {
        let raw = Object::from_server(widgets(), RepositoryInfo::default(), serde_json::Value::Null);
        let provider = github().with_raw(raw);

        let err = engine::get(provider.repositories(), &widgets())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidServerData);
        assert!(err.is(ErrorKind::FieldRequired));
    }

    #[tokio::test]
    async fn foreign_domain_rejected_without_calls() {
        let provider = github();
        let repo = parse_repository_url("https://gitlab.com/acme/widgets", true).unwrap();

        let err = reconcile(provider.repositories(), &repo, RepositoryInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DomainUnsupported);
        assert!(provider.operations().is_empty());
    }

    #[tokio::test]
    async fn nested_owner_on_flat_provider() {
        let provider = github();
        let repo = parse_repository_url("https://github.com/acme/platform/widgets", true).unwrap();

        let err = reconcile(provider.repositories(), &repo, RepositoryInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderNoSupport);

        let err = engine::list(provider.repositories(), &repo.owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderNoSupport);
        assert!(provider.writes().is_empty());
    }

    #[tokio::test]
    async fn teams_need_top_level_organization() {
        let top = OrganizationReference::new("gitlab.com", "acme");
        let provider = MockProvider::new(ClientContext::new(ProviderId::GitLab, "gitlab.com"))
            .with_organization(top.child("platform"));
        let team = TeamReference::new(top.child("platform"), "core");

        let err = engine::get(provider.teams(), &team).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotTopLevelOrganization);

        let err = engine::list(provider.teams(), &top.child("platform"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotTopLevelOrganization);

        let listed = engine::list(provider.teams(), &top).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_under_foreign_domain_rejected_without_calls() {
        let provider = github();
        let owner = OwnerReference::from(OrganizationReference::new("gitlab.com", "acme"));

        let err = engine::list(provider.repositories(), &owner)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DomainUnsupported);
        assert!(provider.operations().is_empty());
    }
}

mod destructive {
    use super::*;

    #[tokio::test]
    async fn repository_delete_needs_opt_in() {
        let provider = github().with_repository(widgets(), RepositoryInfo::default());
        let object = engine::get(provider.repositories(), &widgets()).await.unwrap();

        let err = engine::delete(provider.repositories(), object)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DestructiveCallDisallowed);
        assert!(provider.stored::<RepositoryInfo>(&widgets()).is_some());
    }

    #[tokio::test]
    async fn repository_delete_with_opt_in() {
        let context =
            ClientContext::new(ProviderId::GitHub, "github.com").with_destructive_calls(true);
        let provider = MockProvider::new(context).with_repository(widgets(), RepositoryInfo::default());
        let object = engine::get(provider.repositories(), &widgets()).await.unwrap();

        engine::delete(provider.repositories(), object).await.unwrap();

        let err = engine::get(provider.repositories(), &widgets())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn deploy_key_delete_is_not_destructive() {
        let provider = github().with_repository(widgets(), RepositoryInfo::default());
        let key = DeployKeyReference::new(widgets(), "ci");
        let created = engine::create(provider.deploy_keys(), &key, DeployKeyInfo::new("ci", "ssh-rsa AAAA"))
            .await
            .unwrap();

        engine::delete(provider.deploy_keys(), created).await.unwrap();
        assert_eq!(provider.count::<DeployKeyInfo>(), 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn list_collects_every_page() {
        let mut provider = github().with_page_size(3);
        for i in 0..10 {
            let repo = RepositoryReference::new(acme(), format!("repo-{:02}", i));
            provider = provider.with_repository(repo, RepositoryInfo::default());
        }

        let listed = engine::list(provider.repositories(), &OwnerReference::from(acme()))
            .await
            .unwrap();

        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0].key().repository_name, "repo-00");
        assert_eq!(listed[9].key().repository_name, "repo-09");

        let pages = provider
            .operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::ListPage { .. }))
            .count();
        assert_eq!(pages, 4);
    }

    #[tokio::test]
    async fn sub_organizations_on_nested_provider() {
        let top = OrganizationReference::new("gitlab.com", "acme");
        let provider = MockProvider::new(ClientContext::new(ProviderId::GitLab, "gitlab.com"))
            .with_organization(top.child("platform").child("infra"))
            .with_organization(top.child("web"));

        let children = engine::children(provider.organizations(), &top).await.unwrap();
        assert_eq!(children.len(), 2);

        let nested = engine::get(provider.organizations(), &top.child("platform").child("infra"))
            .await
            .unwrap();
        assert_eq!(nested.info().name.as_deref(), Some("infra"));
    }

    #[tokio::test]
    async fn children_of_foreign_domain_rejected_without_calls() {
        let provider = MockProvider::new(ClientContext::new(ProviderId::GitLab, "gitlab.com"));
        let foreign = OrganizationReference::new("github.com", "acme");

        let err = engine::children(provider.organizations(), &foreign)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DomainUnsupported);
        assert!(provider.operations().is_empty());
    }

    #[tokio::test]
    async fn malformed_child_organization_rejected() {
        let top = OrganizationReference::new("gitlab.com", "acme");
        let nameless = Object::from_server(
            top.child("platform"),
            OrganizationInfo::default(),
            serde_json::Value::Null,
        );
        let provider = MockProvider::new(ClientContext::new(ProviderId::GitLab, "gitlab.com"))
            .with_organization(top.clone())
            .with_raw(nameless);

        let err = engine::children(provider.organizations(), &top)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidServerData);
        assert!(err.is(ErrorKind::FieldRequired));
    }
}

//! engine::reconcile
//!
//! The Get / Create / Update state machine.
//!
//! # States
//!
//! ```text
//! Unreconciled --get--> Found | NotFound | Errored
//! NotFound     --create--> Created | Errored
//! Found & !equal --update--> Updated | Errored
//! Found & equal  --> NoOp
//! ```
//!
//! Every path terminates after at most two adapter calls (three when an
//! update is carried out as delete-then-create). There is no retry loop and
//! no rollback.
//!
//! # Concurrency
//!
//! The engine holds no locks. Two callers reconciling the same reference
//! race at the backend; the loser of a racing create sees `AlreadyExists`
//! and must reconcile again.
//!
//! # Example
//!
//! ```
//! use forgestate::core::reference::parse_repository_url;
//! use forgestate::core::resource::{RepositoryInfo, RepositoryVisibility};
//! use forgestate::engine::reconcile;
//! use forgestate::forge::mock::MockProvider;
//! use forgestate::forge::{ClientContext, Provider, ProviderId};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new(ClientContext::new(ProviderId::GitHub, "github.com"));
//! let repo = parse_repository_url("https://github.com/acme/widgets", true).unwrap();
//! let desired = RepositoryInfo::default().with_visibility(RepositoryVisibility::Private);
//!
//! let first = reconcile(provider.repositories(), &repo, desired.clone()).await.unwrap();
//! assert!(first.action_taken());
//!
//! let second = reconcile(provider.repositories(), &repo, desired).await.unwrap();
//! assert!(!second.action_taken());
//! # });
//! ```

use std::fmt;

use tracing::debug;

use super::operations::{self, UpdateMode};
use crate::core::errors::{Error, Result};
use crate::core::resource::{Info, Object, ResourceKind};
use crate::forge::WriteClient;

/// States of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    /// Nothing has been fetched yet.
    Unreconciled,
    /// The resource exists.
    Found,
    /// The resource does not exist.
    NotFound,
    /// An adapter call failed.
    Errored,
    /// The resource was created.
    Created,
    /// The resource was updated (in place or by recreation).
    Updated,
    /// The resource already matched.
    NoOp,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileState::Unreconciled => "unreconciled",
            ReconcileState::Found => "found",
            ReconcileState::NotFound => "not-found",
            ReconcileState::Errored => "errored",
            ReconcileState::Created => "created",
            ReconcileState::Updated => "updated",
            ReconcileState::NoOp => "no-op",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of a successful reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The resource did not exist and was created.
    Created,
    /// The resource differed and was updated.
    Updated(UpdateMode),
    /// The resource already matched the desired info.
    Unchanged,
}

impl Outcome {
    /// Whether any write happened.
    pub fn action_taken(&self) -> bool {
        !matches!(self, Outcome::Unchanged)
    }

    /// The terminal state this outcome corresponds to.
    pub fn state(&self) -> ReconcileState {
        match self {
            Outcome::Created => ReconcileState::Created,
            Outcome::Updated(_) => ReconcileState::Updated,
            Outcome::Unchanged => ReconcileState::NoOp,
        }
    }
}

/// The reconciled object and what was done to it.
#[derive(Debug, Clone)]
pub struct Reconciled<I: Info> {
    /// The object as the backend now has it.
    pub object: Object<I>,
    /// What happened.
    pub outcome: Outcome,
}

impl<I: Info> Reconciled<I> {
    /// Whether any write happened.
    pub fn action_taken(&self) -> bool {
        self.outcome.action_taken()
    }
}

/// Make the resource at `key` match `desired`.
///
/// 1. Validate `desired`; field errors return before any network call.
/// 2. Get the resource. `NotFound` leads to create (with defaults); any
///    other error aborts.
/// 3. If the declared fields already match, do nothing.
/// 4. Otherwise overlay the declared fields onto the current info and
///    update. Fields `desired` leaves unset keep their current values.
///
/// Comparison covers only the declared info, never the backend payload,
/// so repeated calls converge to a no-op.
///
/// # Errors
///
/// - field errors from validation
/// - any `get` error other than `NotFound`
/// - `AlreadyExists` if a concurrent writer created the resource between
///   the get and the create; it is not treated as success
/// - whatever the adapter returns from `create`, `update` or `delete`
pub async fn reconcile<C>(
    client: &C,
    key: &<C::Info as Info>::Key,
    desired: C::Info,
) -> Result<Reconciled<C::Info>>
where
    C: WriteClient + ?Sized,
{
    let kind = <C::Info as Info>::KIND;
    Object::new(key.clone(), desired.clone()).validate_create()?;
    debug!(%kind, resource = %key, state = %ReconcileState::Unreconciled, "reconciling");

    let mut actual = match operations::get(client, key).await {
        Ok(actual) => {
            debug!(%kind, resource = %key, state = %ReconcileState::Found);
            actual
        }
        Err(err) if err.is_not_found() => {
            debug!(%kind, resource = %key, state = %ReconcileState::NotFound);
            let object = operations::create(client, key, desired)
                .await
                .map_err(|err| errored(kind, key, err))?;
            return Ok(Reconciled {
                object,
                outcome: Outcome::Created,
            });
        }
        Err(err) => return Err(errored(kind, key, err)),
    };

    if desired.equals(actual.info()) {
        debug!(%kind, resource = %key, state = %ReconcileState::NoOp);
        return Ok(Reconciled {
            object: actual,
            outcome: Outcome::Unchanged,
        });
    }

    let mut merged = actual.get();
    merged.merge_declared(&desired);
    actual.set(merged)?;
    let mode = operations::update(client, &mut actual)
        .await
        .map_err(|err| errored(kind, key, err))?;

    Ok(Reconciled {
        object: actual,
        outcome: Outcome::Updated(mode),
    })
}

fn errored(kind: ResourceKind, key: &impl fmt::Display, err: Error) -> Error {
    debug!(%kind, resource = %key, state = %ReconcileState::Errored, error = %err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_action_taken() {
        assert!(Outcome::Created.action_taken());
        assert!(Outcome::Updated(UpdateMode::InPlace).action_taken());
        assert!(Outcome::Updated(UpdateMode::Recreated).action_taken());
        assert!(!Outcome::Unchanged.action_taken());
    }

    #[test]
    fn outcome_states() {
        assert_eq!(Outcome::Created.state(), ReconcileState::Created);
        assert_eq!(
            Outcome::Updated(UpdateMode::Recreated).state(),
            ReconcileState::Updated
        );
        assert_eq!(Outcome::Unchanged.state(), ReconcileState::NoOp);
    }

    #[test]
    fn state_display() {
        assert_eq!(ReconcileState::NotFound.to_string(), "not-found");
        assert_eq!(ReconcileState::NoOp.to_string(), "no-op");
    }
}

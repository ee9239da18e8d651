//! Identity reconciliation.
//!
//! Matches an incoming `(email, phone)` pair against stored contacts, links
//! new details to an existing identity, and returns the consolidated cluster.

mod error;
mod locks;
mod request;

pub use error::{ReconcileError, ValidationError, GENERIC_FAILURE};
pub use locks::{KeyGuard, KeyLocks};
pub use request::{IdentifyRequest, ValidatedRequest, ValidationPolicy};

use std::sync::Arc;

use crate::models::{ConsolidatedIdentity, ContactId, NewContact};
use crate::store::ContactStore;

pub struct Reconciler<S> {
    store: S,
    policy: ValidationPolicy,
    locks: Arc<KeyLocks>,
}

impl<S: ContactStore> Reconciler<S> {
    pub fn new(store: S, policy: ValidationPolicy) -> Self {
        Self::with_locks(store, policy, Arc::new(KeyLocks::new()))
    }

    /// Share a lock table with other reconcilers writing to the same store.
    pub fn with_locks(store: S, policy: ValidationPolicy, locks: Arc<KeyLocks>) -> Self {
        Self {
            store,
            policy,
            locks,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a request to its identity, creating at most one contact.
    pub fn resolve(&self, request: &IdentifyRequest) -> Result<ConsolidatedIdentity, ReconcileError> {
        let input = self.policy.validate(request)?;

        let primary_id = {
            let _guard = self.locks.acquire(input.lock_keys());
            self.link(&input)?
        };

        let cluster = self.store.find_cluster(primary_id)?;
        Ok(ConsolidatedIdentity::from_cluster(primary_id, &cluster))
    }

    /// Find or create the record for `input`, returning the cluster's primary id.
    fn link(&self, input: &ValidatedRequest) -> anyhow::Result<ContactId> {
        let email = input.email.as_deref();
        let phone_number = input.phone_number.as_deref();

        let Some(matched) = self.store.find_any_match(email, phone_number)? else {
            let created = self.store.create_contact(NewContact::primary(
                input.email.clone(),
                input.phone_number.clone(),
            ))?;
            tracing::debug!(id = created.id, "created primary contact");
            return Ok(created.id);
        };

        let primary_id = matched.primary_id().ok_or_else(|| {
            anyhow::anyhow!("secondary contact {} has no linked primary", matched.id)
        })?;
        if !matched.has_same_details(email, phone_number) {
            let created = self.store.create_contact(NewContact::secondary(
                input.email.clone(),
                input.phone_number.clone(),
                primary_id,
            ))?;
            tracing::debug!(id = created.id, primary_id, "created secondary contact");
        }

        Ok(primary_id)
    }
}

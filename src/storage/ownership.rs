// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for mutations on stored resources.
//!
//! A resource must be fetched before ownership is checked, so a missing
//! resource always reports `NotFound` rather than `Forbidden`.

use crate::auth::{AuthError, CallerIdentity, OwnershipGate, Role};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Resource name used in error messages.
    const KIND: &'static str;

    /// Get the owner's user ID.
    fn owner_user_id(&self) -> u64;
}

/// Trait for enforcing ownership on stored resources.
pub trait OwnershipEnforcer {
    /// Verify the caller owns this resource or holds the privileged role.
    ///
    /// # Errors
    /// Returns `AuthError::Forbidden` otherwise.
    fn authorize_owner(&self, caller: &CallerIdentity) -> Result<(), AuthError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn authorize_owner(&self, caller: &CallerIdentity) -> Result<(), AuthError> {
        let decision =
            OwnershipGate::authorize(caller.id, caller.role, self.owner_user_id(), Role::PRIVILEGED);
        if !decision.is_allowed() {
            tracing::warn!(
                user_id = caller.id,
                owner_id = self.owner_user_id(),
                resource = T::KIND,
                "Ownership check denied"
            );
        }
        decision.into_result()
    }
}

/// Extension trait for a fetch result that still needs an ownership check.
pub trait OwnershipCheck<T> {
    /// Return the resource if it exists and the caller may modify it.
    fn owned_by(self, id: u64, caller: &CallerIdentity) -> Result<T, AuthError>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn owned_by(self, id: u64, caller: &CallerIdentity) -> Result<T, AuthError> {
        let resource = self.ok_or_else(|| AuthError::not_found(T::KIND, id))?;
        resource.authorize_owner(caller)?;
        Ok(resource)
    }
}

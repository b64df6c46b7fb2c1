// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::password::BCRYPT_COST;
use crate::auth::{AuthValidator, TokenSettings};
use crate::storage::Store;

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Embedded database
    pub store: Store,
    /// Token issuing and validation, backed by the store's user table
    pub auth: Arc<AuthValidator<Store>>,
    /// bcrypt cost for new password hashes
    pub password_cost: u32,
}

impl AppState {
    pub fn new(store: Store, settings: TokenSettings) -> Self {
        let auth = AuthValidator::new(settings, store.clone());
        Self {
            store,
            auth: Arc::new(auth),
            password_cost: BCRYPT_COST,
        }
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

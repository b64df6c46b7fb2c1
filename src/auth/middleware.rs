// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied to the whole `/v1/protected` router subtree so that no protected
//! route can forget to authenticate. The resolved [`CallerIdentity`] is stored
//! in request extensions, where the [`Auth`](super::Auth) extractor picks it up.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/user/me", get(me))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::authenticate;
use super::CallerIdentity;
use crate::state::AppState;

/// Authentication middleware function.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state) {
        Ok(caller) => {
            tracing::debug!(user_id = caller.id, role = %caller.role, "Request authenticated");
            request.extensions_mut().insert::<CallerIdentity>(caller);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Request rejected by authentication");
            e.into_response()
        }
    }
}

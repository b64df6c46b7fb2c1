// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(caller): Auth) -> impl IntoResponse {
//!     // caller is CallerIdentity
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, CallerIdentity, Role, RoleGate};
use crate::state::AppState;

/// Header carrying the raw token.
pub const TOKEN_HEADER: &str = "token";

/// Pull the raw token out of the request headers.
///
/// The `token` header wins; `Authorization: Bearer` is the fallback.
/// Returns `Ok(None)` when neither header is present.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    if let Some(value) = headers.get(TOKEN_HEADER) {
        let token = value.to_str().map_err(|_| AuthError::Malformed)?;
        return Ok(Some(token));
    }

    match headers.get(AUTHORIZATION) {
        Some(value) => {
            let value = value.to_str().map_err(|_| AuthError::Malformed)?;
            let token = value.strip_prefix("Bearer ").ok_or(AuthError::Malformed)?;
            Ok(Some(token))
        }
        None => Ok(None),
    }
}

/// Resolve the caller for a request from its headers.
pub fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<CallerIdentity, AuthError> {
    let token = extract_token(headers)?.ok_or(AuthError::MissingCredential)?;
    state.auth.validate(token)
}

/// Extractor for authenticated callers.
///
/// Reuses the identity placed in request extensions by
/// [`require_auth`](super::middleware::require_auth) when present, otherwise
/// validates the request's token itself.
///
/// # Example
///
/// ```rust,ignore
/// async fn show_issue(
///     Auth(caller): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<IssueResponse>, ApiError> {
///     // caller.id and caller.role come from the user directory
/// }
/// ```
pub struct Auth(pub CallerIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already resolved the caller
        if let Some(caller) = parts.extensions.get::<CallerIdentity>().cloned() {
            return Ok(Auth(caller));
        }

        let caller = authenticate(&parts.headers, state)?;
        Ok(Auth(caller))
    }
}

/// Extractor that requires exactly one role, identified by its code.
///
/// Runs before the body is parsed, so a caller with the wrong role gets
/// `403` even when the request is otherwise invalid.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_issue(RequireRole(caller): QaOnly) -> impl IntoResponse {
///     // Only QA can reach here
/// }
/// ```
pub struct RequireRole<const R: u8>(pub CallerIdentity);

/// Requires the QA role.
pub type QaOnly = RequireRole<{ Role::Qa.code() }>;

impl<const R: u8> FromRequestParts<AppState> for RequireRole<R> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(caller) = Auth::from_request_parts(parts, state).await?;

        // An unknown code matches no caller
        let Some(required_role) = Role::from_code(R) else {
            return Err(AuthError::Forbidden);
        };

        let decision = RoleGate::authorize(caller.role, required_role);
        if !decision.is_allowed() {
            tracing::warn!(
                user_id = caller.id,
                role = %caller.role,
                required = %required_role,
                "Role check denied"
            );
        }
        decision.into_result()?;

        Ok(RequireRole(caller))
    }
}

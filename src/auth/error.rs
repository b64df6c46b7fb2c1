// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message shared by every token rejection that must not reveal which check failed.
const GENERIC_TOKEN_MESSAGE: &str = "Token is invalid or expired";

/// Authentication/authorization error type.
///
/// Every variant is terminal for the request. The transport layer maps each
/// kind to a status via [`AuthError::status_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token supplied
    MissingCredential,
    /// Token cannot be parsed into header, claim and signature
    Malformed,
    /// Signature does not match the recomputed value
    SignatureInvalid,
    /// Claim expiry is in the past
    Expired,
    /// Claim issuer is not ours
    InvalidIssuer,
    /// Claim email matches no current user
    UnknownSubject,
    /// Identity resolved but lacks permission
    Forbidden,
    /// Referenced resource is absent
    NotFound { resource: String, id: String },
    /// User directory failed (infrastructure)
    Directory(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Shorthand for a missing resource.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        AuthError::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Get the error code for this error.
    ///
    /// Signature, expiry and issuer failures share one code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Malformed => "malformed_token",
            AuthError::SignatureInvalid | AuthError::Expired | AuthError::InvalidIssuer => {
                "invalid_token"
            }
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::Forbidden => "forbidden",
            AuthError::NotFound { .. } => "not_found",
            AuthError::Directory(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::SignatureInvalid
            | AuthError::Expired
            | AuthError::InvalidIssuer
            | AuthError::UnknownSubject => StatusCode::UNAUTHORIZED,
            AuthError::Malformed => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
            AuthError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to put in a response body.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Directory(_) => "Internal authentication error".to_string(),
            AuthError::SignatureInvalid | AuthError::Expired | AuthError::InvalidIssuer => {
                GENERIC_TOKEN_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "No token in header"),
            AuthError::Malformed => write!(f, "Token is malformed"),
            AuthError::SignatureInvalid => write!(f, "Token signature is invalid"),
            AuthError::Expired => write!(f, "Token has expired"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::UnknownSubject => write!(f, "Token subject is not a known user"),
            AuthError::Forbidden => write!(f, "User is unauthorized for this request"),
            AuthError::NotFound { resource, id } => write!(f, "{resource} {id} not found"),
            AuthError::Directory(msg) => write!(f, "User directory error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<super::directory::DirectoryError> for AuthError {
    fn from(e: super::directory::DirectoryError) -> Self {
        AuthError::Directory(e.0)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Directory(ref msg) = self {
            tracing::error!(error = %msg, "user directory lookup failed");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.public_message(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_credential_returns_401() {
        let (status, body) = body_of(AuthError::MissingCredential).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_credential");
    }

    #[tokio::test]
    async fn malformed_returns_400() {
        let (status, body) = body_of(AuthError::Malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "malformed_token");
    }

    #[tokio::test]
    async fn signature_and_expiry_are_indistinguishable() {
        let (sig_status, sig_body) = body_of(AuthError::SignatureInvalid).await;
        let (exp_status, exp_body) = body_of(AuthError::Expired).await;
        let (iss_status, iss_body) = body_of(AuthError::InvalidIssuer).await;
        assert_eq!(sig_status, StatusCode::UNAUTHORIZED);
        assert_eq!(sig_status, exp_status);
        assert_eq!(sig_status, iss_status);
        assert_eq!(sig_body, exp_body);
        assert_eq!(sig_body, iss_body);
    }

    #[tokio::test]
    async fn forbidden_is_distinct_from_unauthenticated() {
        let (status, body) = body_of(AuthError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "forbidden");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let (status, body) = body_of(AuthError::not_found("Issue", 9)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Issue 9 not found");
    }

    #[tokio::test]
    async fn directory_failure_hides_details() {
        let (status, body) = body_of(AuthError::Directory("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal authentication error");
    }
}

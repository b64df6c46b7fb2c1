// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request forms and response bodies used by the REST API. Requests arrive as
//! `application/x-www-form-urlencoded` forms; responses are JSON.
//!
//! ## Model Categories
//!
//! - **Users**: registration, login and password change
//! - **Issues**: bug reports with status and severity
//! - **Replies**: comments attached to an issue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::repository::{
    IssueStatus, Severity, StoredIssue, StoredReply, StoredUser, MAX_BODY_LENGTH, MAX_EMAIL_LENGTH,
    MAX_NAME_LENGTH, MAX_TITLE_LENGTH,
};

/// Check a required text field and its length in characters.
fn check_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

/// Form checkbox flag. Accepts `1`, `t`, `T`, `true`, `TRUE`, `True` and
/// their false counterparts. An empty value is false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    match value.as_str() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean {other:?}"
        ))),
    }
}

// =============================================================================
// User Models
// =============================================================================

/// Registration form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterForm {
    /// Role code: `1` QA, `2` Developer
    #[schema(example = 2)]
    pub role: u8,
    #[schema(example = "Dana Developer")]
    pub name: String,
    #[schema(example = "dana@example.com")]
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    /// Validate the form and resolve the role code.
    pub fn validate(&self) -> Result<Role, String> {
        let role = Role::from_code(self.role).ok_or_else(|| format!("unknown role {}", self.role))?;
        check_text("name", &self.name, MAX_NAME_LENGTH)?;
        check_text("email", &self.email, MAX_EMAIL_LENGTH)?;
        if !self.email.contains('@') {
            return Err("email is invalid".to_string());
        }
        Ok(role)
    }
}

/// Login form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Issue a long-lived token
    #[serde(default, deserialize_with = "deserialize_flag")]
    #[schema(value_type = bool)]
    pub remember: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        check_text("email", &self.email, MAX_EMAIL_LENGTH)?;
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

/// Password change form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangePasswordForm {
    #[serde(rename = "old-password")]
    pub old_password: String,
    #[serde(rename = "new-password")]
    pub new_password: String,
    #[serde(rename = "confirm-password")]
    pub confirm_password: String,
}

/// Returned by a successful login.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Token to send back in the `token` header
    pub token: String,
    pub user_id: u64,
    #[schema(value_type = u8, example = 1)]
    pub user_role: Role,
    pub user_email: String,
    pub user_name: String,
}

impl LoginResponse {
    pub fn new(token: String, user: &StoredUser) -> Self {
        Self {
            token,
            user_id: user.id,
            user_role: user.role,
            user_email: user.email.clone(),
            user_name: user.name.clone(),
        }
    }
}

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: u64,
    #[schema(value_type = u8, example = 2)]
    pub role: Role,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDataResponse {
    pub data: UserResponse,
}

// =============================================================================
// Issue Models
// =============================================================================

/// Issue creation form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueCreateForm {
    #[schema(example = "Crash when saving a draft")]
    pub title: String,
    /// Issue body
    pub description: String,
    #[schema(value_type = String, example = "2")]
    pub severity: Severity,
}

impl IssueCreateForm {
    pub fn validate(&self) -> Result<(), String> {
        check_text("title", &self.title, MAX_TITLE_LENGTH)?;
        check_text("description", &self.description, MAX_BODY_LENGTH)
    }
}

/// Issue update form. Every field is replaced.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueUpdateForm {
    pub title: String,
    pub description: String,
    /// `1` open, `0` closed
    #[schema(value_type = String, example = "0")]
    pub status: IssueStatus,
    #[schema(value_type = String, example = "3")]
    pub severity: Severity,
}

impl IssueUpdateForm {
    pub fn validate(&self) -> Result<(), String> {
        check_text("title", &self.title, MAX_TITLE_LENGTH)?;
        check_text("description", &self.description, MAX_BODY_LENGTH)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueSavedResponse {
    pub issue_id: u64,
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueDataResponse {
    pub data: StoredIssue,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueListResponse {
    /// Number of issues in `data`
    pub qty: usize,
    pub data: Vec<StoredIssue>,
}

// =============================================================================
// Reply Models
// =============================================================================

/// Reply creation and update form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReplyForm {
    /// Reply body
    pub description: String,
}

impl ReplyForm {
    pub fn validate(&self) -> Result<(), String> {
        check_text("description", &self.description, MAX_BODY_LENGTH)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplySavedResponse {
    pub reply_id: u64,
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplyListResponse {
    pub qty: usize,
    pub data: Vec<StoredReply>,
}

// =============================================================================
// Common
// =============================================================================

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issue endpoints.
//!
//! Creating and deleting issues is QA-only. Updates are open to the reporter
//! and to QA. Every mutating handler follows the same order: authenticate,
//! parse input, fetch the target (404), check ownership (403), mutate.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    Form, Json,
};

use crate::{
    auth::{Auth, QaOnly, RequireRole},
    error::ApiError,
    models::{
        IssueCreateForm, IssueDataResponse, IssueListResponse, IssueSavedResponse, IssueUpdateForm,
    },
    state::AppState,
    storage::{IssueChanges, IssueRepository, NewIssue, OwnershipCheck, UserRepository},
};

/// File a new issue.
#[utoipa::path(
    post,
    path = "/v1/protected/issue/create",
    tag = "Issues",
    security(("token" = [])),
    request_body(content = IssueCreateForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Issue created", body = IssueSavedResponse),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not QA"),
    )
)]
pub async fn create_issue(
    RequireRole(caller): QaOnly,
    State(state): State<AppState>,
    form: Result<Form<IssueCreateForm>, FormRejection>,
) -> Result<(StatusCode, Json<IssueSavedResponse>), ApiError> {
    let Form(form) = form?;
    form.validate().map_err(ApiError::bad_request)?;

    let issue = IssueRepository::new(&state.store).create(NewIssue {
        user_id: caller.id,
        title: form.title,
        body: form.description,
        severity: form.severity,
    })?;

    tracing::info!(issue_id = issue.id, user_id = caller.id, "Issue created");

    Ok((
        StatusCode::CREATED,
        Json(IssueSavedResponse {
            issue_id: issue.id,
            msg: "Data successfully created.".to_string(),
        }),
    ))
}

/// List all issues.
#[utoipa::path(
    get,
    path = "/v1/protected/issue/index",
    tag = "Issues",
    security(("token" = [])),
    responses(
        (status = 200, description = "All issues", body = IssueListResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_issues(
    Auth(_caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<IssueListResponse>, ApiError> {
    let issues = IssueRepository::new(&state.store).list()?;
    Ok(Json(IssueListResponse {
        qty: issues.len(),
        data: issues,
    }))
}

/// Get one issue.
#[utoipa::path(
    get,
    path = "/v1/protected/issue/show/{id}",
    tag = "Issues",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Issue found", body = IssueDataResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Issue not found"),
    )
)]
pub async fn get_issue(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<IssueDataResponse>, ApiError> {
    let issue = IssueRepository::new(&state.store)
        .find(id)?
        .ok_or_else(|| ApiError::not_found(format!("Issue {id} not found")))?;
    Ok(Json(IssueDataResponse { data: issue }))
}

/// Update an issue. Allowed for the reporter and for QA.
#[utoipa::path(
    patch,
    path = "/v1/protected/issue/update/{id}",
    tag = "Issues",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Issue ID")),
    request_body(content = IssueUpdateForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Issue updated", body = IssueSavedResponse),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the reporter nor QA"),
        (status = 404, description = "Issue not found"),
    )
)]
pub async fn update_issue(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    form: Result<Form<IssueUpdateForm>, FormRejection>,
) -> Result<Json<IssueSavedResponse>, ApiError> {
    let Form(form) = form?;
    form.validate().map_err(ApiError::bad_request)?;

    let issues = IssueRepository::new(&state.store);
    issues.find(id)?.owned_by(id, &caller)?;

    let editor = UserRepository::new(&state.store).get(caller.id)?;
    let issue = issues.update(
        id,
        IssueChanges {
            title: form.title,
            body: form.description,
            status: form.status,
            severity: form.severity,
            updated_by_user_id: editor.id,
            updated_by_user_name: editor.name,
        },
    )?;

    tracing::info!(issue_id = issue.id, user_id = caller.id, "Issue updated");

    Ok(Json(IssueSavedResponse {
        issue_id: issue.id,
        msg: "Data has been updated successfully.".to_string(),
    }))
}

/// Delete an issue and its replies. QA only, and QA may delete any issue.
#[utoipa::path(
    delete,
    path = "/v1/protected/issue/delete/{id}",
    tag = "Issues",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Issue ID")),
    responses(
        (status = 204, description = "Issue deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not QA"),
        (status = 404, description = "Issue not found"),
    )
)]
pub async fn delete_issue(
    RequireRole(caller): QaOnly,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let issues = IssueRepository::new(&state.store);
    issues.find(id)?.owned_by(id, &caller)?;

    let removed_replies = issues.delete(id)?;
    tracing::info!(
        issue_id = id,
        user_id = caller.id,
        removed_replies,
        "Issue deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reply endpoints, nested under `/issue/show/{id}`.
//!
//! Any authenticated user may reply. Editing and deleting a reply is limited
//! to its author and to QA.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    Form, Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ReplyForm, ReplyListResponse, ReplySavedResponse},
    state::AppState,
    storage::{IssueRepository, OwnershipCheck, ReplyRepository, StoredReply},
};

/// Reply to an issue.
#[utoipa::path(
    post,
    path = "/v1/protected/issue/show/{id}/reply",
    tag = "Replies",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Issue ID")),
    request_body(content = ReplyForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Reply added", body = ReplySavedResponse),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Issue not found"),
    )
)]
pub async fn create_reply(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(issue_id): Path<u64>,
    form: Result<Form<ReplyForm>, FormRejection>,
) -> Result<(StatusCode, Json<ReplySavedResponse>), ApiError> {
    let Form(form) = form?;
    form.validate().map_err(ApiError::bad_request)?;

    let reply = ReplyRepository::new(&state.store).create(issue_id, caller.id, form.description)?;
    tracing::info!(issue_id, reply_id = reply.id, user_id = caller.id, "Reply added");

    Ok((
        StatusCode::CREATED,
        Json(ReplySavedResponse {
            reply_id: reply.id,
            msg: "Reply added successfully!".to_string(),
        }),
    ))
}

/// List the replies of an issue, oldest first.
#[utoipa::path(
    get,
    path = "/v1/protected/issue/show/{id}/replies",
    tag = "Replies",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Replies", body = ReplyListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Issue not found"),
    )
)]
pub async fn list_replies(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Path(issue_id): Path<u64>,
) -> Result<Json<ReplyListResponse>, ApiError> {
    if !IssueRepository::new(&state.store).exists(issue_id)? {
        return Err(ApiError::not_found(format!("Issue {issue_id} not found")));
    }

    let replies = ReplyRepository::new(&state.store).list_by_issue(issue_id)?;
    Ok(Json(ReplyListResponse {
        qty: replies.len(),
        data: replies,
    }))
}

/// Edit a reply. Allowed for the author and for QA.
#[utoipa::path(
    patch,
    path = "/v1/protected/issue/show/{id}/update-reply/{reply_id}",
    tag = "Replies",
    security(("token" = [])),
    params(
        ("id" = u64, Path, description = "Issue ID"),
        ("reply_id" = u64, Path, description = "Reply ID"),
    ),
    request_body(content = ReplyForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Reply updated", body = StoredReply),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the author nor QA"),
        (status = 404, description = "Reply not found on this issue"),
    )
)]
pub async fn update_reply(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path((issue_id, reply_id)): Path<(u64, u64)>,
    form: Result<Form<ReplyForm>, FormRejection>,
) -> Result<Json<StoredReply>, ApiError> {
    let Form(form) = form?;
    form.validate().map_err(ApiError::bad_request)?;

    let replies = ReplyRepository::new(&state.store);
    replies
        .find_in_issue(issue_id, reply_id)?
        .owned_by(reply_id, &caller)?;

    let reply = replies.update(reply_id, form.description)?;
    tracing::info!(issue_id, reply_id, user_id = caller.id, "Reply updated");

    Ok(Json(reply))
}

/// Delete a reply. Allowed for the author and for QA.
#[utoipa::path(
    delete,
    path = "/v1/protected/issue/show/{id}/delete-reply/{reply_id}",
    tag = "Replies",
    security(("token" = [])),
    params(
        ("id" = u64, Path, description = "Issue ID"),
        ("reply_id" = u64, Path, description = "Reply ID"),
    ),
    responses(
        (status = 204, description = "Reply deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the author nor QA"),
        (status = 404, description = "Reply not found on this issue"),
    )
)]
pub async fn delete_reply(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path((issue_id, reply_id)): Path<(u64, u64)>,
) -> Result<StatusCode, ApiError> {
    let replies = ReplyRepository::new(&state.store);
    replies
        .find_in_issue(issue_id, reply_id)?
        .owned_by(reply_id, &caller)?;

    replies.delete(reply_id)?;
    tracing::info!(issue_id, reply_id, user_id = caller.id, "Reply deleted");

    Ok(StatusCode::NO_CONTENT)
}

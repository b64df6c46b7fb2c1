// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints: registration, login, profile and password change.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Form, Json,
};

use crate::{
    auth::{
        extractor::extract_token, hash_password, verify_password, Auth, CallerIdentity, Decision,
    },
    error::ApiError,
    models::{
        ChangePasswordForm, LoginForm, LoginResponse, MessageResponse, RegisterForm,
        UserDataResponse,
    },
    state::AppState,
    storage::{NewUser, UserRepository},
};

/// Same message for unknown email and wrong password.
const INVALID_CREDENTIAL: &str = "invalid user credential";

/// A request that already carries a credential may not register or log in.
fn reject_if_logged_in(headers: &HeaderMap) -> Result<(), ApiError> {
    match extract_token(headers) {
        Ok(None) => Ok(()),
        Ok(Some(token)) if token.trim().is_empty() => Ok(()),
        _ => Err(ApiError::forbidden("User is already logged in.")),
    }
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/v1/public/register",
    tag = "Users",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Request already carries a token"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    reject_if_logged_in(&headers)?;
    let Form(form) = form?;
    let role = form.validate().map_err(ApiError::bad_request)?;

    let password_hash = hash_password(&form.password, state.password_cost).await?;
    let user = UserRepository::new(&state.store).create(NewUser {
        role,
        name: form.name.trim().to_string(),
        email: form.email,
        password_hash,
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully.")),
    ))
}

/// Exchange email and password for a token.
#[utoipa::path(
    post,
    path = "/v1/public/login",
    tag = "Users",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Request already carries a token"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    reject_if_logged_in(&headers)?;
    let Form(form) = form?;
    form.validate().map_err(ApiError::bad_request)?;

    let Some(user) = UserRepository::new(&state.store).find_by_email(&form.email)? else {
        tracing::info!("Login rejected: unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIAL));
    };

    if !verify_password(&form.password, &user.password_hash).await? {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIAL));
    }

    let token = state
        .auth
        .issue_for(&user.email, form.remember)
        .map_err(ApiError::internal)?;

    tracing::info!(user_id = user.id, remembered = form.remember, "User logged in");
    Ok(Json(LoginResponse::new(token, &user)))
}

/// Get the current authenticated caller.
#[utoipa::path(
    get,
    path = "/v1/protected/user/me",
    tag = "Users",
    security(("token" = [])),
    responses(
        (status = 200, description = "Caller identity", body = CallerIdentity),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(caller): Auth) -> Json<CallerIdentity> {
    Json(caller)
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/v1/protected/user/{id}",
    tag = "Users",
    security(("token" = [])),
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserDataResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<UserDataResponse>, ApiError> {
    let user = UserRepository::new(&state.store).get(id)?;
    Ok(Json(UserDataResponse { data: user.into() }))
}

/// Change the caller's own password.
#[utoipa::path(
    patch,
    path = "/v1/protected/user/{id}/change-password",
    tag = "Users",
    security(("token" = [])),
    params(("id" = u64, Path, description = "User ID")),
    request_body(content = ChangePasswordForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid form or confirmation mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's account, or old password is wrong"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn change_password(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    form: Result<Form<ChangePasswordForm>, FormRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Form(form) = form?;
    if form.new_password != form.confirm_password {
        return Err(ApiError::bad_request("Failed to confirm password."));
    }

    let users = UserRepository::new(&state.store);
    let user = users.get(id)?;

    Decision::from(caller.id == user.id).into_result()?;

    if !verify_password(&form.old_password, &user.password_hash).await? {
        return Err(ApiError::forbidden("Old password is invalid."));
    }

    let password_hash = hash_password(&form.new_password, state.password_cost).await?;
    users.update_password(user.id, password_hash)?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(Json(MessageResponse::new("Password updated successfully.")))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{extractor::TOKEN_HEADER, middleware::require_auth, CallerIdentity},
    models::{
        ChangePasswordForm, IssueCreateForm, IssueDataResponse, IssueListResponse,
        IssueSavedResponse, IssueUpdateForm, LoginForm, LoginResponse, MessageResponse,
        RegisterForm, ReplyForm, ReplyListResponse, ReplySavedResponse, UserDataResponse,
        UserResponse,
    },
    state::AppState,
    storage::{IssueStatus, Severity, StoredIssue, StoredReply},
};

pub mod health;
pub mod issues;
pub mod replies;
pub mod users;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login));

    let protected_routes = Router::new()
        .route("/user/me", get(users::get_current_user))
        .route("/user/{id}", get(users::get_user))
        .route("/user/{id}/change-password", patch(users::change_password))
        .route("/issue/create", post(issues::create_issue))
        .route("/issue/index", get(issues::list_issues))
        .route("/issue/show/{id}", get(issues::get_issue))
        .route("/issue/update/{id}", patch(issues::update_issue))
        .route("/issue/delete/{id}", delete(issues::delete_issue))
        .route("/issue/show/{id}/reply", post(replies::create_reply))
        .route("/issue/show/{id}/replies", get(replies::list_replies))
        .route(
            "/issue/show/{id}/update-reply/{reply_id}",
            patch(replies::update_reply),
        )
        .route(
            "/issue/show/{id}/delete-reply/{reply_id}",
            delete(replies::delete_reply),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let v1_routes = Router::new()
        .nest("/public", public_routes)
        .nest("/protected", protected_routes);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// Registers the `token` header as the API key scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(TOKEN_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::register,
        users::login,
        users::get_current_user,
        users::get_user,
        users::change_password,
        issues::create_issue,
        issues::list_issues,
        issues::get_issue,
        issues::update_issue,
        issues::delete_issue,
        replies::create_reply,
        replies::list_replies,
        replies::update_reply,
        replies::delete_reply
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            CallerIdentity,
            RegisterForm,
            LoginForm,
            LoginResponse,
            ChangePasswordForm,
            UserResponse,
            UserDataResponse,
            IssueCreateForm,
            IssueUpdateForm,
            IssueSavedResponse,
            IssueDataResponse,
            IssueListResponse,
            IssueStatus,
            Severity,
            StoredIssue,
            StoredReply,
            ReplyForm,
            ReplySavedResponse,
            ReplyListResponse,
            MessageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Registration, login and accounts"),
        (name = "Issues", description = "Issue reporting and triage"),
        (name = "Replies", description = "Discussion on issues")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthValidator, Role, TokenSettings};
    use crate::state::tests::{seed_user, test_state, TEST_PASSWORD, TEST_SECRET};
    use crate::storage::StoredUser;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE},
            HeaderValue, Method, Request, StatusCode,
        },
    };
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        form: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("token", token);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn send_with_header(
        app: &Router,
        uri: &str,
        name: &str,
        value: HeaderValue,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn login(app: &Router, email: &str) -> String {
        let form = format!("email={}&password={}", email.replace('@', "%40"), TEST_PASSWORD.replace(' ', "+"));
        let (status, body) = send(app, Method::POST, "/v1/public/login", None, Some(&form)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    struct Fixture {
        app: Router,
        qa: StoredUser,
        qa_token: String,
        dev: StoredUser,
        dev_token: String,
        other_dev_token: String,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let (state, dir) = test_state();
        let qa = seed_user(&state, "qa@x.com", Role::Qa).await;
        let dev = seed_user(&state, "dev@x.com", Role::Developer).await;
        seed_user(&state, "other@x.com", Role::Developer).await;

        let app = router(state);
        let qa_token = login(&app, "qa@x.com").await;
        let dev_token = login(&app, "dev@x.com").await;
        let other_dev_token = login(&app, "other@x.com").await;

        Fixture {
            app,
            qa,
            qa_token,
            dev,
            dev_token,
            other_dev_token,
            _dir: dir,
        }
    }

    async fn create_issue(f: &Fixture) -> u64 {
        let (status, body) = send(
            &f.app,
            Method::POST,
            "/v1/protected/issue/create",
            Some(&f.qa_token),
            Some("title=Crash&description=Steps&severity=2"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["issueId"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_is_public() {
        let (state, _dir) = test_state();
        let app = router(state);
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn openapi_declares_token_header_scheme() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(doc["components"]["securitySchemes"]["token"]["in"], "header");
        assert_eq!(doc["components"]["securitySchemes"]["token"]["name"], "token");
    }

    #[tokio::test]
    async fn bearer_header_authenticates() {
        let f = fixture().await;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", f.dev_token)).unwrap();

        let (status, body) =
            send_with_header(&f.app, "/v1/protected/user/me", AUTHORIZATION.as_str(), bearer).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["id"], f.dev.id);
    }

    #[tokio::test]
    async fn non_ascii_token_header_is_bad_request() {
        let f = fixture().await;
        let value = HeaderValue::from_bytes(b"\xfftoken").unwrap();

        let (status, body) = send_with_header(&f.app, "/v1/protected/user/me", "token", value).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "malformed_token");
    }

    #[tokio::test]
    async fn login_accepts_numeric_remember_flag() {
        let (state, _dir) = test_state();
        seed_user(&state, "rem@x.com", Role::Developer).await;
        let app = router(state);

        let form = format!(
            "email=rem%40x.com&password={}&remember=1",
            TEST_PASSWORD.replace(' ', "+")
        );
        let (status, body) = send(&app, Method::POST, "/v1/public/login", None, Some(&form)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn login_with_blank_fields_is_bad_request() {
        let (state, _dir) = test_state();
        seed_user(&state, "blank@x.com", Role::Developer).await;
        let app = router(state);

        for form in ["email=&password=pw", "email=blank%40x.com&password="] {
            let (status, _) = send(&app, Method::POST, "/v1/public/login", None, Some(form)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{form}");
        }
    }

    #[tokio::test]
    async fn register_then_login_then_me() {
        let (state, _dir) = test_state();
        let app = router(state);

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/public/register",
            None,
            Some("role=2&name=Dana&email=dana%40x.com&password=pw123"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/public/login",
            None,
            Some("email=DANA%40x.com&password=pw123&remember=true"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userRole"], 2);
        assert_eq!(body["userEmail"], "dana@x.com");
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = send(&app, Method::GET, "/v1/protected/user/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "dana@x.com");
        assert_eq!(me["role"], 2);
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_logged_in_callers() {
        let f = fixture().await;
        let form = "role=1&name=Q&email=qa%40x.com&password=pw";

        let (status, _) = send(&f.app, Method::POST, "/v1/public/register", None, Some(form)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &f.app,
            Method::POST,
            "/v1/public/register",
            Some(&f.dev_token),
            Some("role=1&name=Q&email=new%40x.com&password=pw"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &f.app,
            Method::POST,
            "/v1/public/register",
            None,
            Some("role=7&name=Q&email=new%40x.com&password=pw"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let f = fixture().await;

        let (s1, b1) = send(
            &f.app,
            Method::POST,
            "/v1/public/login",
            None,
            Some("email=nobody%40x.com&password=x"),
        )
        .await;
        let (s2, b2) = send(
            &f.app,
            Method::POST,
            "/v1/public/login",
            None,
            Some("email=dev%40x.com&password=wrong"),
        )
        .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let f = fixture().await;

        let (status, body) = send(&f.app, Method::GET, "/v1/protected/issue/index", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_credential");

        let (status, body) = send(
            &f.app,
            Method::GET,
            "/v1/protected/issue/index",
            Some("garbage"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "malformed_token");
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let (state, _dir) = test_state();
        seed_user(&state, "dev@x.com", Role::Developer).await;
        let foreign = AuthValidator::new(
            TokenSettings::new(format!("{TEST_SECRET}-other"), "AuthService"),
            state.store.clone(),
        );
        let token = foreign.issue_for("dev@x.com", false).unwrap();
        let app = router(state);

        let (status, body) = send(&app, Method::GET, "/v1/protected/user/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_token");
    }

    #[tokio::test]
    async fn expired_token_is_rejected_with_generic_message() {
        let (state, _dir) = test_state();
        seed_user(&state, "dev@x.com", Role::Developer).await;
        let short_lived = AuthValidator::new(
            TokenSettings::new(TEST_SECRET, "AuthService")
                .with_ttls(Duration::seconds(-10), Duration::seconds(-10)),
            state.store.clone(),
        );
        let token = short_lived.issue_for("dev@x.com", false).unwrap();
        let app = router(state);

        let (status, body) = send(&app, Method::GET, "/v1/protected/user/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_token");
        assert_eq!(body["error"], "Token is invalid or expired");
    }

    #[tokio::test]
    async fn developer_cannot_create_issue_even_with_bad_form() {
        let f = fixture().await;

        let (status, _) = send(
            &f.app,
            Method::POST,
            "/v1/protected/issue/create",
            Some(&f.dev_token),
            Some("title=&severity=9"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn qa_creates_and_everyone_reads_issues() {
        let f = fixture().await;
        let id = create_issue(&f).await;

        let (status, body) = send(&f.app, Method::GET, "/v1/protected/issue/index", Some(&f.dev_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["qty"], 1);

        let uri = format!("/v1/protected/issue/show/{id}");
        let (status, body) = send(&f.app, Method::GET, &uri, Some(&f.dev_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["userId"], f.qa.id);
        assert_eq!(body["data"]["status"], "1");

        let (status, _) = send(&f.app, Method::GET, "/v1/protected/issue/show/999", Some(&f.dev_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_checks_existence_before_ownership() {
        let f = fixture().await;
        let form = Some("title=T&description=D&status=0&severity=3");

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            "/v1/protected/issue/update/999",
            Some(&f.dev_token),
            form,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = create_issue(&f).await;
        let uri = format!("/v1/protected/issue/update/{id}");
        let (status, _) = send(&f.app, Method::PATCH, &uri, Some(&f.dev_token), form).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn qa_overrides_ownership_on_update() {
        let (state, _dir) = test_state();
        let qa = seed_user(&state, "qa@x.com", Role::Qa).await;
        let other_qa = seed_user(&state, "qa2@x.com", Role::Qa).await;
        let app = router(state);
        let qa_token = login(&app, "qa@x.com").await;
        let other_token = login(&app, "qa2@x.com").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/v1/protected/issue/create",
            Some(&qa_token),
            Some("title=Crash&description=Steps&severity=1"),
        )
        .await;
        let id = body["issueId"].as_u64().unwrap();

        let uri = format!("/v1/protected/issue/update/{id}");
        let (status, _) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(&other_token),
            Some("title=Fixed&description=Done&status=0&severity=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let show = format!("/v1/protected/issue/show/{id}");
        let (_, body) = send(&app, Method::GET, &show, Some(&qa_token), None).await;
        assert_eq!(body["data"]["userId"], qa.id);
        assert_eq!(body["data"]["status"], "0");
        assert_eq!(body["data"]["updatedByUserId"], other_qa.id);
        assert_eq!(body["data"]["updatedByUserName"], "qa2");
    }

    #[tokio::test]
    async fn delete_issue_is_qa_only_and_cascades() {
        let f = fixture().await;
        let id = create_issue(&f).await;

        let reply_uri = format!("/v1/protected/issue/show/{id}/reply");
        let (status, _) = send(&f.app, Method::POST, &reply_uri, Some(&f.dev_token), Some("description=me+too")).await;
        assert_eq!(status, StatusCode::CREATED);

        let delete_uri = format!("/v1/protected/issue/delete/{id}");
        let (status, _) = send(&f.app, Method::DELETE, &delete_uri, Some(&f.dev_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&f.app, Method::DELETE, "/v1/protected/issue/delete/999", Some(&f.qa_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&f.app, Method::DELETE, &delete_uri, Some(&f.qa_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let list_uri = format!("/v1/protected/issue/show/{id}/replies");
        let (status, _) = send(&f.app, Method::GET, &list_uri, Some(&f.qa_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reply_ownership() {
        let f = fixture().await;
        let id = create_issue(&f).await;

        let (status, body) = send(
            &f.app,
            Method::POST,
            &format!("/v1/protected/issue/show/{id}/reply"),
            Some(&f.dev_token),
            Some("description=first"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let reply_id = body["replyId"].as_u64().unwrap();

        let update_uri = format!("/v1/protected/issue/show/{id}/update-reply/{reply_id}");
        let (status, _) = send(&f.app, Method::PATCH, &update_uri, Some(&f.other_dev_token), Some("description=hijack")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&f.app, Method::PATCH, &update_uri, Some(&f.dev_token), Some("description=edited")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["body"], "edited");
        assert_eq!(body["userId"], f.dev.id);

        let wrong_issue = format!("/v1/protected/issue/show/{}/update-reply/{reply_id}", id + 1);
        let (status, _) = send(&f.app, Method::PATCH, &wrong_issue, Some(&f.dev_token), Some("description=x")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(
            &f.app,
            Method::GET,
            &format!("/v1/protected/issue/show/{id}/replies"),
            Some(&f.other_dev_token),
            None,
        )
        .await;
        assert_eq!(body["qty"], 1);

        let delete_uri = format!("/v1/protected/issue/show/{id}/delete-reply/{reply_id}");
        let (status, _) = send(&f.app, Method::DELETE, &delete_uri, Some(&f.other_dev_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&f.app, Method::DELETE, &delete_uri, Some(&f.qa_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&f.app, Method::DELETE, &delete_uri, Some(&f.qa_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reply_to_missing_issue_is_not_found() {
        let f = fixture().await;
        let (status, _) = send(
            &f.app,
            Method::POST,
            "/v1/protected/issue/show/42/reply",
            Some(&f.dev_token),
            Some("description=hello"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn show_user_hides_password() {
        let f = fixture().await;
        let uri = format!("/v1/protected/user/{}", f.qa.id);
        let (status, body) = send(&f.app, Method::GET, &uri, Some(&f.dev_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "qa@x.com");
        assert!(body["data"].get("passwordHash").is_none());
        assert!(body["data"].get("password_hash").is_none());

        let (status, _) = send(&f.app, Method::GET, "/v1/protected/user/999", Some(&f.dev_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn change_password_flow() {
        let f = fixture().await;
        let uri = format!("/v1/protected/user/{}/change-password", f.dev.id);
        let good_old = format!("old-password={}", TEST_PASSWORD.replace(' ', "+"));

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            &uri,
            Some(&f.dev_token),
            Some(&format!("{good_old}&new-password=a&confirm-password=b")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            &uri,
            Some(&f.other_dev_token),
            Some(&format!("{good_old}&new-password=n&confirm-password=n")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            &uri,
            Some(&f.dev_token),
            Some("old-password=wrong&new-password=n&confirm-password=n"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            &uri,
            Some(&f.dev_token),
            Some(&format!("{good_old}&new-password=n3w&confirm-password=n3w")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &f.app,
            Method::POST,
            "/v1/public/login",
            None,
            Some("email=dev%40x.com&password=n3w"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

//! HTTP routes of the demo service.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use omnikit_errs::axum_ext::{ContextTemplate, request_context_middleware};
use omnikit_errs::{
    Abort, Error, Level, RequestContext, ResponseBuffer, as_error, declare_errors, validation,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::store::{StoreError, UserStore};

declare_errors! {
    pub INVALID_BODY = (StatusCode::BAD_REQUEST, "invalid request body"), level = Level::WARN;
    pub USER_NOT_FOUND = (StatusCode::NOT_FOUND, "user not found"), level = Level::INFO;
    pub USER_EXISTS = (StatusCode::CONFLICT, "user already exists"), level = Level::WARN;
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<UserStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: UserStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

pub fn router(state: AppState, template: ContextTemplate) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            template,
            request_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

/// Maps store failures to error kinds; anything unmapped becomes unknown.
fn classify(ctx: &RequestContext, err: StoreError) -> Error {
    match err {
        StoreError::NotFound(id) => USER_NOT_FOUND.new_error(ctx).err(&err).log(|r| {
            r.uint("user_id", id);
        }),
        StoreError::DuplicateEmail(_) => USER_EXISTS.new_error(ctx).err(&err),
        other @ StoreError::Full { .. } => as_error(ctx, other),
    }
}

async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> Response {
    let mut w = ResponseBuffer::default();
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return INVALID_BODY.new_error(&ctx).err(&rejection).into_response(),
    };

    let fields = [("name", req.name.as_str()), ("email", req.email.as_str())];
    if validation::check_empty_string_fields(&ctx, &fields).abort(&mut w) {
        return w.into_response();
    }

    match state.store.insert(&req.name, &req.email) {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user created");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(e) => {
            classify(&ctx, e).abort(&mut w);
            w.into_response()
        }
    }
}

async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<u64>,
) -> Response {
    match state.store.get(id) {
        Ok(user) => Json(user).into_response(),
        Err(e) => classify(&ctx, e).into_response(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use http_body_util::BodyExt;
    use omnikit_errs::{ErrsConfig, FieldValue, JsonMode, MemorySink};
    use tower::ServiceExt;

    use super::*;

    struct Harness {
        app: Router,
        sink: Arc<MemorySink>,
    }

    fn harness(capacity: usize, json: JsonMode) -> Harness {
        let sink = Arc::new(MemorySink::new());
        let cfg = ErrsConfig {
            json,
            ..ErrsConfig::default()
        };
        let template =
            ContextTemplate::new(RequestContext::new().with_sink(sink.clone()), &cfg).unwrap();
        let app = router(AppState::new(UserStore::new(capacity)), template);
        Harness { app, sink }
    }

    async fn call(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let req = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-request-id", "test-req")
            .body(Body::from(body.to_owned()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn missing_fields_are_listed() {
        let h = harness(10, JsonMode::Compat);
        let (status, body) = call(&h.app, "POST", "/users", r#"{"name":""}"#).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            r#"{"message":"missing required fields: name, email","status":422}"#
        );
        let records = h.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "request aborted: missing required fields");
        assert_eq!(
            records[0].record.field("request_id"),
            Some(&FieldValue::Str("test-req".to_owned()))
        );
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let h = harness(10, JsonMode::Compat);
        let (status, body) = call(
            &h.app,
            "POST",
            "/users",
            r#"{"name":"ada","email":"ada@example.com"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["id"], 1);

        let (status, body) = call(&h.app, "GET", "/users/1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ada@example.com"));
        assert!(h.sink.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let h = harness(10, JsonMode::Compat);
        let (status, body) = call(&h.app, "GET", "/users/42", "").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            r#"{"message":"user not found: no user with id 42","status":404}"#
        );
        let records = h.sink.records();
        assert_eq!(records[0].record.level(), Level::INFO);
        assert_eq!(records[0].record.field("user_id"), Some(&FieldValue::Uint(42)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let h = harness(10, JsonMode::Compat);
        let body = r#"{"name":"ada","email":"ada@example.com"}"#;
        call(&h.app, "POST", "/users", body).await;
        let (status, body) = call(&h.app, "POST", "/users", body).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            r#"{"message":"user already exists: email ada@example.com is already registered","status":409}"#
        );
    }

    #[tokio::test]
    async fn unmapped_store_failure_is_unknown() {
        let h = harness(0, JsonMode::Compat);
        let (status, body) = call(
            &h.app,
            "POST",
            "/users",
            r#"{"name":"ada","email":"ada@example.com"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            r#"{"message":"unknown error: user store is full (capacity 0)","status":500}"#
        );
        assert_eq!(h.sink.records()[0].message, "request aborted: unknown error");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let h = harness(10, JsonMode::Escaped);
        let (status, body) = call(&h.app, "POST", "/users", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["status"], 400);
        assert!(
            parsed["message"]
                .as_str()
                .unwrap()
                .starts_with("invalid request body: ")
        );
    }
}

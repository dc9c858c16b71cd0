//! Axum integration: error responses, the request-context extractor and the
//! middleware that builds one context per request.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{self, HeaderName, HeaderValue, InvalidHeaderName};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use uuid::Uuid;

use crate::abort::ResponseBuffer;
use crate::config::ErrsConfig;
use crate::context::RequestContext;
use crate::error::Error;

/// Content type of error bodies.
pub const APPLICATION_JSON: &str = "application/json";

impl IntoResponse for ResponseBuffer {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        let mut resp = Response::new(Body::from(body));
        if let Some(status) = status {
            *resp.status_mut() = status;
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(APPLICATION_JSON),
            );
        }
        resp
    }
}

/// Aborts with this error and turns the written status and body into a response.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let mut w = ResponseBuffer::default();
        self.abort(&mut w);
        w.into_response()
    }
}

/// Extracts the context installed by [`request_context_middleware`], or a
/// default `tracing`-backed context when the middleware is not mounted.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Base context and request-id header used to build each request's context.
#[derive(Debug, Clone)]
pub struct ContextTemplate {
    base: RequestContext,
    request_id_header: HeaderName,
}

impl ContextTemplate {
    /// # Errors
    /// Returns `InvalidHeaderName` if `cfg.request_id_header` is not a valid
    /// header name.
    pub fn new(base: RequestContext, cfg: &ErrsConfig) -> Result<Self, InvalidHeaderName> {
        let request_id_header = HeaderName::from_bytes(cfg.request_id_header.as_bytes())?;
        Ok(Self {
            base: base.with_json_mode(cfg.json),
            request_id_header,
        })
    }

    #[must_use]
    pub fn request_id_header(&self) -> &HeaderName {
        &self.request_id_header
    }

    /// Context for one request: the base context with a child cancellation
    /// token and the given (or a generated) request id.
    #[must_use]
    pub fn for_request(&self, request_id: Option<&str>) -> RequestContext {
        let id = request_id
            .filter(|id| !id.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);
        self.base
            .clone()
            .with_cancellation(self.base.cancellation().child_token())
            .with_request_id(id)
    }
}

/// Installs a per-request [`RequestContext`] into the request extensions.
///
/// Mount with `axum::middleware::from_fn_with_state(template, request_context_middleware)`.
pub async fn request_context_middleware(
    State(template): State<ContextTemplate>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = {
        let header = req
            .headers()
            .get(template.request_id_header())
            .and_then(|v| v.to_str().ok());
        template.for_request(header)
    };
    if let Some(id) = ctx.request_id() {
        tracing::debug!(request_id = id, "request context attached");
    }
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::JsonMode;
    use crate::log::MemorySink;
    use crate::{Abort, ErrorFactory, validation};

    fn not_found() -> ErrorFactory {
        ErrorFactory::new(StatusCode::NOT_FOUND, "resource not found")
    }

    async fn body_string(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn error_into_response_sets_status_body_and_content_type() {
        let err = not_found().new_error(&RequestContext::new()).err(&"user 7");
        let resp = err.into_response();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            APPLICATION_JSON
        );
        assert_eq!(
            body_string(resp).await,
            r#"{"message":"resource not found: user 7","status":404}"#
        );
    }

    #[test]
    fn empty_buffer_is_plain_ok() {
        let resp = ResponseBuffer::default().into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn template_rejects_bad_header_name() {
        let cfg = ErrsConfig {
            request_id_header: "bad header".to_owned(),
            ..ErrsConfig::default()
        };
        assert!(ContextTemplate::new(RequestContext::new(), &cfg).is_err());
    }

    #[test]
    fn template_generates_missing_request_ids() {
        let template = ContextTemplate::new(RequestContext::new(), &ErrsConfig::default()).unwrap();
        let a = template.for_request(None);
        let b = template.for_request(Some(""));
        assert!(a.request_id().is_some());
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(template.for_request(Some("abc")).request_id(), Some("abc"));
    }

    #[tokio::test]
    async fn middleware_context_reaches_handlers() {
        let sink = Arc::new(MemorySink::new());
        let cfg = ErrsConfig {
            json: JsonMode::Escaped,
            ..ErrsConfig::default()
        };
        let template =
            ContextTemplate::new(RequestContext::new().with_sink(sink.clone()), &cfg).unwrap();

        let app = Router::new()
            .route(
                "/users",
                get(|ctx: RequestContext| async move {
                    let mut w = ResponseBuffer::default();
                    if validation::check_empty_string_fields(&ctx, &[("name", "")]).abort(&mut w) {
                        return w.into_response();
                    }
                    "ok".into_response()
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                template,
                request_context_middleware,
            ));

        let req = http::Request::builder()
            .uri("/users")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_string(resp).await,
            r#"{"message":"missing required fields: name","status":422}"#
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].record.field("request_id"),
            Some(&crate::log::FieldValue::Str("req-123".to_owned()))
        );
    }
}

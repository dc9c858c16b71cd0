//! Request-scoped context carried into every error instance.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{ErrsConfig, JsonMode};
use crate::log::{LogSink, TracingSink};

/// Per-request carrier of the log sink, cancellation token, request id and
/// wire encoding mode.
///
/// Cheap to clone; all clones share the same sink and token. The error
/// pipeline only reads it and never reacts to cancellation.
#[derive(Clone)]
pub struct RequestContext {
    sink: Arc<dyn LogSink>,
    cancellation: CancellationToken,
    request_id: Option<Arc<str>>,
    json: JsonMode,
}

impl RequestContext {
    /// Context logging through `tracing`, with a fresh token and no request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(TracingSink),
            cancellation: CancellationToken::new(),
            request_id: None,
            json: JsonMode::default(),
        }
    }

    #[must_use]
    pub fn from_config(cfg: &ErrsConfig) -> Self {
        Self::new().with_json_mode(cfg.json)
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_json_mode(mut self, json: JsonMode) -> Self {
        self.json = json;
        self
    }

    #[inline]
    #[must_use]
    pub fn sink(&self) -> &dyn LogSink {
        &*self.sink
    }

    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn json_mode(&self) -> JsonMode {
        self.json
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("json", &self.json)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn config_sets_json_mode() {
        let cfg = ErrsConfig {
            json: JsonMode::Escaped,
            ..ErrsConfig::default()
        };
        let ctx = RequestContext::from_config(&cfg);
        assert_eq!(ctx.json_mode(), JsonMode::Escaped);
        assert_eq!(ctx.request_id(), None);
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = RequestContext::new().with_request_id("req-1");
        let clone = ctx.clone();
        ctx.cancellation().cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.request_id(), Some("req-1"));
    }
}

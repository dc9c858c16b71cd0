//! Classified HTTP errors for request handlers.
//!
//! A service declares its error kinds once, as [`ErrorFactory`] statics
//! binding a status code to a canonical message. Handlers mint an [`Error`]
//! from a kind, annotate it with request-specific detail, and either match it
//! against kinds (annotations never affect matching) or [`abort`](Error::abort)
//! the request with it: the status and a `{"message","status"}` JSON body are
//! written, then one structured log record is emitted.
//!
//! - Canonical messages are interned ([`Message`]), so kind matching is a
//!   handle comparison.
//! - [`as_error`] classifies anything else as [`UNKNOWN`] at the response
//!   boundary.
//! - With the `axum` feature, errors are responses and the
//!   [`RequestContext`] is an extractor.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod abort;
#[cfg(feature = "axum")]
pub mod axum_ext;
pub mod coerce;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
mod json;
pub mod log;
pub mod message;
pub mod validation;

pub use abort::{ABORT_LOG_PREFIX, Abort, ResponseBuffer, ResponseSink};
pub use coerce::{UNKNOWN, as_error};
pub use config::{ErrsConfig, JsonMode};
pub use context::RequestContext;
pub use error::{AsClassified, Error};
pub use factory::ErrorFactory;
pub use log::{CapturedRecord, FieldValue, LogRecord, LogSink, MemorySink, TracingSink};
pub use message::Message;

pub use http::StatusCode;
pub use tracing::Level;

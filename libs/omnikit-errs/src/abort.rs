//! Terminating a request with a classified error.
//!
//! Aborting writes the status and JSON body to a [`ResponseSink`], then emits
//! the instance's log record. The instance is consumed, so a request can only
//! be aborted once per instance.
//!
//! Absent errors abort nothing, which keeps call sites uniform:
//!
//! ```
//! use omnikit_errs::{Abort, RequestContext, ResponseBuffer, validation};
//!
//! let ctx = RequestContext::new();
//! let mut w = ResponseBuffer::default();
//! if validation::check_empty_string_fields(&ctx, &[("name", "ada")]).abort(&mut w) {
//!     unreachable!("no empty fields");
//! }
//! assert!(w.status().is_none());
//! ```

use std::io;

use http::StatusCode;

use crate::error::Error;
use crate::log::{LogSink, REQUEST_ID_FIELD, STATUS_FIELD, TracingSink};

/// Prefix of the message of every record emitted by [`Error::abort`].
pub const ABORT_LOG_PREFIX: &str = "request aborted: ";

/// Anything that accepts an HTTP status and a body.
pub trait ResponseSink {
    fn write_status(&mut self, status: StatusCode);

    /// # Errors
    /// Returns the underlying I/O error if the body could not be written.
    fn write_body(&mut self, body: &[u8]) -> io::Result<()>;
}

/// In-memory response: the last written status plus the accumulated body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl ResponseBuffer {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (Option<StatusCode>, Vec<u8>) {
        (self.status, self.body)
    }
}

impl ResponseSink for ResponseBuffer {
    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(body);
        Ok(())
    }
}

impl ResponseSink for http::Response<Vec<u8>> {
    fn write_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.body_mut().extend_from_slice(body);
        Ok(())
    }
}

impl Error {
    /// Writes status and body to `w`, then emits the log record.
    ///
    /// The record's message is [`ABORT_LOG_PREFIX`] followed by the canonical
    /// message only; annotations go to the body, not to the log line. A
    /// `status` field is added, and `request_id` when the context has one.
    /// A failed body write is reported through `tracing` and does not stop
    /// the log emission. Always returns `true`.
    pub fn abort<W: ResponseSink + ?Sized>(mut self, w: &mut W) -> bool {
        w.write_status(self.status());
        let body = self.to_json();
        if let Err(e) = w.write_body(&body) {
            tracing::warn!(error = %e, status = self.status().as_u16(), "failed to write error body");
        }

        let status = self.status().as_u16();
        let request_id = self
            .context()
            .and_then(|c| c.request_id().map(str::to_owned));
        let record = self.record_mut();
        record.uint(STATUS_FIELD, u64::from(status));
        if let Some(id) = request_id {
            record.str(REQUEST_ID_FIELD, id);
        }

        let message = format!("{ABORT_LOG_PREFIX}{}", self.canonical());
        match self.context() {
            Some(ctx) => ctx.sink().emit(self.record(), &message),
            None => TracingSink.emit(self.record(), &message),
        }
        true
    }
}

/// Abort for values that may or may not hold an error.
pub trait Abort {
    /// Aborts with the held error, if any. Returns whether a response was
    /// written.
    fn abort<W: ResponseSink + ?Sized>(self, w: &mut W) -> bool;
}

impl Abort for Option<Error> {
    fn abort<W: ResponseSink + ?Sized>(self, w: &mut W) -> bool {
        match self {
            Some(err) => err.abort(w),
            None => false,
        }
    }
}

impl<T> Abort for Result<T, Error> {
    fn abort<W: ResponseSink + ?Sized>(self, w: &mut W) -> bool {
        self.err().abort(w)
    }
}

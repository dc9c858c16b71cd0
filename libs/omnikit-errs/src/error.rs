//! Classified error instances.
//!
//! An [`Error`] is minted by an [`ErrorFactory`] for one request. It carries
//! the kind's status and canonical message, an append-only list of
//! annotations, and the log record that [`Error::abort`] eventually emits.
//!
//! Identity is the `(status, message)` pair. Annotations and log fields never
//! take part in comparisons, so an annotated instance still matches its kind:
//!
//! ```
//! use omnikit_errs::{ErrorFactory, RequestContext, StatusCode};
//!
//! let missing = ErrorFactory::new(StatusCode::UNPROCESSABLE_ENTITY, "missing required fields");
//! let ctx = RequestContext::new();
//!
//! let err = missing.new_error(&ctx).strs(["name"]).strs(["age"]);
//! assert_eq!(err.message(), "missing required fields: name: age");
//! assert!(missing.is(&err));
//! ```

use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::Level;

use crate::context::RequestContext;
use crate::factory::ErrorFactory;
use crate::log::LogRecord;
use crate::message::Message;

const ANNOTATION_SEPARATOR: &str = ": ";

#[derive(Clone)]
pub struct Error {
    status: StatusCode,
    message: Message,
    annotations: Vec<String>,
    record: LogRecord,
    ctx: Option<RequestContext>,
}

impl Error {
    pub(crate) fn new(
        status: StatusCode,
        message: Message,
        level: Level,
        ctx: Option<RequestContext>,
    ) -> Self {
        Self {
            status,
            message,
            annotations: Vec::new(),
            record: LogRecord::new(level),
            ctx,
        }
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The kind's canonical message, without annotations.
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &Message {
        &self.message
    }

    #[must_use]
    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    /// The open log record; emitted by [`abort`](Self::abort).
    #[must_use]
    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    #[must_use]
    pub fn context(&self) -> Option<&RequestContext> {
        self.ctx.as_ref()
    }

    /// Appends the text of `err` as one annotation.
    #[must_use]
    pub fn err<E: fmt::Display + ?Sized>(self, err: &E) -> Self {
        self.annotate(err.to_string())
    }

    /// Appends `values` joined by `", "` as one annotation.
    #[must_use]
    pub fn strs<I>(self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut joined = String::new();
        for (i, v) in values.into_iter().enumerate() {
            if i > 0 {
                joined.push_str(", ");
            }
            joined.push_str(v.as_ref());
        }
        self.annotate(joined)
    }

    /// Appends `text` verbatim as one annotation.
    #[must_use]
    pub fn annotate(mut self, text: impl Into<String>) -> Self {
        self.annotations.push(text.into());
        self
    }

    /// Lets `customize` add fields to the open log record. Nothing is emitted.
    #[must_use]
    pub fn log<F>(mut self, customize: F) -> Self
    where
        F: FnOnce(&mut LogRecord),
    {
        customize(&mut self.record);
        self
    }

    /// Canonical message followed by each annotation, each prefixed by `": "`.
    #[must_use]
    pub fn message(&self) -> String {
        let len = self.message.len()
            + self
                .annotations
                .iter()
                .map(|a| a.len() + ANNOTATION_SEPARATOR.len())
                .sum::<usize>();
        let mut out = String::with_capacity(len);
        out.push_str(self.message.as_str());
        for a in &self.annotations {
            out.push_str(ANNOTATION_SEPARATOR);
            out.push_str(a);
        }
        out
    }

    /// Whether `other` is, or wraps, an error of the same kind as `self`.
    #[must_use]
    pub fn is<E: AsClassified + ?Sized>(&self, other: &E) -> bool {
        other.as_classified().is_some_and(|o| self.same_kind(o))
    }

    #[must_use]
    pub fn is_not<E: AsClassified + ?Sized>(&self, other: &E) -> bool {
        !self.is(other)
    }

    fn same_kind(&self, other: &Self) -> bool {
        self.status == other.status && self.message == other.message
    }

    pub(crate) fn adopt(&mut self, ctx: &RequestContext) {
        if self.ctx.is_none() {
            self.ctx = Some(ctx.clone());
        }
    }

    pub(crate) fn record_mut(&mut self) -> &mut LogRecord {
        &mut self.record
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status code: {}, message: {}",
            self.status.as_u16(),
            self.message()
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("status", &self.status.as_u16())
            .field("message", &self.message.as_str())
            .field("annotations", &self.annotations)
            .field("level", &self.record.level())
            .finish_non_exhaustive()
    }
}

impl StdError for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.same_kind(other)
    }
}

impl Eq for Error {}

impl PartialEq<ErrorFactory> for Error {
    fn eq(&self, other: &ErrorFactory) -> bool {
        self.status == other.status() && self.message == *other.message()
    }
}

impl PartialEq<Error> for ErrorFactory {
    fn eq(&self, other: &Error) -> bool {
        other == self
    }
}

/// Structured form of the wire body, with the message properly escaped.
impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Error", 2)?;
        s.serialize_field("message", &self.message())?;
        s.serialize_field("status", &self.status.as_u16())?;
        s.end()
    }
}

/// Values that may be, or may wrap, a classified [`Error`].
///
/// Implemented for every `std::error::Error` by walking its `source()` chain,
/// and for `dyn Error` trait objects. An `anyhow::Error` is inspected through
/// its trait object: `factory.is(&*err)`.
pub trait AsClassified {
    fn as_classified(&self) -> Option<&Error>;
}

fn find_in_chain<'a>(mut cur: Option<&'a (dyn StdError + 'static)>) -> Option<&'a Error> {
    while let Some(e) = cur {
        if let Some(found) = e.downcast_ref::<Error>() {
            return Some(found);
        }
        cur = e.source();
    }
    None
}

impl<E: StdError + 'static> AsClassified for E {
    fn as_classified(&self) -> Option<&Error> {
        find_in_chain(Some(self))
    }
}

impl AsClassified for dyn StdError + 'static {
    fn as_classified(&self) -> Option<&Error> {
        find_in_chain(Some(self))
    }
}

impl AsClassified for dyn StdError + Send + Sync + 'static {
    fn as_classified(&self) -> Option<&Error> {
        find_in_chain(Some(self))
    }
}

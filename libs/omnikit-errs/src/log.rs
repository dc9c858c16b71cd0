//! Structured log records and the sinks they are emitted to.
//!
//! An [`Error`](crate::Error) opens a [`LogRecord`] when it is minted and
//! emits it once, when the request is aborted. Callers add fields through
//! [`Error::log`](crate::Error::log); the sink found in the request context
//! decides where the record goes.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;

/// Key of the HTTP status field added by [`Error::abort`](crate::Error::abort).
pub const STATUS_FIELD: &str = "status";
/// Key of the request id field added by [`Error::abort`](crate::Error::abort).
pub const REQUEST_ID_FIELD: &str = "request_id";

/// Value of a structured log field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// An open structured log record: a severity plus ordered key/value fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    level: Level,
    fields: Vec<(Cow<'static, str>, FieldValue)>,
}

impl LogRecord {
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            fields: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn fields(&self) -> &[(Cow<'static, str>, FieldValue)] {
        &self.fields
    }

    /// Returns the first value recorded under `key`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn str(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.fields.push((key.into(), FieldValue::Str(value.into())));
        self
    }

    pub fn int(&mut self, key: impl Into<Cow<'static, str>>, value: i64) -> &mut Self {
        self.fields.push((key.into(), FieldValue::Int(value)));
        self
    }

    pub fn uint(&mut self, key: impl Into<Cow<'static, str>>, value: u64) -> &mut Self {
        self.fields.push((key.into(), FieldValue::Uint(value)));
        self
    }

    pub fn bool(&mut self, key: impl Into<Cow<'static, str>>, value: bool) -> &mut Self {
        self.fields.push((key.into(), FieldValue::Bool(value)));
        self
    }

    /// Renders the fields as `key=value` pairs separated by spaces.
    #[must_use]
    pub fn render_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Destination for emitted log records.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord, message: &str);
}

/// Forwards records to the active `tracing` subscriber at the record's level.
///
/// `status` (unsigned) and `request_id` (string) become event fields of their
/// own. Every other field is rendered as `key=value` pairs into one `fields`
/// value, which is omitted when there are none.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

struct EventFields<'a> {
    status: Option<u64>,
    request_id: Option<&'a str>,
    extras: Option<String>,
}

impl<'a> EventFields<'a> {
    fn split(record: &'a LogRecord) -> Self {
        let mut status = None;
        let mut request_id = None;
        let mut extras = Vec::new();
        for (key, value) in record.fields() {
            match (&**key, value) {
                (STATUS_FIELD, FieldValue::Uint(v)) if status.is_none() => status = Some(*v),
                (REQUEST_ID_FIELD, FieldValue::Str(id)) if request_id.is_none() => {
                    request_id = Some(id.as_str());
                }
                _ => extras.push(format!("{key}={value}")),
            }
        }
        Self {
            status,
            request_id,
            extras: (!extras.is_empty()).then(|| extras.join(" ")),
        }
    }
}

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord, message: &str) {
        let EventFields {
            status,
            request_id,
            extras,
        } = EventFields::split(record);
        let fields = extras.as_deref();
        match record.level() {
            Level::ERROR => tracing::error!(status, request_id, fields, "{message}"),
            Level::WARN => tracing::warn!(status, request_id, fields, "{message}"),
            Level::INFO => tracing::info!(status, request_id, fields, "{message}"),
            Level::DEBUG => tracing::debug!(status, request_id, fields, "{message}"),
            _ => tracing::trace!(status, request_id, fields, "{message}"),
        }
    }
}

/// A record captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub message: String,
    pub record: LogRecord,
}

/// Keeps emitted records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord, message: &str) {
        self.records.lock().push(CapturedRecord {
            message: message.to_owned(),
            record: record.clone(),
        });
    }
}

//! Error kinds: immutable templates that mint [`Error`] instances.

use http::StatusCode;
use tracing::Level;

use crate::context::RequestContext;
use crate::error::{AsClassified, Error};
use crate::message::Message;

/// Immutable template for one error kind.
///
/// Two factories built from the same status and message text are
/// interchangeable: matching compares `(status, message)`, never the factory
/// object itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFactory {
    status: StatusCode,
    message: Message,
    level: Level,
}

impl ErrorFactory {
    /// Declares an error kind logged at `ERROR` unless overridden with
    /// [`with_level`](Self::with_level).
    #[must_use]
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: Message::intern(message),
            level: Level::ERROR,
        }
    }

    /// Declares an error kind from a raw status code.
    ///
    /// # Panics
    /// Panics if `code` is not a valid HTTP status (100..=999). An invalid
    /// code is a bug in the declaring code, not a runtime condition.
    #[must_use]
    pub fn from_u16(code: u16, message: &str) -> Self {
        match StatusCode::from_u16(code) {
            Ok(status) => Self::new(status, message),
            Err(e) => panic!("invalid status code {code} for error kind '{message}': {e}"),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &Message {
        &self.message
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Mints an instance bound to `ctx`, with its log record open at this
    /// kind's level.
    #[must_use]
    pub fn new_error(&self, ctx: &RequestContext) -> Error {
        Error::new(self.status, self.message.clone(), self.level, Some(ctx.clone()))
    }

    /// Mints an instance with no request context. [`as_error`](crate::as_error)
    /// adopts the caller's context when it later sees this instance.
    #[must_use]
    pub fn detached(&self) -> Error {
        Error::new(self.status, self.message.clone(), self.level, None)
    }

    /// Whether `err` is, or wraps, an instance of this kind.
    #[must_use]
    pub fn is<E: AsClassified + ?Sized>(&self, err: &E) -> bool {
        err.as_classified()
            .is_some_and(|e| e.status() == self.status && *e.canonical() == self.message)
    }

    #[must_use]
    pub fn is_not<E: AsClassified + ?Sized>(&self, err: &E) -> bool {
        !self.is(err)
    }
}

/// Declares process-wide error kinds as lazily built statics.
///
/// ```
/// use omnikit_errs::{declare_errors, Level, StatusCode};
///
/// declare_errors! {
///     /// The caller is not authenticated.
///     pub UNAUTHORIZED = (StatusCode::UNAUTHORIZED, "unauthorized"), level = Level::WARN;
///     pub NOT_FOUND = (StatusCode::NOT_FOUND, "resource not found");
/// }
///
/// assert_eq!(UNAUTHORIZED.status(), StatusCode::UNAUTHORIZED);
/// assert_eq!(NOT_FOUND.message().as_str(), "resource not found");
/// ```
#[macro_export]
macro_rules! declare_errors {
    ($(
        $(#[$meta:meta])*
        $vis:vis $name:ident = ($status:expr, $message:expr) $(, level = $level:expr)? ;
    )*) => {
        $(
            $(#[$meta])*
            $vis static $name: ::std::sync::LazyLock<$crate::ErrorFactory> =
                ::std::sync::LazyLock::new(|| {
                    $crate::ErrorFactory::new($status, $message)
                        $(.with_level($level))?
                });
        )*
    };
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    declare_errors! {
        NOT_FOUND = (StatusCode::NOT_FOUND, "resource not found");
        UNAUTHORIZED = (StatusCode::UNAUTHORIZED, "unauthorized"), level = Level::WARN;
    }

    #[test]
    fn default_level_is_error() {
        assert_eq!(NOT_FOUND.level(), Level::ERROR);
        assert_eq!(UNAUTHORIZED.level(), Level::WARN);
    }

    #[test]
    fn independently_declared_factories_match() {
        let local = ErrorFactory::new(StatusCode::NOT_FOUND, "resource not found");
        let ctx = RequestContext::new();

        assert_eq!(local, *NOT_FOUND);
        assert!(local.is(&NOT_FOUND.new_error(&ctx)));
        assert!(NOT_FOUND.is(&local.new_error(&ctx)));
    }

    #[test]
    fn same_message_different_status_does_not_match() {
        let gone = ErrorFactory::new(StatusCode::GONE, "resource not found");
        let err = gone.new_error(&RequestContext::new());
        assert!(NOT_FOUND.is_not(&err));
        assert!(gone.is(&err));
    }

    #[test]
    fn from_u16_accepts_valid_codes() {
        let f = ErrorFactory::from_u16(422, "missing required fields");
        assert_eq!(f.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    #[should_panic(expected = "invalid status code")]
    fn from_u16_panics_on_invalid_code() {
        let _factory = ErrorFactory::from_u16(42, "bogus");
    }

    #[test]
    fn detached_instance_has_no_context() {
        let err = NOT_FOUND.detached();
        assert!(err.context().is_none());
        assert!(NOT_FOUND.is(&err));
    }
}

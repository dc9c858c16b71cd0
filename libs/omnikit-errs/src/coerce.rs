//! Classification of arbitrary errors at the response boundary.

use http::StatusCode;

use crate::context::RequestContext;
use crate::error::Error;

crate::declare_errors! {
    /// Kind assigned to every error that was never classified.
    pub UNKNOWN = (StatusCode::INTERNAL_SERVER_ERROR, "unknown error");
}

/// Turns any error into a classified [`Error`].
///
/// An instance found in `err` (directly, under `anyhow` context, or along the
/// `source()` chain) is returned as is, adopting `ctx` if it was minted
/// without one. Anything else becomes an [`UNKNOWN`] instance annotated with
/// the text of `err` itself; its sources are not appended.
pub fn as_error<E>(ctx: &RequestContext, err: E) -> Error
where
    E: Into<anyhow::Error>,
{
    let err: anyhow::Error = err.into();
    let mut classified = match err.downcast::<Error>() {
        Ok(found) => found,
        Err(err) => match err.chain().find_map(|e| e.downcast_ref::<Error>()) {
            Some(found) => found.clone(),
            None => return UNKNOWN.new_error(ctx).err(&err),
        },
    };
    classified.adopt(ctx);
    classified
}

//! Request validation helpers built on the error kinds.

use http::StatusCode;

use crate::context::RequestContext;
use crate::error::Error;

crate::declare_errors! {
    pub MISSING_REQUIRED_FIELD = (StatusCode::UNPROCESSABLE_ENTITY, "missing required fields");
}

/// Checks `(name, value)` pairs for empty values.
///
/// Returns a [`MISSING_REQUIRED_FIELD`] error whose single annotation lists
/// every empty field, in input order, joined by `", "`; `None` when all
/// fields are set.
#[must_use]
pub fn check_empty_string_fields(ctx: &RequestContext, fields: &[(&str, &str)]) -> Option<Error> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        return None;
    }
    Some(MISSING_REQUIRED_FIELD.new_error(ctx).strs(missing))
}

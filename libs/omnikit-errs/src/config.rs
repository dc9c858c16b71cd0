//! Configuration types for the error pipeline.
//!
//! Applications usually embed [`ErrsConfig`] in their own config tree and load
//! it through `figment`; every field has a default so an absent section is valid.

use serde::{Deserialize, Serialize};

/// Header consulted for the request id when none is configured.
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// How error bodies are rendered on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonMode {
    /// Message text is written verbatim between the quotes.
    ///
    /// Byte-compatible with deployed clients. A message containing `"` or a
    /// control character yields invalid JSON.
    #[default]
    Compat,
    /// Message text is escaped as a proper JSON string.
    Escaped,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrsConfig {
    pub json: JsonMode,
    pub request_id_header: String,
}

impl Default for ErrsConfig {
    fn default() -> Self {
        Self {
            json: JsonMode::Compat,
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_owned(),
        }
    }
}

//! Wire encoding of error bodies: `{"message":"...","status":NNN}`.

use serde::Serialize;

use crate::config::JsonMode;
use crate::error::Error;

const PREFIX: &str = r#"{"message":""#;
const MIDDLE: &str = r#"","status":"#;
const SUFFIX: &str = "}";

#[derive(Serialize)]
struct WireBody<'a> {
    message: &'a str,
    status: u16,
}

impl Error {
    /// Encodes the body using the request context's mode, or
    /// [`JsonMode::Compat`] when the instance has no context.
    #[must_use]
    pub fn to_json(&self) -> Vec<u8> {
        let mode = self
            .context()
            .map_or(JsonMode::Compat, crate::RequestContext::json_mode);
        self.to_json_with(mode)
    }

    #[must_use]
    pub fn to_json_with(&self, mode: JsonMode) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_json(mode, &mut buf);
        buf
    }

    /// Appends the encoded body to `buf`.
    pub fn write_json(&self, mode: JsonMode, buf: &mut Vec<u8>) {
        let message = self.message();
        let status = self.status().as_u16();
        match mode {
            JsonMode::Compat => {
                // No escaping: deployed clients depend on these exact bytes.
                let status = status.to_string();
                buf.reserve(
                    PREFIX.len() + message.len() + MIDDLE.len() + status.len() + SUFFIX.len(),
                );
                buf.extend_from_slice(PREFIX.as_bytes());
                buf.extend_from_slice(message.as_bytes());
                buf.extend_from_slice(MIDDLE.as_bytes());
                buf.extend_from_slice(status.as_bytes());
                buf.extend_from_slice(SUFFIX.as_bytes());
            }
            JsonMode::Escaped => {
                let body = WireBody {
                    message: &message,
                    status,
                };
                if let Err(e) = serde_json::to_writer(&mut *buf, &body) {
                    // Writing a str and a u16 into a Vec cannot fail.
                    tracing::warn!(error = %e, "failed to encode error body");
                }
            }
        }
    }
}

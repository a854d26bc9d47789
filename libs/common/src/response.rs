//! Helpers for reading backend error responses
//!
//! The backend reports failures either as a JSON body with a `detail` or
//! `message` field, as a bare JSON string, or as plain text. Clients show
//! whichever human-readable message they can find.

use serde_json::Value;

/// Reduce an error response body to a message fit for display
///
/// Falls back to `Error <status>` when the body carries nothing usable.
pub fn error_message(status: u16, content_type: Option<&str>, body: &str) -> String {
    let fallback = || format!("Error {}", status);
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        let message = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => ["detail", "message"]
                .iter()
                .find_map(|field| map.get(*field).and_then(Value::as_str))
                .map(str::to_string),
            Ok(Value::String(text)) => Some(text),
            _ => None,
        };
        return message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(fallback);
    }

    let text = body.trim();
    if text.is_empty() {
        fallback()
    } else {
        text.to_string()
    }
}

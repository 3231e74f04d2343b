use serde::Serialize;

use crate::refactor::Notice;

/// Format a result as minified JSON.
pub fn format_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string(result).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Format an error as JSON.
pub fn format_error(err: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

/// Format a user notice as JSON.
pub fn format_notice(notice: &Notice) -> String {
    serde_json::json!({ "notice": notice.title, "message": notice.message }).to_string()
}

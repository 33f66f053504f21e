//! JSON serialization for estimate reports.

use serde::Serialize;

/// Serialize a report to a compact JSON string.
///
/// Infinite half-widths (a stage with no samples) serialize as `null`.
pub fn to_json<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a report to a pretty-printed JSON string.
pub fn to_json_pretty<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

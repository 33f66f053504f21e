//! Output formatting for estimate reports.
//!
//! - Terminal: human-readable stage tables with colors and box drawing
//! - JSON: machine-readable serialization of the full report

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_estimate, format_report, format_schedule, format_simple_mc, format_stage};

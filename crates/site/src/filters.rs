//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a tool count as "1 Tool" or "N Tools".
///
/// Usage in templates: `{{ category.tool_count|tools_label }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn tools_label(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(tool_count_label(&count.to_string()))
}

fn tool_count_label(count: &str) -> String {
    if count == "1" {
        "1 Tool".to_string()
    } else {
        format!("{count} Tools")
    }
}

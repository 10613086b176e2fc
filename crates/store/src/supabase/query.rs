//! PostgREST query string encoding.

use aitoonic_core::store::{Filter, Select};
use url::Url;

/// Escape `LIKE` wildcards so the value matches literally, except `*`,
/// which can only be narrowed to a single character wildcard.
pub(super) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            // PostgREST rewrites `*` to `%` before escapes apply.
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Query pairs for a set of filters.
pub(super) fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{value}")),
            Filter::ILike { column, value } => {
                (column.clone(), format!("ilike.{}", escape_like(value)))
            }
        })
        .collect()
}

/// Query pairs for a full select.
pub(super) fn select_pairs(query: &Select) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), query.columns.clone())];
    pairs.extend(filter_pairs(&query.filters));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    pairs
}

/// Append pairs to a URL's query string, percent-encoding as needed.
pub(super) fn with_pairs(mut url: Url, pairs: &[(String, String)]) -> Url {
    if !pairs.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    url
}

/// Total row count from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub(super) fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

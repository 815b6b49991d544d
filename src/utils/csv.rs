//! Comma-separated list handling shared by the list conversions.

/// Split a comma-separated string into its elements, trimming whitespace and
/// discarding empty segments.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

/// Inverse of [`split_list`] for elements without commas.
pub fn join_list(items: &[String]) -> String {
    items.join(",")
}

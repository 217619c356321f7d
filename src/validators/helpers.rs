//! Shared validator helpers
//!
//! Value-shape predicates used by several validators: parameter-reference
//! and expression detection, declared-type checks for attribute values, and
//! element-path assembly for diagnostics.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Pattern for a bare parameter reference: `$Name`
pub const PARAMETER_PATTERN: &str = r"^\$[A-Za-z_][A-Za-z0-9_]*$";

/// Pattern for `$Name` mentions inside any value
const MENTION_PATTERN: &str = r"\$([A-Za-z_][A-Za-z0-9_]*)";

lazy_static::lazy_static! {
    static ref PARAMETER_REGEX: regex::Regex = regex::Regex::new(PARAMETER_PATTERN).unwrap();
    static ref MENTION_REGEX: regex::Regex = regex::Regex::new(MENTION_PATTERN).unwrap();
}

// =============================================================================
// Parameter and expression forms
// =============================================================================

/// Whether a value is exactly a `$Name` parameter reference
pub fn is_parameter_reference(value: &str) -> bool {
    PARAMETER_REGEX.is_match(value)
}

/// Whether a value is a bracketed `${...}` expression
pub fn is_expression(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

/// Whether a value defers to reference resolution instead of type and
/// enumeration checking
pub fn is_parameter_form(value: &str) -> bool {
    is_parameter_reference(value) || is_expression(value)
}

/// Every `$Name` mention in a value, without the `$`. An expression with no
/// mentions is a literal.
pub fn extract_mentions(value: &str) -> Vec<String> {
    MENTION_REGEX
        .captures_iter(value)
        .map(|c| c[1].to_string())
        .collect()
}

// =============================================================================
// Declared-type checks
// =============================================================================

/// Check a value against a declared type tag. `string` and unknown tags
/// always pass.
pub fn check_value_for_type(value: &str, attr_type: &str) -> bool {
    match attr_type {
        "int" => is_valid_int(value),
        "unsignedInt" => is_valid_unsigned_int(value),
        "unsignedShort" => is_valid_unsigned_short(value),
        "double" | "float" => is_valid_double(value),
        "boolean" => is_valid_boolean(value),
        "dateTime" => is_valid_datetime(value),
        _ => true,
    }
}

/// Base-10 integer
pub fn is_valid_int(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

/// Base-10 integer, non-negative
pub fn is_valid_unsigned_int(value: &str) -> bool {
    matches!(value.trim().parse::<i64>(), Ok(n) if n >= 0)
}

/// Base-10 integer within 0..=65535
pub fn is_valid_unsigned_short(value: &str) -> bool {
    matches!(value.trim().parse::<i64>(), Ok(n) if (0..=65535).contains(&n))
}

/// Floating point number
pub fn is_valid_double(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// One of true/false/1/0, case-insensitive
pub fn is_valid_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "false" | "1" | "0"
    )
}

/// ISO-8601: offset datetime (trailing `Z` included), naive datetime, or
/// plain date
pub fn is_valid_datetime(value: &str) -> bool {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Human remedy text for a declared type, used in type mismatch messages
pub fn type_hint(attr_type: &str) -> &'static str {
    match attr_type {
        "int" => "a base-10 integer",
        "unsignedInt" => "a non-negative integer",
        "unsignedShort" => "an integer between 0 and 65535",
        "double" | "float" => "a floating point number",
        "boolean" => "one of true, false, 1, 0",
        "dateTime" => "an ISO-8601 date or datetime",
        _ => "a string",
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Slash-joined element path
pub fn child_path(path: &str, tag: &str) -> String {
    if path.is_empty() {
        tag.to_string()
    } else {
        format!("{}/{}", path, tag)
    }
}

/// Render a candidate list for reference diagnostics
pub fn format_candidates(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

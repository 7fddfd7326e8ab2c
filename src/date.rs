use std::time::SystemTime;

/// Parses an HTTP-date header value.
///
/// Returns `None` when the value is absent, empty or not a valid
/// IMF-fixdate, RFC 850 or asctime date. Callers compare the results with
/// [`not_after`] so a missing date never counts as a match.
pub fn parse_http_date(value: Option<&str>) -> Option<SystemTime> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    httpdate::parse_http_date(value).ok()
}

/// `a <= b`, false when either side failed to parse.
pub fn not_after(a: Option<SystemTime>, b: Option<SystemTime>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}

/// `a > b`, false when either side failed to parse.
pub fn after(a: Option<SystemTime>, b: Option<SystemTime>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

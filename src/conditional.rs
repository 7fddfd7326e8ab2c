//! Conditional request evaluation (RFC 7232).

use axum::http::header;

use crate::date::{after, not_after, parse_http_date};
use crate::etag::weak_eq;
use crate::host::RequestHead;
use crate::token_list::parse_token_list;

/// The validators of the current representation, read from the response
/// headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validators<'a> {
    pub etag: Option<&'a str>,
    pub last_modified: Option<&'a str>,
}

/// Whether the request carries any of the four conditional headers.
pub fn is_conditional<R: RequestHead + ?Sized>(request: &R) -> bool {
    [
        &header::IF_MATCH,
        &header::IF_UNMODIFIED_SINCE,
        &header::IF_NONE_MATCH,
        &header::IF_MODIFIED_SINCE,
    ]
    .into_iter()
    .any(|name| request.header(name).is_some())
}

/// Whether a `Cache-Control` value contains the `no-cache` directive.
pub fn has_no_cache(cache_control: &str) -> bool {
    cache_control
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

/// Whether a cached copy described by the request's `If-None-Match` /
/// `If-Modified-Since` is still fresh.
///
/// An unconditional request is never fresh, and `Cache-Control: no-cache`
/// always forces revalidation.
pub fn is_fresh<R: RequestHead + ?Sized>(request: &R, validators: Validators<'_>) -> bool {
    let modified_since = request.header(&header::IF_MODIFIED_SINCE);
    let none_match = request.header(&header::IF_NONE_MATCH);

    if modified_since.is_none() && none_match.is_none() {
        return false;
    }

    if request.header(&header::CACHE_CONTROL).is_some_and(has_no_cache) {
        return false;
    }

    if let Some(none_match) = none_match.filter(|value| value.trim() != "*") {
        let Some(etag) = validators.etag else {
            return false;
        };
        if !parse_token_list(none_match).into_iter().any(|tag| weak_eq(tag, etag)) {
            return false;
        }
    }

    if modified_since.is_some() {
        let last_modified = parse_http_date(validators.last_modified);
        if !not_after(last_modified, parse_http_date(modified_since)) {
            return false;
        }
    }

    true
}

/// Whether `If-Match` or `If-Unmodified-Since` rule out the request.
pub fn is_precondition_failure<R: RequestHead + ?Sized>(request: &R, validators: Validators<'_>) -> bool {
    if let Some(if_match) = request.header(&header::IF_MATCH) {
        let Some(etag) = validators.etag else {
            return true;
        };
        if if_match.trim() == "*" {
            return false;
        }
        return !parse_token_list(if_match).into_iter().any(|tag| weak_eq(tag, etag));
    }

    let unmodified_since = parse_http_date(request.header(&header::IF_UNMODIFIED_SINCE));
    if unmodified_since.is_some() {
        let last_modified = parse_http_date(validators.last_modified);
        return last_modified.is_none() || after(last_modified, unmodified_since);
    }

    false
}

/// Whether the `Range` header may be honoured given `If-Range`.
///
/// Without `If-Range` the range always applies. An entity-tag `If-Range`
/// must equal the current strong tag. A date `If-Range` requires the
/// current `Last-Modified` to be no later than that date.
pub fn is_range_fresh<R: RequestHead + ?Sized>(request: &R, validators: Validators<'_>) -> bool {
    let Some(if_range) = request.header(&header::IF_RANGE) else {
        return true;
    };

    if if_range.contains('"') {
        let if_range = if_range.trim();
        return validators
            .etag
            .is_some_and(|etag| !if_range.starts_with("W/") && etag == if_range);
    }

    not_after(parse_http_date(validators.last_modified), parse_http_date(Some(if_range)))
}

//! The negotiation state machine for one request/response pair.
//!
//! Order of evaluation follows RFC 7232 section 6 and RFC 7233 section 3.1:
//! preconditions, then freshness, then `If-Range`, then `Range`.

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum_extra::headers::{AcceptRanges, ContentLength, ContentRange, LastModified};
use tracing::{debug, trace};

use crate::body::{Representation, ResponseBody};
use crate::conditional::{is_conditional, is_fresh, is_precondition_failure, is_range_fresh, Validators};
use crate::error::NegotiateError;
use crate::etag;
use crate::host::{RequestHead, ResponseHead};
use crate::options::RangeOptions;
use crate::range::{parse_range, ParseOptions, RangeError, RangeSpec};
use crate::stream::chunked;
use crate::window::ByteWindow;

/// Headers describing the selected representation, removed from a `304`.
const NOT_MODIFIED_STRIPPED: [HeaderName; 5] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::CONTENT_TYPE,
];

/// Terminal decision of [`negotiate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Range handling does not apply; only `Accept-Ranges` was added.
    PassThrough,
    /// `304 Not Modified`.
    NotModified,
    /// `412 Precondition Failed`.
    PreconditionFailed,
    /// The full representation is served because `If-Range` did not match.
    FullBody,
    /// `416 Range Not Satisfiable`.
    NotSatisfiable(RangeError),
    /// `206 Partial Content` with the inclusive byte range served.
    PartialBody { start: u64, end: u64, total: Option<u64> },
}

/// Applies conditional GET and range negotiation to a finished response.
///
/// Runs after the handler has produced `response` and before it is written.
/// Status, headers and body are rewritten in place. Errors come only from
/// the metadata lookup of a [`ResponseBody::Resource`]; in that case the
/// original body is put back untouched.
pub async fn negotiate<Req, Res>(
    request: &Req,
    response: &mut Res,
    options: &RangeOptions,
) -> Result<Outcome, NegotiateError>
where
    Req: RequestHead + ?Sized,
    Res: ResponseHead,
{
    response.set_typed(AcceptRanges::bytes());

    if !is_range_request(request) {
        trace!(method = %request.method(), "range negotiation skipped");
        return Ok(Outcome::PassThrough);
    }

    let Some(range_header) = request.header(&header::RANGE).map(str::to_owned) else {
        return Ok(Outcome::PassThrough);
    };

    let representation = match response.take_body() {
        Some(ResponseBody::Buffer(bytes)) => Representation::Buffer(bytes),
        Some(ResponseBody::Resource(resource)) => Representation::Resource(resource),
        other => {
            response.set_body(other);
            return Ok(Outcome::PassThrough);
        }
    };

    let total = match resolve_representation(response, &representation).await {
        Ok(total) => total,
        Err(e) => {
            response.set_body(Some(representation.into()));
            return Err(e);
        }
    };

    let validators = Validators {
        etag: response.header(&header::ETAG),
        last_modified: response.header(&header::LAST_MODIFIED),
    };

    if is_conditional(request) {
        if is_precondition_failure(request, validators) {
            debug!("precondition failed");
            precondition_failed(response);
            return Ok(Outcome::PreconditionFailed);
        }

        // Range is ignored when a conditional GET would result in a 304
        // (RFC 7233 section 3.1)
        if is_cacheable(response.status()) && is_fresh(request, validators) {
            debug!("representation not modified");
            not_modified(response);
            return Ok(Outcome::NotModified);
        }
    }

    if !is_range_fresh(request, validators) {
        debug!("If-Range does not match, serving full representation");
        response.set_body(Some(representation.into()));
        return Ok(Outcome::FullBody);
    }

    let parse_options = ParseOptions { combine: options.combine_overlapping };
    let first = parse_range(total, &range_header, parse_options).and_then(|specs| match specs.first() {
        // the last N bytes of a stream of unknown length cannot be located
        Some(RangeSpec::Suffix(_)) | None => Err(RangeError::Unsatisfiable),
        Some(RangeSpec::Bytes { start, end }) => Ok((*start, *end)),
    });

    let (start, end) = match first {
        Ok(range) => range,
        Err(e) => {
            debug!(range = %range_header, error = %e, "range rejected");
            not_satisfiable(response, e, total);
            return Ok(Outcome::NotSatisfiable(e));
        }
    };

    let end = match (end, total) {
        (Some(end), _) => end,
        (None, Some(total)) => total - 1,
        (None, None) => unknown_length_end(start, options),
    };
    // bytes=0-18446744073709551615 on an unknown length has no
    // representable Content-Length
    let end = if end - start == u64::MAX { unknown_length_end(start, options) } else { end };

    let Ok(content_range) = ContentRange::bytes(start..=end, total) else {
        not_satisfiable(response, RangeError::Unsatisfiable, total);
        return Ok(Outcome::NotSatisfiable(RangeError::Unsatisfiable));
    };

    debug!(start, end, ?total, "serving partial content");
    response.set_status(StatusCode::PARTIAL_CONTENT);
    response.set_typed(content_range);
    response.set_typed(ContentLength(end - start + 1));
    response.set_body(Some(ResponseBody::Stream(window(representation, start, end, options))));

    Ok(Outcome::PartialBody { start, end, total })
}

/// Whether the request is a `GET` carrying a `Range` header. A server MUST
/// ignore `Range` on any other method (RFC 7233 section 3.1).
pub(crate) fn is_range_request<Req: RequestHead + ?Sized>(request: &Req) -> bool {
    request.method() == Method::GET && request.header(&header::RANGE).is_some()
}

fn unknown_length_end(start: u64, options: &RangeOptions) -> u64 {
    start.saturating_add(options.unknown_length_window.max(1) - 1)
}

/// Sets missing validators and returns the representation length, `None`
/// when it is unknown.
async fn resolve_representation<Res: ResponseHead>(
    response: &mut Res,
    representation: &Representation,
) -> Result<Option<u64>, NegotiateError> {
    match representation {
        Representation::Buffer(bytes) => {
            if response.header(&header::ETAG).is_none() {
                set_etag(response, etag::from_content(bytes));
            }
            Ok(Some(bytes.len() as u64))
        }
        Representation::Resource(resource) => {
            let metadata = resource
                .stat()
                .await
                .map_err(|e| NegotiateError::stat(resource.path().to_owned(), e))?;

            if response.header(&header::LAST_MODIFIED).is_none() {
                if let Some(modified) = metadata.modified {
                    response.set_typed(LastModified::from(modified));
                }
            }
            if response.header(&header::ETAG).is_none() {
                set_etag(response, etag::from_metadata(&metadata));
            }
            Ok(metadata.size)
        }
    }
}

fn set_etag<Res: ResponseHead>(response: &mut Res, tag: String) {
    if let Ok(value) = HeaderValue::try_from(tag) {
        response.set_header(header::ETAG, value);
    }
}

/// 2xx or 304 (RFC 7232 section 4.1).
fn is_cacheable(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_MODIFIED
}

fn precondition_failed<Res: ResponseHead>(response: &mut Res) {
    response.set_status(StatusCode::PRECONDITION_FAILED);
    response.remove_header(&header::CONTENT_LENGTH);
    response.remove_header(&header::CONTENT_RANGE);
    response.set_body(None);
}

fn not_modified<Res: ResponseHead>(response: &mut Res) {
    for name in &NOT_MODIFIED_STRIPPED {
        response.remove_header(name);
    }
    response.set_status(StatusCode::NOT_MODIFIED);
    response.set_body(None);
}

fn not_satisfiable<Res: ResponseHead>(response: &mut Res, error: RangeError, total: Option<u64>) {
    response.set_status(StatusCode::RANGE_NOT_SATISFIABLE);
    response.remove_header(&header::CONTENT_LENGTH);
    response.remove_header(&header::CONTENT_RANGE);
    if error == RangeError::Unsatisfiable {
        match total {
            Some(total) => response.set_typed(ContentRange::unsatisfied_bytes(total)),
            None => response.set_header(header::CONTENT_RANGE, HeaderValue::from_static("bytes */*")),
        }
    }
    response.set_body(None);
}

fn window(representation: Representation, start: u64, end: u64, options: &RangeOptions) -> Body {
    match representation {
        Representation::Buffer(bytes) => {
            Body::new(ByteWindow::new(chunked(bytes, options.chunk_size), start, Some(end)))
        }
        Representation::Resource(resource) => {
            Body::new(ByteWindow::new(resource.into_stream(), start, Some(end)))
        }
    }
}

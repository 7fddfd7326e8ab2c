//! axum adapter for [`negotiate`].
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use axum_range_negotiate::{range_negotiation, Resource};
//!
//! let app: Router = Router::new()
//!     .route("/video", get(|| async { Resource::new("video.mp4") }))
//!     .layer(middleware::from_fn(range_negotiation));
//! ```

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{AcceptRanges, HeaderMapExt};
use tracing::warn;

use crate::body::{Representation, ResponseBody};
use crate::host::{RequestSnapshot, ResponseParts};
use crate::negotiate::{is_range_request, negotiate};
use crate::options::RangeOptions;

/// Range negotiation with [`RangeOptions::default`], for
/// [`axum::middleware::from_fn`].
pub async fn range_negotiation(request: Request, next: Next) -> Response {
    negotiate_response(request, next, &RangeOptions::default()).await
}

/// Range negotiation with explicit options, for
/// [`axum::middleware::from_fn_with_state`].
pub async fn range_negotiation_with(
    State(options): State<RangeOptions>,
    request: Request,
    next: Next,
) -> Response {
    negotiate_response(request, next, &options).await
}

async fn negotiate_response(request: Request, next: Next, options: &RangeOptions) -> Response {
    let snapshot = RequestSnapshot::from(&request);
    let response = next.run(request).await;

    let (mut head, body) = response.into_parts();
    let representation = head.extensions.remove::<Representation>();
    // the received body is only replaced when a range is actually negotiated
    let body = match representation {
        Some(representation) if is_range_request(&snapshot) => ResponseBody::from(representation),
        _ => ResponseBody::Stream(body),
    };

    let mut parts = ResponseParts::new(head, Some(body));
    match negotiate(&snapshot, &mut parts, options).await {
        Ok(_) => parts.into_response(),
        Err(e) => {
            warn!(error = %e, "range negotiation failed");
            let mut response = e.into_response();
            response.headers_mut().typed_insert(AcceptRanges::bytes());
            response
        }
    }
}

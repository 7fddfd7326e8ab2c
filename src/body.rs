use std::fmt;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::file::Resource;

/// The body shapes the negotiation understands.
///
/// Range handling applies to [`ResponseBody::Buffer`] and
/// [`ResponseBody::Resource`]. A [`ResponseBody::Stream`] is opaque and
/// passes through untouched.
pub enum ResponseBody {
    /// Fully materialized body of known length.
    Buffer(Bytes),
    /// A file on disk, read lazily.
    Resource(Resource),
    /// Any other body.
    Stream(Body),
}

impl ResponseBody {
    /// Converts into an axum body. Resources are opened on first poll.
    pub fn into_body(self) -> Body {
        match self {
            ResponseBody::Buffer(bytes) => Body::from(bytes),
            ResponseBody::Resource(resource) => Body::from_stream(resource.into_stream()),
            ResponseBody::Stream(body) => body,
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            ResponseBody::Resource(resource) => f.debug_tuple("Resource").field(resource).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Buffer(bytes)
    }
}

impl From<Resource> for ResponseBody {
    fn from(resource: Resource) -> Self {
        ResponseBody::Resource(resource)
    }
}

impl From<Body> for ResponseBody {
    fn from(body: Body) -> Self {
        ResponseBody::Stream(body)
    }
}

/// Response extension recording the shape of a body produced by one of
/// this crate's responders.
///
/// axum erases body types, so [`Buffered`] and [`Resource`] leave this
/// marker behind for [`crate::range_negotiation`] to recover the shape.
#[derive(Debug, Clone)]
pub enum Representation {
    Buffer(Bytes),
    Resource(Resource),
}

impl From<Representation> for ResponseBody {
    fn from(representation: Representation) -> Self {
        match representation {
            Representation::Buffer(bytes) => ResponseBody::Buffer(bytes),
            Representation::Resource(resource) => ResponseBody::Resource(resource),
        }
    }
}

/// In-memory response body eligible for range negotiation. Implements
/// [`IntoResponse`].
#[derive(Debug, Clone)]
pub struct Buffered {
    bytes: Bytes,
    content_type: Option<String>,
}

impl Buffered {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Buffered { bytes: bytes.into(), content_type: None }
    }

    /// Sets the `Content-Type` of the response.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl IntoResponse for Buffered {
    fn into_response(self) -> Response {
        let mut response = Body::from(self.bytes.clone()).into_response();
        if let Some(value) = self.content_type.and_then(|ct| ct.parse().ok()) {
            response.headers_mut().insert(axum::http::header::CONTENT_TYPE, value);
        }
        response.extensions_mut().insert(Representation::Buffer(self.bytes));
        response
    }
}

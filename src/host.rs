//! Capability traits the negotiation runs against.
//!
//! The orchestrator never sees a concrete request or response type. A host
//! pipeline provides a thin adapter implementing [`RequestHead`] and
//! [`ResponseHead`]; the axum adapter is [`crate::range_negotiation`].

use axum::http::{request, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::Header;

use crate::body::ResponseBody;

/// Read access to the request being answered.
pub trait RequestHead {
    fn method(&self) -> &Method;

    /// Value of the named header. `None` when the header is absent, empty
    /// or not valid visible ASCII.
    fn header(&self, name: &HeaderName) -> Option<&str>;
}

/// Read and write access to the response produced upstream.
pub trait ResponseHead {
    fn status(&self) -> StatusCode;

    fn set_status(&mut self, status: StatusCode);

    /// Same contract as [`RequestHead::header`].
    fn header(&self, name: &HeaderName) -> Option<&str>;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    fn remove_header(&mut self, name: &HeaderName);

    /// Takes the body out of the response, leaving it empty.
    fn take_body(&mut self) -> Option<ResponseBody>;

    fn set_body(&mut self, body: Option<ResponseBody>);

    /// Encodes a typed header and sets it, replacing any previous value.
    fn set_typed<H: Header>(&mut self, header: H)
    where
        Self: Sized,
    {
        let mut values = Vec::with_capacity(1);
        header.encode(&mut values);
        if let Some(value) = values.pop() {
            self.set_header(H::name().clone(), value);
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
}

impl<B> RequestHead for Request<B> {
    fn method(&self) -> &Method {
        Request::method(self)
    }

    fn header(&self, name: &HeaderName) -> Option<&str> {
        header_str(self.headers(), name)
    }
}

impl RequestHead for request::Parts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &HeaderName) -> Option<&str> {
        header_str(&self.headers, name)
    }
}

/// The parts of a request the negotiation needs once the request itself has
/// been handed to the inner service.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: Method,
    headers: HeaderMap,
}

impl<B> From<&Request<B>> for RequestSnapshot {
    fn from(request: &Request<B>) -> Self {
        RequestSnapshot {
            method: request.method().clone(),
            headers: request.headers().clone(),
        }
    }
}

impl RequestHead for RequestSnapshot {
    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &HeaderName) -> Option<&str> {
        header_str(&self.headers, name)
    }
}

/// An owned response head with a shaped body. Implements [`ResponseHead`]
/// and [`IntoResponse`].
#[derive(Debug)]
pub struct ResponseParts {
    head: axum::http::response::Parts,
    body: Option<ResponseBody>,
}

impl ResponseParts {
    pub fn new(head: axum::http::response::Parts, body: Option<ResponseBody>) -> Self {
        ResponseParts { head, body }
    }

    /// A `200 OK` response with no headers.
    pub fn ok(body: impl Into<ResponseBody>) -> Self {
        let (head, ()) = Response::new(()).into_parts();
        ResponseParts::new(head, Some(body.into()))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }
}

impl ResponseHead for ResponseParts {
    fn status(&self) -> StatusCode {
        self.head.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.head.status = status;
    }

    fn header(&self, name: &HeaderName) -> Option<&str> {
        header_str(&self.head.headers, name)
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.head.headers.insert(name, value);
    }

    fn remove_header(&mut self, name: &HeaderName) {
        self.head.headers.remove(name);
    }

    fn take_body(&mut self) -> Option<ResponseBody> {
        self.body.take()
    }

    fn set_body(&mut self, body: Option<ResponseBody>) {
        self.body = body;
    }
}

impl IntoResponse for ResponseParts {
    fn into_response(self) -> Response {
        let body = self.body.map(ResponseBody::into_body).unwrap_or_default();
        Response::from_parts(self.head, body)
    }
}

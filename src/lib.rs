//! # axum-range-negotiate
//!
//! HTTP range and conditional GET negotiation for [`axum`][1].
//!
//! The [`range_negotiation`] middleware runs after a handler has produced its
//! response and decides between `304 Not Modified`, `412 Precondition Failed`,
//! `416 Range Not Satisfiable` and `206 Partial Content`. Every response gets
//! `Accept-Ranges: bytes`.
//!
//! Range handling applies to bodies produced by the [`Buffered`] and
//! [`Resource`] responders. Any other body is passed through untouched.
//! Only the first range of a multi-range request is served.
//!
//! ```
//! use axum::Router;
//! use axum::middleware;
//! use axum::routing::get;
//!
//! use axum_range_negotiate::{range_negotiation_with, Buffered, RangeOptions, Resource};
//!
//! async fn file() -> Resource {
//!     Resource::new("document.txt")
//! }
//!
//! async fn greeting() -> Buffered {
//!     Buffered::new("Hello, World!").with_content_type("text/plain")
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = RangeOptions { combine_overlapping: true, ..RangeOptions::default() };
//!
//!     // build our application with a single route
//!     let _app: Router = Router::new()
//!         .route("/", get(file))
//!         .route("/greeting", get(greeting))
//!         .layer(middleware::from_fn_with_state(options, range_negotiation_with));
//!
//!     // run it on localhost:3000
//!     #[cfg(feature = "run_server_in_example")]
//!     axum::serve(tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap(), _app)
//!        .await
//!        .unwrap();
//! }
//! ```
//!
//! Hosts that are not axum handlers can drive [`negotiate`] directly through
//! the [`RequestHead`] and [`ResponseHead`] traits.
//!
//! [1]: https://docs.rs/axum

mod body;
mod error;
mod file;
mod host;
mod middleware;
mod negotiate;
mod options;
mod stream;
mod window;

pub mod conditional;
pub mod date;
pub mod etag;
pub mod range;
pub mod token_list;

pub use body::{Buffered, Representation, ResponseBody};
pub use error::NegotiateError;
pub use file::{Resource, ResourceMetadata};
pub use host::{RequestHead, RequestSnapshot, ResponseHead, ResponseParts};
pub use middleware::{range_negotiation, range_negotiation_with};
pub use negotiate::{negotiate, Outcome};
pub use options::{RangeOptions, DEFAULT_CHUNK_SIZE, DEFAULT_UNKNOWN_LENGTH_WINDOW};
pub use range::{parse_range, ParseOptions, RangeError, RangeSpec};
pub use stream::{chunked, ReadStream};
pub use window::ByteWindow;

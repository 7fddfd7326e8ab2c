use std::path::PathBuf;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use axum_range_negotiate::{range_negotiation_with, Buffered, RangeOptions, Resource};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt().try_init();

    let options = RangeOptions::default();
    let router = Router::new()
        .route("/", get(|| async { Buffered::new("Hello, World!").with_content_type("text/plain") }))
        .route("/file", get(get_file))
        .layer(middleware::from_fn_with_state(options, range_negotiation_with));

    let listener = match tokio::net::TcpListener::bind("0.0.0.0:3000").await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "server error");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
struct FileRequest {
    path: PathBuf,
}

async fn get_file(Query(q): Query<FileRequest>) -> Response {
    if q.path.is_dir() {
        return (StatusCode::BAD_REQUEST, "Not a file").into_response();
    }
    // a missing file becomes a 404 once a Range header triggers the metadata lookup
    Resource::new(q.path).into_response()
}

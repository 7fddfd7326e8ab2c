use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tokio::net::TcpListener;

use axum_range_negotiate::{etag, range_negotiation, range_negotiation_with, Buffered, RangeOptions, Resource};

const FIXTURE: &str = "Hello world this is a file to test range requests on!\n";

fn body() -> Vec<u8> {
    (0..1024u32).map(|i| (i % 256) as u8).collect()
}

fn json_body() -> Vec<u8> {
    serde_json::to_vec(&json!({"foo": "bar"})).unwrap()
}

fn routes() -> Router {
    Router::new()
        .route(
            "/",
            get(|| async { Buffered::new(body()) })
                .post(|| async { Buffered::new(body()) })
                .put(|| async { Buffered::new(body()) }),
        )
        .route("/json", get(|| async { Buffered::new(json_body()).with_content_type("application/json") }))
        .route("/string", get(|| async { "partial content" }))
        .route("/empty", get(|| async { Buffered::new(Vec::new()) }))
        .route("/stream", get(|| async { Resource::new("test/fixture.txt") }))
        .route("/missing", get(|| async { Resource::new("test/does_not_exist.txt") }))
        .route(
            "/tagged",
            get(|| async { ([(header::ETAG, "\"v1\"")], Buffered::new("tagged body")) }),
        )
}

async fn spawn(app: Router) -> SocketAddr {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn server() -> SocketAddr {
    spawn(routes().layer(middleware::from_fn(range_negotiation))).await
}

fn header_value<'a>(response: &'a reqwest::Response, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).map(|value| value.to_str().unwrap())
}

#[tokio::test]
async fn test_no_range_header() {
    let addr = server().await;
    let response = Client::new().get(format!("http://{addr}/")).send().await.unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
    assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
    assert_eq!(&body()[..], &response.bytes().await.unwrap()[..]);
}

#[tokio::test]
async fn test_partial_content() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=0-299")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
    assert_eq!(Some("bytes 0-299/1024"), header_value(&response, header::CONTENT_RANGE));
    assert_eq!(Some("300"), header_value(&response, header::CONTENT_LENGTH));
    assert!(header_value(&response, header::ETAG).is_some());
    assert_eq!(&body()[..300], &response.bytes().await.unwrap()[..]);
}

#[tokio::test]
async fn test_suffix_range() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=-24")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes 1000-1023/1024"), header_value(&response, header::CONTENT_RANGE));
    assert_eq!(&body()[1000..], &response.bytes().await.unwrap()[..]);
}

#[tokio::test]
async fn test_range_ignored_for_other_methods() {
    let addr = server().await;
    let client = Client::new();

    for request in [client.post(format!("http://{addr}/")), client.put(format!("http://{addr}/"))] {
        let response = request.header("Range", "bytes=0-299").send().await.unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
        assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
        assert_eq!(1024, response.bytes().await.unwrap().len());
    }
}

#[tokio::test]
async fn test_reversed_range() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=400-300")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::RANGE_NOT_SATISFIABLE, response.status());
    assert_eq!(Some("bytes */1024"), header_value(&response, header::CONTENT_RANGE));
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_range() {
    let addr = server().await;
    let client = Client::new();

    for range in ["bytes=x-300", "bytes=400-x", "bytes", "bytes=0-4,-1/*"] {
        let response = client.get(format!("http://{addr}/")).header("Range", range).send().await.unwrap();

        assert_eq!(StatusCode::RANGE_NOT_SATISFIABLE, response.status(), "{range}");
        assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
        assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
    }
}

#[tokio::test]
async fn test_range_past_end() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=1000000-2000000")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::RANGE_NOT_SATISFIABLE, response.status());
    assert_eq!(Some("bytes */1024"), header_value(&response, header::CONTENT_RANGE));
}

#[tokio::test]
async fn test_json_body() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/json"))
        .header("Range", "bytes=0-5")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes 0-5/13"), header_value(&response, header::CONTENT_RANGE));
    assert_eq!(Some("6"), header_value(&response, header::CONTENT_LENGTH));
    assert_eq!(Some("application/json"), header_value(&response, header::CONTENT_TYPE));
    assert_eq!(&json_body()[..6], &response.bytes().await.unwrap()[..]);
}

#[tokio::test]
async fn test_precondition_failed() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=0-5")
        .header("If-Match", "fake_etag_value_that_doesnt_match")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PRECONDITION_FAILED, response.status());
    assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_if_match_wildcard() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=0-5")
        .header("If-Match", "*")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
}

#[tokio::test]
async fn test_not_modified() {
    let addr = server().await;
    let tag = etag::from_content(&body());
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=0-5")
        .header("If-None-Match", &tag)
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::NOT_MODIFIED, response.status());
    assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
    assert!(matches!(header_value(&response, header::CONTENT_LENGTH), None | Some("0")));
    assert_eq!(Some(tag.as_str()), header_value(&response, header::ETAG));
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_cache_revalidates() {
    let addr = server().await;
    let tag = etag::from_content(&body());
    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=0-5")
        .header("If-None-Match", format!("W/{tag}"))
        .header("Cache-Control", "no-cache")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(6, response.bytes().await.unwrap().len());
}

#[tokio::test]
async fn test_handler_etag_is_kept() {
    let addr = server().await;
    let client = Client::new();

    let response = client
        .get(format!("http://{addr}/tagged"))
        .header("Range", "bytes=0-5")
        .header("If-Range", "\"v1\"")
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("\"v1\""), header_value(&response, header::ETAG));
    assert_eq!(&b"tagged"[..], &response.bytes().await.unwrap()[..]);

    let response = client
        .get(format!("http://{addr}/tagged"))
        .header("Range", "bytes=0-5")
        .header("If-Range", "\"v0\"")
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
    assert_eq!(&b"tagged body"[..], &response.bytes().await.unwrap()[..]);
}

#[tokio::test]
async fn test_opaque_body_passes_through() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/string"))
        .header("Range", "bytes=0-2")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
    assert_eq!(None, header_value(&response, header::CONTENT_RANGE));
    assert_eq!("partial content", response.text().await.unwrap());
}

#[tokio::test]
async fn test_empty_body() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/empty"))
        .header("Range", "bytes=0-")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::RANGE_NOT_SATISFIABLE, response.status());
    assert_eq!(Some("bytes */0"), header_value(&response, header::CONTENT_RANGE));
}

#[tokio::test]
async fn test_resource_ranges() {
    let addr = server().await;
    let client = Client::new();

    let cases = [
        ("bytes=0-29", "bytes 0-29/54", &FIXTURE[..30]),
        ("bytes=30-53", "bytes 30-53/54", &FIXTURE[30..]),
        ("bytes=-20", "bytes 34-53/54", &FIXTURE[34..]),
        ("bytes=40-", "bytes 40-53/54", &FIXTURE[40..]),
        ("bytes=30-30", "bytes 30-30/54", "t"),
        ("bytes=0-4,-1", "bytes 0-4/54", "Hello"),
        ("bytes=50-100", "bytes 50-53/54", &FIXTURE[50..]),
    ];

    for (range, content_range, expected) in cases {
        let response = client.get(format!("http://{addr}/stream")).header("Range", range).send().await.unwrap();

        assert_eq!(StatusCode::PARTIAL_CONTENT, response.status(), "{range}");
        assert_eq!(Some(content_range), header_value(&response, header::CONTENT_RANGE), "{range}");
        assert_eq!(Some("text/plain"), header_value(&response, header::CONTENT_TYPE));
        assert!(header_value(&response, header::ETAG).is_some_and(|tag| tag.starts_with("W/")));
        assert!(header_value(&response, header::LAST_MODIFIED).is_some());
        assert_eq!(expected, response.text().await.unwrap(), "{range}");
    }
}

#[tokio::test]
async fn test_resource_full_body() {
    let addr = server().await;
    let response = Client::new().get(format!("http://{addr}/stream")).send().await.unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
    assert_eq!(None, header_value(&response, header::ETAG));
    assert_eq!(FIXTURE, response.text().await.unwrap());
}

#[tokio::test]
async fn test_resource_revalidation() {
    let addr = server().await;
    let client = Client::new();

    let first = client.get(format!("http://{addr}/stream")).header("Range", "bytes=0-4").send().await.unwrap();
    let tag = header_value(&first, header::ETAG).unwrap().to_owned();
    let modified = header_value(&first, header::LAST_MODIFIED).unwrap().to_owned();

    let response = client
        .get(format!("http://{addr}/stream"))
        .header("Range", "bytes=0-4")
        .header("If-None-Match", &tag)
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_MODIFIED, response.status());
    assert_eq!(None, header_value(&response, header::CONTENT_TYPE));

    let response = client
        .get(format!("http://{addr}/stream"))
        .header("Range", "bytes=0-4")
        .header("If-Range", &modified)
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());

    // weak tags never validate If-Range
    let response = client
        .get(format!("http://{addr}/stream"))
        .header("Range", "bytes=0-4")
        .header("If-Range", &tag)
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(FIXTURE, response.text().await.unwrap());
}

#[tokio::test]
async fn test_missing_resource() {
    let addr = server().await;
    let response = Client::new()
        .get(format!("http://{addr}/missing"))
        .header("Range", "bytes=0-4")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::NOT_FOUND, response.status());
    assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
    assert_eq!("Not Found", response.text().await.unwrap());
}

#[tokio::test]
async fn test_options_from_state() {
    let options = RangeOptions { combine_overlapping: true, ..RangeOptions::default() };
    let addr = spawn(routes().layer(middleware::from_fn_with_state(options, range_negotiation_with))).await;

    let response = Client::new()
        .get(format!("http://{addr}/"))
        .header("Range", "bytes=10-19,15-30")
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes 10-30/1024"), header_value(&response, header::CONTENT_RANGE));
    assert_eq!(&body()[10..=30], &response.bytes().await.unwrap()[..]);
}

async fn shout(request: Request, next: Next) -> Response {
    let (mut head, _) = next.run(request).await.into_parts();
    head.headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("x-upper"));
    head.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(head, Body::from("HELLO"))
}

#[tokio::test]
async fn test_inner_body_rewrite_is_kept() {
    let app = Router::new()
        .route("/hello", get(|| async { Buffered::new("hello") }).post(|| async { Buffered::new("hello") }))
        .layer(middleware::from_fn(shout))
        .layer(middleware::from_fn(range_negotiation));
    let addr = spawn(app).await;
    let client = Client::new();

    let response = client.get(format!("http://{addr}/hello")).send().await.unwrap();
    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(Some("x-upper"), header_value(&response, header::CONTENT_ENCODING));
    assert_eq!(Some("bytes"), header_value(&response, header::ACCEPT_RANGES));
    assert_eq!("HELLO", response.text().await.unwrap());

    let response = client
        .post(format!("http://{addr}/hello"))
        .header("Range", "bytes=0-1")
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, response.status());
    assert_eq!("HELLO", response.text().await.unwrap());
}

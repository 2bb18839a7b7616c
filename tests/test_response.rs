use linger::http::response::{Response, ResponseBuilder, StatusCode, TIMEOUT_BODY};
use linger::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"Hello, World!".to_vec());
}

#[test]
fn test_response_builder_with_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Custom", "value")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.headers.get("Content-Type").unwrap(), "text/plain");
    assert_eq!(response.headers.get("X-Custom").unwrap(), "value");
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    let content_length = response.headers.get("Content-Length").unwrap();
    assert_eq!(content_length, &body.len().to_string());
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    // Should keep the custom value
    assert_eq!(response.headers.get("Content-Length").unwrap(), "999");
}

#[test]
fn test_response_builder_multiple_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .header("X-Frame-Options", "DENY")
        .body(b"{}".to_vec())
        .build();

    assert_eq!(response.headers.len(), 4); // 3 custom + 1 auto (Content-Length)
    assert_eq!(
        response.headers.get("Content-Type").unwrap(),
        "application/json"
    );
    assert_eq!(response.headers.get("Cache-Control").unwrap(), "no-cache");
    assert_eq!(response.headers.get("X-Frame-Options").unwrap(), "DENY");
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert_eq!(response.body.len(), 0);
    assert_eq!(response.headers.get("Content-Length").unwrap(), "0");
}

#[test]
fn test_response_builder_various_status_codes() {
    let statuses = vec![
        StatusCode::Ok,
        StatusCode::BadRequest,
        StatusCode::NotFound,
    ];

    for status in statuses {
        let response = ResponseBuilder::new(status).body(b"test".to_vec()).build();
        assert_eq!(response.status, status);
    }
}

#[test]
fn test_response_builder_fluent_api() {
    // Test that builder methods return self for chaining
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Header1", "value1")
        .header("Header2", "value2")
        .header("Header3", "value3")
        .body(b"body".to_vec())
        .build();

    assert_eq!(response.headers.len(), 4); // 3 custom + 1 auto
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, b"404 Not Found".to_vec());
}

#[test]
fn test_status_code_connection_errors() {
    assert_eq!(StatusCode::RequestTimeout.as_u16(), 408);
    assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    assert_eq!(StatusCode::HttpVersionNotSupported.as_u16(), 505);
    assert_eq!(
        StatusCode::HttpVersionNotSupported.reason_phrase(),
        "HTTP Version Not Supported"
    );
}

#[test]
fn test_response_timeout_is_stable() {
    let response = Response::timeout();

    assert_eq!(response.status, StatusCode::RequestTimeout);
    assert_eq!(response.body, TIMEOUT_BODY.as_bytes().to_vec());
    assert_eq!(response.header("connection"), Some("close"));
    assert_eq!(
        serialize_response(&response),
        b"HTTP/1.1 408 Request Timeout\r\n\
          Connection: close\r\n\
          Content-Length: 19\r\n\
          Content-Type: text/plain\r\n\
          \r\n\
          408 Request Timeout"
            .to_vec()
    );
}

#[test]
fn test_response_error_closes_connection() {
    let response = Response::error(StatusCode::BadRequest);

    assert_eq!(response.body, b"400 Bad Request".to_vec());
    assert_eq!(response.headers.get("Connection").unwrap(), "close");
}

#[test]
fn test_response_set_keep_alive() {
    let mut response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"x".to_vec())
        .build();

    response.set_keep_alive(true);
    assert_eq!(response.header("Connection"), Some("keep-alive"));

    response.set_keep_alive(false);
    assert_eq!(response.header("Connection"), Some("close"));
}

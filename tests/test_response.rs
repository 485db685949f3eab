use std::time::{Duration, UNIX_EPOCH};

use spysrv::http::response::{ResponseHead, StatusCode};
use spysrv::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::OK.as_u16(), 200);
    assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
    assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED.as_u16(), 405);
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    assert_eq!(StatusCode::BAD_REQUEST.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED.reason_phrase(), "Method Not Allowed");
    assert_eq!(StatusCode::new(307).reason_phrase(), "Temporary Redirect");
    assert_eq!(StatusCode::new(599).reason_phrase(), "GOK");
}

#[test]
fn test_reason_phrase_legacy_entries() {
    assert_eq!(StatusCode::new(101).reason_phrase(), "Switching protocols");
    assert_eq!(StatusCode::new(207).reason_phrase(), "Partial Update OK");
    assert_eq!(StatusCode::new(416).reason_phrase(), "Requested range not satisfiable");
    assert_eq!(StatusCode::new(418).reason_phrase(), "Reauthentication Required");
    assert_eq!(StatusCode::new(419).reason_phrase(), "Proxy Reauthentication Required");
    assert_eq!(StatusCode::new(506).reason_phrase(), "Partial Update Not Implemented");
}

#[test]
fn test_common_headers_in_order() {
    // 1994-11-06 08:49:37 UTC
    let now = UNIX_EPOCH + Duration::from_secs(784_111_777);
    let head = ResponseHead::at(StatusCode::OK, "Worker-1", now);

    let names: Vec<&str> = head.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, ["Connection", "Server", "X-Srv-Connection", "Date"]);
    assert_eq!(head.get("connection"), Some("close"));
    assert_eq!(head.get("Server"), Some("spysrv"));
    assert_eq!(head.get("X-Srv-Connection"), Some("Worker-1"));
    assert_eq!(head.get("Date"), Some("Sun, 06 Nov 1994 08:49:37 GMT"));
    assert_eq!(head.get("Content-Type"), None);
}

#[test]
fn test_serialize_text_response() {
    let now = UNIX_EPOCH + Duration::from_secs(784_111_777);
    let head = ResponseHead::at(StatusCode::METHOD_NOT_ALLOWED, "Worker-2", now)
        .header("Content-Type", "text/plain");

    let bytes = serialize_response(&head, b"Only GET is supported\r\n");
    let expected = "HTTP/1.1 405 Method Not Allowed\r\n\
                    Connection: close\r\n\
                    Server: spysrv\r\n\
                    X-Srv-Connection: Worker-2\r\n\
                    Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    Only GET is supported\r\n";

    assert_eq!(String::from_utf8_lossy(&bytes), expected);
}

#[test]
fn test_serialize_head_only() {
    let head = ResponseHead::new(StatusCode::OK, "w");
    let bytes = serialize_response(&head, &[]);

    assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert!(bytes.ends_with(b"\r\n\r\n"));
}

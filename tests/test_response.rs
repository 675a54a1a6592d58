use rawhttp::http::error::WriteError;
use rawhttp::http::headers::Headers;
use rawhttp::http::response::{StatusCode, default_headers};
use rawhttp::http::writer::{ResponseWriter, WriteState};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Unauthorized.as_u16(), 401);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), Some("OK"));
    assert_eq!(StatusCode::BadRequest.reason_phrase(), Some("Bad Request"));
    assert_eq!(StatusCode::NotFound.reason_phrase(), Some("Not Found"));
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        Some("Internal Server Error")
    );
    assert_eq!(StatusCode::Unauthorized.reason_phrase(), None);
    assert_eq!(StatusCode::Forbidden.reason_phrase(), None);
}

#[test]
fn test_status_code_from_u16() {
    assert_eq!(StatusCode::from_u16(404), Some(StatusCode::NotFound));
    assert_eq!(StatusCode::from_u16(418), None);
}

#[test]
fn test_default_headers() {
    let headers = default_headers(13);

    assert_eq!(headers.get("content-length"), Some("13"));
    assert_eq!(headers.get("connection"), Some("Close"));
    assert_eq!(headers.get("content-type"), Some("text/plain"));
    assert_eq!(headers.len(), 3);
}

#[tokio::test]
async fn test_fixed_length_response_bytes() {
    let mut writer = ResponseWriter::new(Vec::new());

    writer.write_status_line(StatusCode::Ok).await.unwrap();
    writer.write_headers(default_headers(13)).await.unwrap();
    let n = writer.write_body(b"Hello, World!").await.unwrap();

    assert_eq!(n, 13);
    assert_eq!(writer.state(), WriteState::Done);
    assert_eq!(
        String::from_utf8(writer.into_inner()).unwrap(),
        "HTTP/1.1 200 OK\r\n\
         Content-Length: 13\r\n\
         Connection: Close\r\n\
         Content-Type: text/plain\r\n\
         \r\n\
         Hello, World!"
    );
}

#[tokio::test]
async fn test_chunked_response_with_trailers() {
    let mut headers = Headers::new();
    headers.set("Transfer-Encoding", "chunked");
    headers.set("Trailer", "X-Checksum");

    let mut writer = ResponseWriter::new(Vec::new());
    writer.write_status_line(StatusCode::Ok).await.unwrap();
    writer.write_headers(headers).await.unwrap();

    assert_eq!(writer.write_chunked_body(b"Hello, ").await.unwrap(), 7);
    assert_eq!(writer.write_chunked_body(&[b'x'; 26]).await.unwrap(), 26);
    assert_eq!(writer.write_chunked_body(b"").await.unwrap(), 0);
    writer.write_chunked_body_done().await.unwrap();
    assert_eq!(writer.state(), WriteState::Trailers);

    let mut trailers = Headers::new();
    trailers.set("X-Checksum", "abc123");
    writer.write_trailers(trailers).await.unwrap();

    assert_eq!(writer.body_len(), 33);
    assert_eq!(writer.trailers().get("x-checksum"), Some("abc123"));

    let out = String::from_utf8(writer.into_inner()).unwrap();
    let expected_body = format!(
        "7\r\nHello, \r\n1a\r\n{}\r\n0\r\nX-Checksum: abc123\r\n\r\n",
        "x".repeat(26)
    );
    assert!(out.starts_with("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nTrailer: X-Checksum\r\n\r\n"));
    assert!(out.ends_with(&expected_body));
}

#[tokio::test]
async fn test_chunked_response_without_trailers() {
    let mut headers = default_headers(0);
    headers.remove("Content-Length");
    headers.replace("Transfer-Encoding", "chunked");

    let mut writer = ResponseWriter::new(Vec::new());
    writer.write_status_line(StatusCode::Ok).await.unwrap();
    writer.write_headers(headers).await.unwrap();
    writer.write_chunked_body(b"abc").await.unwrap();
    writer.write_chunked_body_done().await.unwrap();

    assert_eq!(writer.state(), WriteState::Done);

    let out = String::from_utf8(writer.into_inner()).unwrap();
    assert!(out.ends_with("\r\n\r\n3\r\nabc\r\n0\r\n\r\n"));
}

#[tokio::test]
async fn test_out_of_order_writes_are_rejected() {
    let mut writer = ResponseWriter::new(Vec::new());

    let err = writer.write_body(b"too early").await.unwrap_err();
    assert!(matches!(err, WriteError::State { state: WriteState::Init, .. }));

    writer.write_status_line(StatusCode::NotFound).await.unwrap();
    let err = writer.write_status_line(StatusCode::Ok).await.unwrap_err();
    assert!(matches!(err, WriteError::State { state: WriteState::Headers, .. }));

    writer.write_headers(default_headers(0)).await.unwrap();
    let err = writer.write_trailers(Headers::new()).await.unwrap_err();
    assert!(matches!(err, WriteError::State { state: WriteState::Body, .. }));

    writer.write_body(b"").await.unwrap();
    let err = writer.write_chunked_body(b"late").await.unwrap_err();
    assert!(matches!(err, WriteError::State { state: WriteState::Done, .. }));
}

#[tokio::test]
async fn test_status_without_reason_phrase_is_rejected() {
    let mut writer = ResponseWriter::new(Vec::new());

    let err = writer.write_status_line(StatusCode::Forbidden).await.unwrap_err();

    assert!(matches!(err, WriteError::UnsupportedStatus(403)));
    assert_eq!(writer.state(), WriteState::Init);
    assert!(writer.into_inner().is_empty());
}

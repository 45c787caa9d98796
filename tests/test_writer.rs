use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use httpwire::http::headers::HeaderMap;
use httpwire::http::response::{StatusCode, chunked_headers, default_headers};
use httpwire::http::writer::{ResponseWriter, WriteError, WriterState};
use tokio::io::AsyncWrite;

/// Sink whose writes always fail.
struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

async fn writer_with_headers(headers: &HeaderMap) -> ResponseWriter<Vec<u8>> {
    let mut writer = ResponseWriter::new(Vec::new());
    writer.write_status_line(StatusCode::OK).await.unwrap();
    writer.write_headers(headers).await.unwrap();
    writer
}

#[tokio::test]
async fn test_status_lines() {
    for (status, expected) in [
        (StatusCode::OK, "HTTP/1.1 200 OK\r\n"),
        (StatusCode::BAD_REQUEST, "HTTP/1.1 400 Bad Request\r\n"),
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "HTTP/1.1 500 Internal Server Error\r\n",
        ),
        (StatusCode::from_u16(503), "HTTP/1.1 503\r\n"),
    ] {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(status).await.unwrap();

        assert_eq!(writer.state(), WriterState::StatusWritten);
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_full_response_bytes() {
    let body = b"Hello, World!";
    let mut headers = default_headers(body.len());
    headers.replace("Content-Type", "text/html");

    let mut writer = writer_with_headers(&headers).await;
    let n = writer.write_body(body).await.unwrap();

    assert_eq!(n, body.len());
    assert_eq!(writer.state(), WriterState::BodyWritten);
    assert_eq!(
        String::from_utf8(writer.into_inner()).unwrap(),
        "HTTP/1.1 200 OK\r\n\
         Content-Length: 13\r\n\
         Connection: close\r\n\
         Content-Type: text/html\r\n\
         \r\n\
         Hello, World!"
    );
}

#[tokio::test]
async fn test_headers_before_status_line_is_rejected() {
    let mut writer = ResponseWriter::new(Vec::new());

    let err = writer.write_headers(&default_headers(0)).await.unwrap_err();

    assert!(matches!(
        err,
        WriteError::OutOfOrderWrite {
            state: WriterState::Init,
            ..
        }
    ));
    assert_eq!(writer.state(), WriterState::Init);
    assert!(writer.into_inner().is_empty());
}

#[tokio::test]
async fn test_body_before_headers_is_rejected() {
    let mut writer = ResponseWriter::new(Vec::new());
    writer.write_status_line(StatusCode::OK).await.unwrap();

    let err = writer.write_body(b"too early").await.unwrap_err();

    assert!(matches!(err, WriteError::OutOfOrderWrite { .. }));
    assert_eq!(writer.state(), WriterState::StatusWritten);
    assert_eq!(writer.into_inner(), b"HTTP/1.1 200 OK\r\n");
}

#[tokio::test]
async fn test_body_from_init_is_rejected() {
    let mut writer = ResponseWriter::new(Vec::new());

    assert!(writer.write_body(b"x").await.is_err());
    assert!(writer.write_chunked_body(b"x").await.is_err());
    assert!(writer.write_chunked_body_done().await.is_err());
    assert!(writer.into_inner().is_empty());
}

#[tokio::test]
async fn test_status_line_twice_is_rejected() {
    let mut writer = ResponseWriter::new(Vec::new());
    writer.write_status_line(StatusCode::OK).await.unwrap();

    let err = writer
        .write_status_line(StatusCode::BAD_REQUEST)
        .await
        .unwrap_err();

    assert!(matches!(err, WriteError::OutOfOrderWrite { .. }));
}

#[tokio::test]
async fn test_nothing_after_body() {
    let mut writer = writer_with_headers(&default_headers(2)).await;
    writer.write_body(b"ok").await.unwrap();
    let before = writer.get_ref().len();

    assert!(writer.write_body(b"again").await.is_err());
    assert!(writer.write_chunked_body(b"again").await.is_err());
    assert!(writer.write_status_line(StatusCode::OK).await.is_err());
    assert_eq!(writer.get_ref().len(), before);
}

#[tokio::test]
async fn test_chunked_body_bytes() {
    let mut writer = writer_with_headers(&HeaderMap::new()).await;
    let head_len = writer.get_ref().len();

    for part in [&b"hello"[..], b" ", b"world"] {
        writer.write_chunked_body(part).await.unwrap();
        assert_eq!(writer.state(), WriterState::HeadersWritten);
    }
    writer.write_chunked_body_done().await.unwrap();

    assert_eq!(writer.state(), WriterState::BodyWritten);
    let out = writer.into_inner();
    assert_eq!(
        &out[head_len..],
        b"5\r\nhello\r\n1\r\n \r\n5\r\nworld\r\n0\r\n\r\n"
    );
}

#[tokio::test]
async fn test_chunk_length_is_hex() {
    let mut writer = writer_with_headers(&chunked_headers()).await;
    let head_len = writer.get_ref().len();
    let data = vec![b'a'; 255];

    writer.write_chunked_body(&data).await.unwrap();

    let out = writer.into_inner();
    assert!(out[head_len..].starts_with(b"ff\r\naaa"));
    assert!(out.ends_with(b"a\r\n"));
}

#[tokio::test]
async fn test_empty_chunked_body() {
    let mut writer = writer_with_headers(&HeaderMap::new()).await;

    writer.write_chunked_body(b"").await.unwrap();
    writer.write_chunked_body_done().await.unwrap();

    assert_eq!(writer.into_inner(), b"HTTP/1.1 200 OK\r\n\r\n0\r\n\r\n");
}

#[tokio::test]
async fn test_sink_failure_names_the_phase() {
    let mut writer = ResponseWriter::new(BrokenPipe);

    let err = writer.write_status_line(StatusCode::OK).await.unwrap_err();

    match err {
        WriteError::StatusLineWriteFailed(source) => {
            assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(writer.state(), WriterState::Init);
}

#[tokio::test]
async fn test_writer_stays_failed_after_sink_error() {
    let mut writer = ResponseWriter::new(BrokenPipe);
    assert!(!writer.has_failed());

    writer.write_status_line(StatusCode::OK).await.unwrap_err();
    assert!(writer.has_failed());

    let err = writer.write_status_line(StatusCode::OK).await.unwrap_err();
    assert!(matches!(
        err,
        WriteError::SinkFailed {
            operation: "write_status_line"
        }
    ));
    assert_eq!(writer.state(), WriterState::Init);
}

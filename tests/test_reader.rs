use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use httpwire::http::parser::ParseError;
use httpwire::http::reader::{ReadLimits, read_request};
use tokio::io::{AsyncRead, ReadBuf};

/// Hands out its data in the given fragments, one per read, then EOF.
struct Fragmented {
    chunks: VecDeque<Vec<u8>>,
}

impl Fragmented {
    fn new(data: &[u8], size: usize) -> Self {
        Self {
            chunks: data.chunks(size).map(|c| c.to_vec()).collect(),
        }
    }
}

impl AsyncRead for Fragmented {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(mut chunk) = self.chunks.pop_front() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            if n < chunk.len() {
                let rest = chunk.split_off(n);
                self.chunks.push_front(rest);
            }
        }
        Poll::Ready(Ok(()))
    }
}

const REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n";

#[tokio::test]
async fn test_read_request_from_fragments() {
    for size in [1, 2, 3, 7, 16, 1024] {
        let mut reader = Fragmented::new(REQUEST, size);

        let request = read_request(&mut reader, ReadLimits::default())
            .await
            .unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.target(), "/");
        assert_eq!(request.header("Host"), Some("localhost:42069"));
        assert_eq!(request.header("Accept"), Some("*/*"));
    }
}

#[tokio::test]
async fn test_read_request_with_tiny_read_buffer() {
    let mut reader = Fragmented::new(REQUEST, REQUEST.len());
    let limits = ReadLimits {
        read_buffer_size: 3,
        max_request_size: 1024,
    };

    let request = read_request(&mut reader, limits).await.unwrap();

    assert_eq!(request.header("user-agent"), Some("curl/7.81.0"));
}

#[tokio::test]
async fn test_head_larger_than_read_buffer_is_accepted() {
    let long_value = "x".repeat(3000);
    let data = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", long_value);
    let mut reader = Fragmented::new(data.as_bytes(), 512);

    let request = read_request(&mut reader, ReadLimits::default())
        .await
        .unwrap();

    assert_eq!(request.header("X-Long"), Some(long_value.as_str()));
}

#[tokio::test]
async fn test_request_too_large() {
    let data = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", "x".repeat(4096));
    let mut reader = Fragmented::new(data.as_bytes(), 100);
    let limits = ReadLimits {
        read_buffer_size: 64,
        max_request_size: 1024,
    };

    let result = read_request(&mut reader, limits).await;

    assert!(matches!(result, Err(ParseError::RequestTooLarge { limit: 1024 })));
}

#[tokio::test]
async fn test_unexpected_eof() {
    let mut reader = Fragmented::new(b"GET / HTTP/1.1\r\nHost: local", 4);

    let result = read_request(&mut reader, ReadLimits::default()).await;

    assert!(matches!(result, Err(ParseError::UnexpectedEof)));
}

#[tokio::test]
async fn test_empty_stream_is_unexpected_eof() {
    let mut reader: &[u8] = b"";

    let result = read_request(&mut reader, ReadLimits::default()).await;

    assert!(matches!(result, Err(ParseError::UnexpectedEof)));
}

#[tokio::test]
async fn test_malformed_request_line_is_reported() {
    let mut reader: &[u8] = b"GET /x\r\n\r\n";

    let result = read_request(&mut reader, ReadLimits::default()).await;

    assert!(matches!(result, Err(ParseError::MalformedRequestLine)));
}

#[tokio::test]
async fn test_unsupported_version_is_reported() {
    let mut reader: &[u8] = b"GET / HTTP/2.0\r\n\r\n";

    let result = read_request(&mut reader, ReadLimits::default()).await;

    assert!(matches!(result, Err(ParseError::UnsupportedHttpVersion(_))));
}

#[tokio::test]
async fn test_bytes_after_head_are_not_required() {
    let mut data = REQUEST.to_vec();
    data.extend_from_slice(b"unframed trailing data");
    let mut reader: &[u8] = &data;

    let request = read_request(&mut reader, ReadLimits::default())
        .await
        .unwrap();

    assert_eq!(request.target(), "/");
}

#[tokio::test]
async fn test_many_short_headers_hit_the_limit() {
    let mut data = b"GET / HTTP/1.1\r\n".to_vec();
    for i in 0..5000 {
        data.extend_from_slice(format!("X-H{}: v\r\n", i).as_bytes());
    }
    data.extend_from_slice(b"\r\n");
    let mut reader = Fragmented::new(&data, 1024);

    let result = read_request(&mut reader, ReadLimits::default()).await;

    assert!(matches!(result, Err(ParseError::RequestTooLarge { limit: 8192 })));
}

#[tokio::test]
async fn test_head_just_under_the_limit_is_accepted() {
    let mut data = b"GET / HTTP/1.1\r\n".to_vec();
    let mut count = 0;
    while data.len() + 16 < 1024 {
        data.extend_from_slice(format!("X-H{:04}: v\r\n", count).as_bytes());
        count += 1;
    }
    data.extend_from_slice(b"\r\n");
    let mut reader = Fragmented::new(&data, 10);
    let limits = ReadLimits {
        read_buffer_size: 64,
        max_request_size: 1024,
    };

    let request = read_request(&mut reader, limits).await.unwrap();

    assert_eq!(request.headers.len(), count);
}

#[tokio::test]
async fn test_zero_read_buffer_still_reads() {
    let mut reader = Fragmented::new(REQUEST, REQUEST.len());
    let limits = ReadLimits {
        read_buffer_size: 0,
        max_request_size: 1024,
    };

    let request = read_request(&mut reader, limits).await.unwrap();

    assert_eq!(request.header("Host"), Some("localhost:42069"));
}

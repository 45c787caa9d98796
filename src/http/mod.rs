//! HTTP/1.1 protocol implementation.
//!
//! This module implements the request and response halves of a single
//! HTTP/1.1 exchange. Every connection carries exactly one request and one
//! response and is then closed.
//!
//! # Architecture
//!
//! - **`headers`**: Case-insensitive header map and the per-line header parser
//! - **`parser`**: Incremental request-head parser state machine
//! - **`reader`**: Feeds socket reads into the parser until the head is complete
//! - **`request`**: Parsed request line and request
//! - **`response`**: Status codes and the default header policy
//! - **`writer`**: Ordered response writer (fixed-length and chunked bodies)
//! - **`handler`**: The application handler contract
//! - **`connection`**: Drives one connection from bytes in to bytes out
//!
//! # Parser State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Initial   │ ← Wait for a complete request line
//!        └──────┬──────┘
//!               │ METHOD SP TARGET SP HTTP/1.1 CRLF
//!               ▼
//!        ┌──────────────────┐
//!        │  ParsingHeaders  │ ← One `Name: Value` line per step
//!        └──────┬───────────┘
//!               │ blank CRLF
//!               ▼
//!        ┌──────────────────┐
//!        │       Done       │
//!        └──────────────────┘
//!
//!   any malformed input ──► Error (terminal)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use httpwire::http::connection::Connection;
//! use httpwire::http::reader::ReadLimits;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:42069").await?;
//!     let handler = std::sync::Arc::new(MyHandler);
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let conn = Connection::new(socket, peer, ReadLimits::default());
//!             if let Err(e) = conn.run(handler.as_ref()).await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod handler;
pub mod headers;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod writer;

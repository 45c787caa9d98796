//! Reverse proxy functionality
//!
//! This module forwards requests to a plain-HTTP upstream and streams the
//! upstream response body back to the caller.

pub mod upstream;

pub use upstream::{Upstream, UpstreamResponse};

//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with rustls, connection pooling and
//!   retry/backoff on throttling and server errors
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::builder()
//!     .timeout(Duration::from_secs(60))
//!     .verify_tls(true)
//!     .build()?;
//! ```

mod http;

pub use http::{ReqwestHttpClient, ReqwestHttpClientBuilder};

//! # Host Bridge Traits
//!
//! Platform abstraction traits that the drive accessor relies on but that
//! are implemented outside of it.
//!
//! ## Overview
//!
//! This crate defines the contract between the provider code and the
//! transport that actually talks to the network. The provider never builds a
//! socket or a TLS session itself: it hands an [`HttpRequest`] to an injected
//! [`HttpClient`] and gets an [`HttpResponse`] back. That keeps the provider
//! testable against scripted fakes and lets each host choose its own stack.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//!
//! ## Implementations
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert their native errors into `BridgeError`
//! with an actionable message (status code, timeout, connect failure).
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a single client can be shared
//! behind an `Arc` by several connectors.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};

//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the drive accessor:
//! - Logging and tracing infrastructure
//! - Configuration management for the Graph connection
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the provider crates depend
//! on. It establishes the logging conventions and the validated connection
//! settings (endpoint, credentials, timeout, TLS) shared by every request.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

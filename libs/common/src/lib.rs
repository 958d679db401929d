//! Shared library for cross-cutting concerns in Key Vault Manager crates.
//!
//! This crate provides centralized implementations for:
//! - HTTP client configuration and building
//! - Retry policies with exponential backoff
//! - Circuit breaker pattern for resilience
//! - Tracing initialization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use http::{HttpConfig, build_http_client};
pub use retry::{Retryable, RetryConfig, RetryPolicy};
pub use tracing_config::{TracingConfig, init_tracing};

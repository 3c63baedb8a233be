//! # Data Retrieval Module
//!
//! HTTP plumbing shared by the remote data sources.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, a JSON GET client with a request timeout
//!   and exponential-backoff retries for transient failures.

/// HTTP API client with retry middleware.
pub mod ky_http;

pub use ky_http::ApiClient;

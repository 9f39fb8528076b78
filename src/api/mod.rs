//! Sports-data API access
//!
//! - `retry` - bounded retry loop with backoff and rate-limit cooldown
//! - `transport` - HTTP seam (`reqwest` in production)
//! - `client` - endpoint fetcher and envelope handling

pub mod client;
pub mod retry;
pub mod transport;

pub use client::{ApiClient, Endpoint, FetchError};
pub use retry::{Attempt, RetryError, RetryPolicy};
pub use transport::{HttpResponse, HttpTransport, Transport, TransportError};

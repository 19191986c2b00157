//! Tile fetching.
//!
//! The prefetcher only needs a fetch to *happen*: the response lands in the
//! host's HTTP cache and the payload is discarded. [`TileFetcher`] is the
//! seam where hosts plug in their own network stack; [`ReqwestFetcher`] is
//! the default.

mod http;

pub use http::{ReqwestFetcher, DEFAULT_FETCH_TIMEOUT};

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from a single tile fetch.
///
/// A failed fetch is counted and otherwise ignored; it never aborts the
/// other fetches of its request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Request could not be sent or timed out.
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body could not be read.
    #[error("Failed to read response: {0}")]
    Body(String),

    /// The fetch was aborted through its cancellation token.
    #[error("Fetch cancelled")]
    Cancelled,

    /// The HTTP client could not be created.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Performs tile fetches.
///
/// Implementations should stop promptly once `cancel` fires. The caller
/// also drops the future on abort, so an implementation that ignores the
/// token is still correct, just slower to release resources.
pub trait TileFetcher: Send + Sync {
    /// Fetches `url`, discarding the payload.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), FetchError>>;
}

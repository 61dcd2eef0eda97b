//! Resilience patterns for the gallery load simulator
//!
//! This crate provides the retry policy and backoff calculation used by the
//! shared connection pool.

pub mod backoff;
pub mod retry;

// Re-export commonly used types
pub use backoff::BackoffCalculator;
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};

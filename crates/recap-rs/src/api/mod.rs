//! API interaction layer for the chat completions endpoint.
//!
//! - [`retry`] — bounded retry policy: which HTTP statuses are transient
//!   (429, 5xx) and how the exponential backoff schedule grows. The policy
//!   is a plain data object so [`PromptClient`](crate::PromptClient) can be
//!   exercised against a fake transport without real network calls.

pub mod retry;

pub use retry::RetryConfig;

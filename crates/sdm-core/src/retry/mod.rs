//! Per-chunk retry supervision.
//!
//! Wraps one chunk fetch with a bounded number of extra attempts separated by
//! a backoff delay, and reports the result as a [`ChunkOutcome`]. A chunk that
//! exhausts its attempts never cancels its siblings unless the caller passes
//! an abort flag and raises it.

mod error;
mod outcome;
mod policy;
mod run;

pub use error::ChunkError;
pub use outcome::ChunkOutcome;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

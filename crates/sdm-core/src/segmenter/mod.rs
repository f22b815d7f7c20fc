//! Range math and chunk planning.
//!
//! Splits a resource into contiguous, non-overlapping chunks (one per worker)
//! and picks the worker count from the object size when the caller does not.

mod range;
mod workers;

pub use range::{plan_chunks, ChunkPlan, ChunkRange};
pub use workers::{heuristic_worker_count, resolve_worker_count, GIB, MIB};

//! Destination file lifecycle and disk I/O.
//!
//! The destination is created (truncated) and pre-sized before any chunk
//! starts (fallocate on Linux when available, else set_len). All chunk tasks
//! share one handle and write with positioned writes (pwrite), so disjoint
//! ranges need no locking. The file stays where it is on failure.

mod builder;
mod writer;

pub use builder::DestinationFileBuilder;
pub use writer::DestinationFile;

//! Pure data types for mcgenstudy — job descriptors, outcomes, and errors.
//!
//! This crate is a leaf dependency with no async runtime and no process
//! handling. It exists so that consumers of scheduler results (report
//! writers, merge planners, external tooling) can work with them without
//! pulling in the kernel's runtime.

pub mod error;
pub mod job;
pub mod result;

// Flat re-exports for convenience
pub use error::*;
pub use job::*;
pub use result::*;

//! Low-level primitives the node codec is built on.

/// Little-endian field helpers and bounds-checked spans.
pub mod bytes;

/// Page storage interface and an in-memory implementation.
pub mod pager;

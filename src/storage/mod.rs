//! On-page data structures.

/// B+ tree node page format and codec.
pub mod node;

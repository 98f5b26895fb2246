//! On-page layout of B+ tree nodes.
//!
//! A node occupies one fixed-size page: a small header, a child-reference
//! table, an offset table, and packed key/value entries. The offset table lets
//! any entry be read in constant time. [`NodeCodec`] converts between pages and
//! the owned [`Node`] form and sizes nodes before they are written.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod primitives;
pub mod storage;
pub mod types;

pub use primitives::pager::{MemPageStore, PageStore, PagerOptions};
pub use storage::node::{
    decode, encode, estimate_entries, estimate_size, CodecOptions, InternalEntry, LeafEntry,
    Node, NodeCodec, NodeKind, NodePage, NodeRef, MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_SIZE,
};
pub use types::{PageError, PageId, Result};

#![forbid(unsafe_code)]

//! Fixed-size B+ tree node pages.
//!
//! [`page`] reads and writes fields of an encoded page in place; [`codec`]
//! converts between pages and the owned [`Node`] form and sizes candidate
//! nodes before they are written.

/// Node page layout constants and region arithmetic.
pub mod layout;

/// In-place accessor over node page buffers.
pub mod page;

mod codec;
mod stats;

pub use codec::{
    decode, encode, estimate_entries, estimate_size, CodecOptions, Entries, EntryRef,
    InternalEntry, LeafEntry, Node, NodeCodec, NodeRef,
};
pub use layout::{MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_SIZE};
pub use page::{NodeKind, NodePage};
pub use stats::{CodecStats, CodecStatsSnapshot};

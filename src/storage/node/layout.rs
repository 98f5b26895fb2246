//! Byte layout of a node page.
//!
//! ```text
//! | type | nkeys |  child refs  |   offsets   | entries ... | unused |
//! |  2B  |  2B   |  nkeys × 8B  | nkeys × 2B  |             |        |
//! ```
//!
//! Entries are `key_len:u16 | val_len:u16 | key | value`, packed back to back
//! from the end of the offset table. All integers are little-endian.
//!
//! The offset of entry 0 is always 0 and is not stored, so offset-table slot
//! `i - 1` holds the offset of entry `i`. The last slot therefore holds the
//! offset one past the final entry, which is what `size()` reads.

/// Size of every page buffer, in bytes.
pub const PAGE_SIZE: usize = 4069;
/// Largest key accepted, in bytes.
pub const MAX_KEY_SIZE: usize = 1000;
/// Largest value accepted, in bytes.
pub const MAX_VALUE_SIZE: usize = 3000;
/// Largest key count representable in the header.
pub const MAX_KEY_COUNT: usize = u16::MAX as usize;

/// Header length: node type plus key count.
pub const HEADER_LEN: usize = 4;
/// One child reference slot.
pub const CHILD_REF_LEN: usize = 8;
/// One offset-table slot.
pub const OFFSET_LEN: usize = 2;
/// Key and value length prefixes in front of each entry.
pub const ENTRY_HEADER_LEN: usize = 4;

pub(crate) const TYPE_POS: usize = 0;
pub(crate) const KEY_COUNT_POS: usize = 2;

/// Size of a node holding exactly one entry of maximal key and value size.
pub const MAX_SINGLE_ENTRY_NODE: usize =
    tables_len(1) + entry_size(MAX_KEY_SIZE, MAX_VALUE_SIZE);

// A lone maximal entry must always fit, otherwise splitting cannot make progress.
const _: () = assert!(MAX_SINGLE_ENTRY_NODE <= PAGE_SIZE);
// Offsets are u16.
const _: () = assert!(PAGE_SIZE <= u16::MAX as usize);

/// Bytes taken by the header, child references and offset table for `key_count` keys.
pub const fn tables_len(key_count: usize) -> usize {
    HEADER_LEN + key_count * (CHILD_REF_LEN + OFFSET_LEN)
}

/// Bytes one entry occupies in the key-value region.
pub const fn entry_size(key_len: usize, value_len: usize) -> usize {
    ENTRY_HEADER_LEN + key_len + value_len
}

pub(crate) const fn child_ref_pos(idx: usize) -> usize {
    HEADER_LEN + idx * CHILD_REF_LEN
}

/// Position of the stored offset of entry `idx` (`idx >= 1`).
pub(crate) const fn offset_pos(key_count: usize, idx: usize) -> usize {
    HEADER_LEN + key_count * CHILD_REF_LEN + (idx - 1) * OFFSET_LEN
}

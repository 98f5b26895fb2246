use std::convert::TryFrom;
use std::fmt;

use super::layout::{
    child_ref_pos, entry_size, offset_pos, tables_len, ENTRY_HEADER_LEN, HEADER_LEN,
    KEY_COUNT_POS, MAX_KEY_SIZE, MAX_VALUE_SIZE, TYPE_POS,
};
use crate::primitives::bytes::buf::{Cursor, Span};
use crate::primitives::bytes::le;
use crate::types::{PageError, PageId, Result};

/// Node type discriminator stored in the first two bytes of a page.
#[repr(u16)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// Separator keys with child page references.
    Internal = 0,
    /// Keys with values.
    Leaf = 1,
}

impl NodeKind {
    /// Returns the on-page discriminator.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Converts an on-page discriminator back to a kind.
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::Leaf),
            _ => Err(PageError::Malformed("unknown node type")),
        }
    }
}

/// In-place accessor over a node page buffer.
///
/// Reads need `B: AsRef<[u8]>`, writes additionally `B: AsMut<[u8]>`. The
/// accessor never allocates; wrap a `&[u8]` for read passes and a `&mut [u8]`
/// while building.
///
/// Index arguments are checked against the page's own key count and panic
/// when out of range. Use [`NodePage::verify`] before trusting bytes that came
/// from outside.
#[derive(Clone, Copy)]
pub struct NodePage<B> {
    buf: B,
}

impl<B> NodePage<B> {
    /// Wraps `buf` without inspecting it.
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    /// Returns the wrapped buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: AsRef<[u8]>> NodePage<B> {
    /// The whole underlying buffer, including any unused tail.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Raw type discriminator.
    pub fn node_type(&self) -> u16 {
        le::get_u16(self.as_bytes(), TYPE_POS)
    }

    /// Type discriminator as a [`NodeKind`].
    pub fn kind(&self) -> Result<NodeKind> {
        NodeKind::from_u16(self.node_type())
    }

    /// Number of entries recorded in the header.
    pub fn key_count(&self) -> u16 {
        le::get_u16(self.as_bytes(), KEY_COUNT_POS)
    }

    /// Child reference stored for entry `idx`.
    pub fn child_ref(&self, idx: usize) -> u64 {
        read_child_ref(self.as_bytes(), idx)
    }

    /// Child reference of entry `idx` as a page id.
    pub fn child_page(&self, idx: usize) -> PageId {
        PageId(self.child_ref(idx))
    }

    /// Offset of entry `idx` relative to the start of the key-value region.
    ///
    /// `idx == key_count()` yields the offset one past the last entry.
    pub fn offset(&self, idx: usize) -> u16 {
        read_offset(self.as_bytes(), idx)
    }

    /// Absolute byte position of entry `idx` within the page.
    pub fn entry_position(&self, idx: usize) -> usize {
        read_entry_position(self.as_bytes(), idx)
    }

    /// Key bytes of entry `idx`.
    pub fn key(&self, idx: usize) -> &[u8] {
        read_key(self.as_bytes(), idx)
    }

    /// Value bytes of entry `idx`.
    pub fn value(&self, idx: usize) -> &[u8] {
        read_value(self.as_bytes(), idx)
    }

    /// Serialized length of the node. Only meaningful once every entry has been appended.
    pub fn size(&self) -> usize {
        let key_count = self.key_count() as usize;
        self.entry_position(key_count)
    }

    /// Checks that the buffer holds a well-formed node.
    ///
    /// Never panics. On success every accessor call with `idx < key_count()`
    /// stays inside the buffer.
    pub fn verify(&self) -> Result<NodeKind> {
        verify_bytes(self.as_bytes())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> NodePage<B> {
    /// Writes the type discriminator and key count.
    ///
    /// The buffer must be large enough for `key_count` child and offset slots
    /// before any entry is appended.
    pub fn set_header(&mut self, kind: NodeKind, key_count: u16) {
        let buf = self.buf.as_mut();
        le::put_u16(buf, TYPE_POS, kind.as_u16());
        le::put_u16(buf, KEY_COUNT_POS, key_count);
    }

    /// Stores the child reference for entry `idx`.
    pub fn set_child_ref(&mut self, idx: usize, id: u64) {
        check_entry_index(self.as_bytes(), idx);
        le::put_u64(self.buf.as_mut(), child_ref_pos(idx), id);
    }

    /// Stores the offset of entry `idx`. Offset 0 is implicit, so `idx == 0` is ignored.
    pub fn set_offset(&mut self, idx: usize, value: u16) {
        if idx == 0 {
            return;
        }
        let key_count = self.key_count() as usize;
        assert!(
            idx <= key_count,
            "offset index {} out of range for {} keys",
            idx,
            key_count
        );
        le::put_u16(self.buf.as_mut(), offset_pos(key_count, idx), value);
    }

    /// Writes entry `idx` and records where entry `idx + 1` starts.
    ///
    /// Entries must be appended in order `0, 1, 2, ...`; each call relies on
    /// the offset left behind by the previous one. Out-of-order calls are not
    /// detected.
    pub fn append_entry(&mut self, idx: usize, child_ref: u64, key: &[u8], value: &[u8]) {
        self.set_child_ref(idx, child_ref);
        let key_len = u16::try_from(key.len())
            .unwrap_or_else(|_| panic!("key of {} bytes does not fit a u16 length", key.len()));
        let value_len = u16::try_from(value.len()).unwrap_or_else(|_| {
            panic!("value of {} bytes does not fit a u16 length", value.len())
        });
        let offset = self.offset(idx) as usize;
        let pos = self.entry_position(idx);
        let len = entry_size(key.len(), value.len());

        let buf = self.buf.as_mut();
        let page_len = buf.len();
        let dst = Span::new(pos, len).get_mut(buf).unwrap_or_else(|| {
            panic!(
                "entry {} needs bytes {}..{}, page has {}",
                idx,
                pos,
                pos + len,
                page_len
            )
        });
        let (lens, body) = dst.split_at_mut(ENTRY_HEADER_LEN);
        lens[..2].copy_from_slice(&key_len.to_le_bytes());
        lens[2..].copy_from_slice(&value_len.to_le_bytes());
        let (key_dst, value_dst) = body.split_at_mut(key.len());
        key_dst.copy_from_slice(key);
        value_dst.copy_from_slice(value);

        let next = u16::try_from(offset + len)
            .unwrap_or_else(|_| panic!("entry {} pushes the offset past u16", idx));
        self.set_offset(idx + 1, next);
    }
}

impl<B: AsRef<[u8]>> fmt::Debug for NodePage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.as_bytes();
        let mut dbg = f.debug_struct("NodePage");
        if bytes.len() >= HEADER_LEN {
            dbg.field("node_type", &self.node_type())
                .field("key_count", &self.key_count());
        }
        dbg.field("buf_len", &bytes.len()).finish()
    }
}

fn key_count_of(bytes: &[u8]) -> usize {
    le::get_u16(bytes, KEY_COUNT_POS) as usize
}

fn check_entry_index(bytes: &[u8], idx: usize) {
    let key_count = key_count_of(bytes);
    assert!(
        idx < key_count,
        "entry index {} out of range for {} keys",
        idx,
        key_count
    );
}

pub(crate) fn read_child_ref(bytes: &[u8], idx: usize) -> u64 {
    check_entry_index(bytes, idx);
    le::get_u64(bytes, child_ref_pos(idx))
}

pub(crate) fn read_offset(bytes: &[u8], idx: usize) -> u16 {
    if idx == 0 {
        return 0;
    }
    let key_count = key_count_of(bytes);
    assert!(
        idx <= key_count,
        "offset index {} out of range for {} keys",
        idx,
        key_count
    );
    le::get_u16(bytes, offset_pos(key_count, idx))
}

pub(crate) fn read_entry_position(bytes: &[u8], idx: usize) -> usize {
    tables_len(key_count_of(bytes)) + read_offset(bytes, idx) as usize
}

pub(crate) fn read_key(bytes: &[u8], idx: usize) -> &[u8] {
    let (key, _) = entry_spans(bytes, idx);
    entry_slice(bytes, key, idx)
}

pub(crate) fn read_value(bytes: &[u8], idx: usize) -> &[u8] {
    let (_, value) = entry_spans(bytes, idx);
    entry_slice(bytes, value, idx)
}

fn entry_spans(bytes: &[u8], idx: usize) -> (Span, Span) {
    check_entry_index(bytes, idx);
    let pos = read_entry_position(bytes, idx);
    let key_len = le::get_u16(bytes, pos) as usize;
    let value_len = le::get_u16(bytes, pos + 2) as usize;
    let key = Span::new(pos + ENTRY_HEADER_LEN, key_len);
    let value = Span::new(key.start + key_len, value_len);
    (key, value)
}

fn entry_slice(bytes: &[u8], span: Span, idx: usize) -> &[u8] {
    span.get(bytes)
        .unwrap_or_else(|| panic!("entry {} extends past the end of the page", idx))
}

pub(crate) fn verify_bytes(bytes: &[u8]) -> Result<NodeKind> {
    if bytes.len() < HEADER_LEN {
        return Err(PageError::Malformed("page shorter than node header"));
    }
    let kind = NodeKind::from_u16(le::get_u16(bytes, TYPE_POS))?;
    let key_count = key_count_of(bytes);
    let tables_end = tables_len(key_count);
    if tables_end > bytes.len() {
        return Err(PageError::Malformed("child and offset tables exceed page"));
    }
    let size = read_entry_position(bytes, key_count);
    if size > bytes.len() {
        return Err(PageError::Malformed("declared node size exceeds page"));
    }
    let node = &bytes[..size];
    let mut expected = 0usize;
    for idx in 0..key_count {
        if read_offset(bytes, idx) as usize != expected {
            return Err(PageError::Malformed("offset table out of sequence"));
        }
        let mut cursor = Cursor::at(node, tables_end + expected);
        let key_len = cursor.read_u16("entry header beyond node end")? as usize;
        let value_len = cursor.read_u16("entry header beyond node end")? as usize;
        if key_len > MAX_KEY_SIZE {
            return Err(PageError::Malformed("key longer than the key size limit"));
        }
        if value_len > MAX_VALUE_SIZE {
            return Err(PageError::Malformed("value longer than the value size limit"));
        }
        cursor.take(key_len + value_len, "entry body beyond node end")?;
        expected += entry_size(key_len, value_len);
    }
    if tables_end + expected != size {
        return Err(PageError::Malformed("node size disagrees with entry extents"));
    }
    Ok(kind)
}

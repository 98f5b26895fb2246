use std::cmp::Ordering;

use tracing::{debug, trace, warn};

use super::layout::{
    entry_size, tables_len, MAX_KEY_COUNT, MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_SIZE,
};
use super::page::{self, NodeKind, NodePage};
use super::stats::CodecStats;
use crate::types::{PageError, PageId, Result};

/// Key/value pair of a leaf node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafEntry {
    /// Key bytes
    pub key: Vec<u8>,
    /// Value bytes
    pub value: Vec<u8>,
}

impl LeafEntry {
    /// Creates a leaf entry.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Separator key and child page of an internal node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalEntry {
    /// Separator key bytes
    pub key: Vec<u8>,
    /// Page holding the child node
    pub child: PageId,
}

impl InternalEntry {
    /// Creates an internal entry.
    pub fn new(key: impl Into<Vec<u8>>, child: PageId) -> Self {
        Self {
            key: key.into(),
            child,
        }
    }
}

/// Logical, owned form of a node.
///
/// Internal entries are stored with an empty value and leaf entries with a
/// zero child reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Separator keys with child references, one per key.
    Internal(Vec<InternalEntry>),
    /// Keys with values.
    Leaf(Vec<LeafEntry>),
}

impl Node {
    /// The kind written to the page header.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Internal(_) => NodeKind::Internal,
            Node::Leaf(_) => NodeKind::Leaf,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Node::Internal(entries) => entries.len(),
            Node::Leaf(entries) => entries.len(),
        }
    }

    /// Returns true if the node has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key of entry `idx`.
    pub fn key(&self, idx: usize) -> &[u8] {
        self.parts(idx).1
    }

    /// Serialized size this node would have; see [`estimate_size`].
    pub fn estimated_size(&self) -> usize {
        estimate_size(self)
    }

    /// Whether [`NodeCodec::encode`] would accept the node's sizes.
    pub fn fits(&self) -> bool {
        check_capacity(self, PAGE_SIZE).is_ok()
    }

    /// `(child_ref, key, value)` as written to the page.
    fn parts(&self, idx: usize) -> (u64, &[u8], &[u8]) {
        match self {
            Node::Internal(entries) => {
                let entry = &entries[idx];
                (entry.child.0, entry.key.as_slice(), &[][..])
            }
            Node::Leaf(entries) => {
                let entry = &entries[idx];
                (0, entry.key.as_slice(), entry.value.as_slice())
            }
        }
    }
}

/// Serialized size of `node`, computed without touching a buffer.
///
/// Always equal to the `size()` of the page [`encode`] would produce.
pub fn estimate_size(node: &Node) -> usize {
    estimate_entries((0..node.len()).map(|idx| {
        let (_, key, value) = node.parts(idx);
        (key.len(), value.len())
    }))
}

/// Serialized size of a node holding entries with the given `(key_len, value_len)`.
///
/// Lets a caller size candidate key sets, for example while choosing a split
/// point, without materializing a [`Node`].
pub fn estimate_entries<I>(entries: I) -> usize
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let (count, body) = entries
        .into_iter()
        .fold((0usize, 0usize), |(count, body), (key_len, value_len)| {
            (count + 1, body + entry_size(key_len, value_len))
        });
    tables_len(count) + body
}

/// Tunables for [`NodeCodec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Refuse to encode nodes whose keys are not strictly ascending.
    pub check_key_order: bool,
    /// Zero the buffer after the encoded node so no stale bytes remain.
    pub zero_tail: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            check_key_order: true,
            zero_tail: true,
        }
    }
}

/// Converts between [`Node`] and page buffers, counting what it does.
#[derive(Debug, Default)]
pub struct NodeCodec {
    options: CodecOptions,
    stats: CodecStats,
}

impl NodeCodec {
    /// Creates a codec with the given options.
    pub fn new(options: CodecOptions) -> Self {
        Self {
            options,
            stats: CodecStats::default(),
        }
    }

    /// Options this codec was created with.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Counters for this codec.
    pub fn stats(&self) -> &CodecStats {
        &self.stats
    }

    /// Encodes `node` into a fresh `PAGE_SIZE` buffer.
    pub fn encode(&self, node: &Node) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; PAGE_SIZE];
        self.encode_into(node, &mut buf)?;
        Ok(buf)
    }

    /// Encodes `node` into `buf` and returns the serialized size.
    ///
    /// At most `PAGE_SIZE` bytes of `buf` are used. Nothing is written when
    /// the node is rejected.
    pub fn encode_into(&self, node: &Node, buf: &mut [u8]) -> Result<usize> {
        let limit = buf.len().min(PAGE_SIZE);
        let needed = match check_capacity(node, limit) {
            Ok(needed) => needed,
            Err(err) => {
                self.stats.inc_capacity_rejections();
                debug!(kind = ?node.kind(), keys = node.len(), error = %err, "node rejected for capacity");
                return Err(err);
            }
        };
        if self.options.check_key_order {
            check_key_order(node)?;
        }

        // bounded by check_capacity
        let key_count = node.len() as u16;
        let size = {
            let mut page = NodePage::new(&mut *buf);
            page.set_header(node.kind(), key_count);
            for idx in 0..node.len() {
                let (child, key, value) = node.parts(idx);
                page.append_entry(idx, child, key, value);
            }
            page.size()
        };
        debug_assert_eq!(size, needed, "size estimate diverged from encoded size");
        if self.options.zero_tail {
            buf[size..].fill(0);
        }
        self.stats.record_encode(size);
        trace!(kind = ?node.kind(), keys = node.len(), size, "encoded node");
        Ok(size)
    }

    /// Validates `buf` and exposes the node it holds without copying.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> Result<NodeRef<'a>> {
        match NodeRef::parse(buf) {
            Ok(node) => {
                self.stats.record_decode();
                trace!(kind = ?node.kind(), keys = node.len(), size = node.size(), "decoded node");
                Ok(node)
            }
            Err(err) => {
                self.stats.inc_malformed_rejections();
                warn!(len = buf.len(), error = %err, "rejected malformed node page");
                Err(err)
            }
        }
    }

    /// Same as [`estimate_size`].
    pub fn estimate_size(&self, node: &Node) -> usize {
        estimate_size(node)
    }
}

/// Encodes `node` with default options.
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    NodeCodec::default().encode(node)
}

/// Decodes `buf` with default options.
pub fn decode(buf: &[u8]) -> Result<NodeRef<'_>> {
    NodeCodec::default().decode(buf)
}

fn check_capacity(node: &Node, limit: usize) -> Result<usize> {
    for idx in 0..node.len() {
        let (_, key, value) = node.parts(idx);
        if key.len() > MAX_KEY_SIZE {
            return Err(PageError::CapacityExceeded {
                what: "key",
                needed: key.len(),
                limit: MAX_KEY_SIZE,
            });
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(PageError::CapacityExceeded {
                what: "value",
                needed: value.len(),
                limit: MAX_VALUE_SIZE,
            });
        }
    }
    if node.len() > MAX_KEY_COUNT {
        return Err(PageError::CapacityExceeded {
            what: "key count",
            needed: node.len(),
            limit: MAX_KEY_COUNT,
        });
    }
    let needed = estimate_size(node);
    if needed > limit {
        return Err(PageError::CapacityExceeded {
            what: "node",
            needed,
            limit,
        });
    }
    Ok(needed)
}

fn check_key_order(node: &Node) -> Result<()> {
    for idx in 1..node.len() {
        if node.key(idx - 1) >= node.key(idx) {
            return Err(PageError::Invalid("node keys must be strictly ascending"));
        }
    }
    Ok(())
}

/// One entry of a decoded node, borrowed from the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryRef<'a> {
    /// Key bytes
    pub key: &'a [u8],
    /// Value bytes (empty for internal nodes)
    pub value: &'a [u8],
    /// Child reference (zero for leaf nodes)
    pub child: PageId,
}

/// A verified node page, read in place.
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    kind: NodeKind,
    page: NodePage<&'a [u8]>,
}

impl<'a> NodeRef<'a> {
    fn parse(buf: &'a [u8]) -> Result<Self> {
        let page = NodePage::new(buf);
        let kind = page.verify()?;
        Ok(Self { kind, page })
    }

    /// Node kind from the header.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.page.key_count() as usize
    }

    /// Returns true if the node has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialized size of the node.
    pub fn size(&self) -> usize {
        self.page.size()
    }

    /// The underlying accessor.
    pub fn page(&self) -> NodePage<&'a [u8]> {
        self.page
    }

    /// Key of entry `idx`.
    pub fn key(&self, idx: usize) -> &'a [u8] {
        page::read_key(self.bytes(), idx)
    }

    /// Value of entry `idx`.
    pub fn value(&self, idx: usize) -> &'a [u8] {
        page::read_value(self.bytes(), idx)
    }

    /// Child page of entry `idx`.
    pub fn child(&self, idx: usize) -> PageId {
        PageId(page::read_child_ref(self.bytes(), idx))
    }

    /// Entry `idx` as a borrowed triple.
    pub fn entry(&self, idx: usize) -> EntryRef<'a> {
        EntryRef {
            key: self.key(idx),
            value: self.value(idx),
            child: self.child(idx),
        }
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> Entries<'a> {
        Entries {
            node: *self,
            next: 0,
        }
    }

    /// Binary search for `key`.
    ///
    /// `Ok(idx)` when present, otherwise `Err(idx)` with the position it would be inserted at.
    pub fn search(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        let mut lo = 0usize;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key(mid).cmp(key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    /// Copies the node into its owned form.
    pub fn to_node(&self) -> Node {
        match self.kind {
            NodeKind::Internal => Node::Internal(
                self.iter()
                    .map(|entry| InternalEntry::new(entry.key, entry.child))
                    .collect(),
            ),
            NodeKind::Leaf => Node::Leaf(
                self.iter()
                    .map(|entry| LeafEntry::new(entry.key, entry.value))
                    .collect(),
            ),
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.page.into_inner()
    }
}

/// Iterator over the entries of a [`NodeRef`].
pub struct Entries<'a> {
    node: NodeRef<'a>,
    next: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = EntryRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.node.len() {
            return None;
        }
        let entry = self.node.entry(self.next);
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.node.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Entries<'_> {}

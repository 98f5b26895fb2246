#![forbid(unsafe_code)]
//! Identifiers and error types shared by the node codec and its collaborators.

use std::fmt;

/// Identifier of a page owned by a [`crate::primitives::pager::PageStore`].
///
/// Internal nodes store these as their 64-bit child references.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PageId {
    fn from(value: u64) -> Self {
        PageId(value)
    }
}

impl From<PageId> for u64 {
    fn from(value: PageId) -> Self {
        value.0
    }
}

/// Recoverable errors surfaced by the node codec and page stores.
///
/// Broken caller preconditions (an index past the key count, say) are not
/// represented here; they panic.
#[derive(thiserror::Error, Debug)]
pub enum PageError {
    /// The input does not fit within the page or a per-entry limit.
    ///
    /// Callers are expected to split the input and retry.
    #[error("capacity exceeded: {what} needs {needed}, limit is {limit}")]
    CapacityExceeded {
        /// Which quantity overflowed (`"node"`, `"key"`, `"value"`, ...).
        what: &'static str,
        /// Amount the input requires.
        needed: usize,
        /// Largest amount allowed.
        limit: usize,
    },
    /// Bytes handed to the decoder are inconsistent with the node layout.
    #[error("malformed page: {0}")]
    Malformed(&'static str),
    /// A structurally valid request with unacceptable contents.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// The page store has no page with this id.
    #[error("page {0} not found")]
    NotFound(PageId),
}

impl PageError {
    /// Returns true for [`PageError::CapacityExceeded`].
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, PageError::CapacityExceeded { .. })
    }

    /// Returns true for [`PageError::Malformed`].
    pub fn is_malformed(&self) -> bool {
        matches!(self, PageError::Malformed(_))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PageError>;

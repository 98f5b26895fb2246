use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::storage::node::PAGE_SIZE;
use crate::types::{PageError, PageId, Result};

/// Shared, read-only handle to a stored page.
pub type PageRef = Arc<[u8]>;

/// Page storage consumed by the node codec's callers.
///
/// Pages are exactly [`PageStore::page_size`] bytes and addressed by
/// [`PageId`]. Id 0 is never allocated, so it can stand for "no page".
pub trait PageStore: 'static {
    /// Returns the page size in bytes.
    fn page_size(&self) -> usize;
    /// Reserves a zeroed page and returns its id.
    fn allocate(&self) -> Result<PageId>;
    /// Returns the current contents of `id`.
    fn read(&self, id: PageId) -> Result<PageRef>;
    /// Replaces the contents of `id`.
    fn write(&self, id: PageId, page: &[u8]) -> Result<()>;
    /// Releases `id` for reuse.
    fn free(&self, id: PageId) -> Result<()>;
}

/// Configuration for [`MemPageStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PagerOptions {
    /// Maximum number of live pages, unbounded when `None`.
    pub max_pages: Option<usize>,
}

struct StoreInner {
    pages: HashMap<PageId, PageRef>,
    free: Vec<PageId>,
    next_id: u64,
}

/// In-memory [`PageStore`].
///
/// Readers get an `Arc` snapshot of a page; `write` swaps in a new one, so a
/// page handed out earlier never changes underneath its reader.
pub struct MemPageStore {
    options: PagerOptions,
    inner: RwLock<StoreInner>,
}

impl MemPageStore {
    /// Creates an empty store.
    pub fn new(options: PagerOptions) -> Self {
        Self {
            options,
            inner: RwLock::new(StoreInner {
                pages: HashMap::new(),
                free: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of live pages.
    pub fn len(&self) -> usize {
        self.inner.read().pages.len()
    }

    /// Returns true if no page is allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Options this store was created with.
    pub fn options(&self) -> &PagerOptions {
        &self.options
    }
}

impl Default for MemPageStore {
    fn default() -> Self {
        Self::new(PagerOptions::default())
    }
}

impl PageStore for MemPageStore {
    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    fn allocate(&self) -> Result<PageId> {
        let mut inner = self.inner.write();
        if let Some(limit) = self.options.max_pages {
            if inner.pages.len() >= limit {
                return Err(PageError::CapacityExceeded {
                    what: "page store",
                    needed: inner.pages.len() + 1,
                    limit,
                });
            }
        }
        let id = match inner.free.pop() {
            Some(id) => id,
            None => {
                let id = PageId(inner.next_id);
                inner.next_id += 1;
                id
            }
        };
        inner.pages.insert(id, Arc::from(vec![0u8; PAGE_SIZE]));
        debug!(page = %id, live = inner.pages.len(), "allocated page");
        Ok(id)
    }

    fn read(&self, id: PageId) -> Result<PageRef> {
        self.inner
            .read()
            .pages
            .get(&id)
            .cloned()
            .ok_or(PageError::NotFound(id))
    }

    fn write(&self, id: PageId, page: &[u8]) -> Result<()> {
        if page.len() != PAGE_SIZE {
            return Err(PageError::Invalid("page buffer must be exactly PAGE_SIZE bytes"));
        }
        let mut inner = self.inner.write();
        let slot = inner.pages.get_mut(&id).ok_or(PageError::NotFound(id))?;
        *slot = Arc::from(page);
        Ok(())
    }

    fn free(&self, id: PageId) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.pages.remove(&id).is_none() {
            return Err(PageError::NotFound(id));
        }
        inner.free.push(id);
        debug!(page = %id, live = inner.pages.len(), "freed page");
        Ok(())
    }
}

#![forbid(unsafe_code)]

mod store;

pub use store::{MemPageStore, PageRef, PageStore, PagerOptions};

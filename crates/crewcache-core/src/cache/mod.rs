//! Caching: the in-memory listing cache behind every management screen,
//! and the on-disk snapshot mirror used at startup.
//!
//! The listing cache is the unit with real shape here: one bulk fetch per
//! collection, pure search/filter/pagination over the snapshot, and
//! mutation-driven invalidation. The disk mirror just lets screens render
//! before the first refresh completes; files go stale after 60 minutes.

pub mod listing;
pub mod manager;

pub use listing::{
    apply_view, ListingCache, LoadState, Searchable, ViewPage, ViewState, DEFAULT_PAGE_SIZE,
};
pub use manager::{CacheAges, CacheManager, CachedData};

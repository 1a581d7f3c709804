//! In-memory listing cache behind every management tab.
//!
//! Each screen holds one `ListingCache` over its collection: the store is
//! hit once for the whole collection, and every search keystroke or page
//! change is derived locally from the snapshot with `apply_view`. Mutations
//! call `invalidate` so the next `ensure_loaded` re-fetches.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;

use tracing::debug;

use crate::text::contains_ignore_case;

/// Default rows per page, matching the portal's table default.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes the UI cycles through.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 20, 50];

/// An entity that can be searched and filtered in a listing.
pub trait Searchable {
    /// Haystacks for the free-text search: name, email, and the secondary
    /// identifier where one exists. Matching is OR across all of them.
    fn search_keys(&self) -> Vec<&str>;

    /// Value of an equality-filterable field, lowercased canonical form.
    /// Unknown keys return `None` and never match.
    fn filter_value(&self, key: &str) -> Option<String>;
}

/// Search, filters, and pagination for one screen.
///
/// `page` is 1-based. Any change to the search text or the filters resets
/// `page` to 1 so the user never lands on a trailing empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
        self.page = 1;
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.page = 1;
    }

    /// Set an equality filter. An empty value removes the filter.
    pub fn set_filter(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.filters.remove(key);
        } else {
            self.filters.insert(key.to_string(), value.to_string());
        }
        self.page = 1;
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Reset search, filters, and pagination to defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || self.filters.values().any(|v| !v.is_empty())
    }

    /// Number of pages for `total` filtered rows (at least 1).
    pub fn page_count(&self, total: usize) -> usize {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.page_size)
        }
    }

    pub fn next_page(&mut self, total: usize) {
        if self.page < self.page_count(total) {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    /// Cycle to the next page size option and restart at page 1.
    pub fn cycle_page_size(&mut self) {
        let idx = PAGE_SIZE_OPTIONS
            .iter()
            .position(|&s| s == self.page_size)
            .unwrap_or(0);
        self.page_size = PAGE_SIZE_OPTIONS[(idx + 1) % PAGE_SIZE_OPTIONS.len()];
        self.page = 1;
    }
}

/// One derived page of a filtered listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPage<'a, T> {
    pub items: Vec<&'a T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<'a, T> ViewPage<'a, T> {
    /// 1-based index of the first row shown, 0 when the page is empty.
    pub fn first_row(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }

    /// 1-based index of the last row shown.
    pub fn last_row(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_row() + self.items.len() - 1
        }
    }
}

/// Derive a filtered, paginated page from a snapshot. Pure and
/// deterministic: the snapshot is never mutated, identical inputs produce
/// identical output, and a page past the end yields empty items with the
/// correct total.
pub fn apply_view<'a, T: Searchable>(records: &'a [T], view: &ViewState) -> ViewPage<'a, T> {
    let needle = view.search.trim().to_lowercase();

    let matched: Vec<&T> = records
        .iter()
        .filter(|r| {
            needle.is_empty()
                || r.search_keys()
                    .iter()
                    .any(|key| contains_ignore_case(key, &needle))
        })
        .filter(|r| {
            view.filters
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .all(|(key, value)| r.filter_value(key).as_deref() == Some(value.as_str()))
        })
        .collect();

    let total = matched.len();
    let start = view.page.saturating_sub(1) * view.page_size;
    let items = matched
        .into_iter()
        .skip(start)
        .take(view.page_size)
        .collect();

    ViewPage {
        items,
        total,
        page: view.page,
        page_size: view.page_size,
    }
}

/// Load state of a listing: `Idle -> Loading -> Ready`, with
/// `Ready -> Error -> Ready` on a failed fetch retried by explicit user
/// action only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Snapshot holder for one collection.
///
/// The snapshot is replaced wholesale by `install`; a failed fetch leaves
/// the previous snapshot untouched so the screen keeps showing stale data
/// alongside the error.
pub struct ListingCache<T> {
    records: Vec<T>,
    state: LoadState,
    dirty: bool,
    last_error: Option<String>,
}

impl<T> Default for ListingCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListingCache<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            state: LoadState::Idle,
            dirty: false,
            last_error: None,
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True when the next `ensure_loaded` would hit the store.
    pub fn needs_refresh(&self) -> bool {
        self.dirty || matches!(self.state, LoadState::Idle)
    }

    pub fn begin(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Replace the snapshot with a fresh fetch result.
    pub fn install(&mut self, records: Vec<T>) {
        self.records = records;
        self.state = LoadState::Ready;
        self.dirty = false;
        self.last_error = None;
    }

    /// Record a failed fetch. The previous snapshot is kept as-is.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = LoadState::Error;
        self.last_error = Some(message.into());
    }

    /// Force the next `ensure_loaded` to re-fetch, even within the same
    /// tick as a previous successful load. Called after every mutation.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Derive the current page for this snapshot.
    pub fn view(&self, view: &ViewState) -> ViewPage<'_, T>
    where
        T: Searchable,
    {
        apply_view(&self.records, view)
    }

    /// Fetch the collection if the snapshot is missing or invalidated.
    /// On error the snapshot is left unchanged and the error is recorded
    /// for the UI; nothing is retried automatically.
    pub async fn ensure_loaded<F, Fut, E>(&mut self, fetch: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        if !self.needs_refresh() {
            return Ok(());
        }

        self.begin();
        match fetch().await {
            Ok(records) => {
                debug!(count = records.len(), "listing fetched");
                self.install(records);
                Ok(())
            }
            Err(e) => {
                self.fail(e.to_string());
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Member {
        name: String,
        email: String,
        code: String,
        active: bool,
    }

    impl Member {
        fn new(name: &str, email: &str, code: &str, active: bool) -> Self {
            Self {
                name: name.to_string(),
                email: email.to_string(),
                code: code.to_string(),
                active,
            }
        }
    }

    impl Searchable for Member {
        fn search_keys(&self) -> Vec<&str> {
            vec![&self.name, &self.email, &self.code]
        }

        fn filter_value(&self, key: &str) -> Option<String> {
            match key {
                "status" => Some(if self.active { "active" } else { "inactive" }.to_string()),
                _ => None,
            }
        }
    }

    fn roster(n: usize) -> Vec<Member> {
        (0..n)
            .map(|i| {
                Member::new(
                    &format!("Member {i}"),
                    &format!("member{i}@example.com"),
                    &format!("EMP{i:03}"),
                    i % 2 == 0,
                )
            })
            .collect()
    }

    #[test]
    fn test_search_matches_only_matching_records() {
        let mut records = roster(5);
        records.push(Member::new("John Doe", "x@y.com", "EMP900", true));

        let mut view = ViewState::default();
        view.set_search("john");

        let page = apply_view(&records, &view);
        assert_eq!(page.total, 1);
        for item in &page.items {
            assert!(item
                .search_keys()
                .iter()
                .any(|k| contains_ignore_case(k, "john")));
        }
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut records = roster(5);
        records.push(Member::new("John Doe", "x@y.com", "EMP900", true));

        for query in ["JOHN", "john", "John"] {
            let mut view = ViewState::default();
            view.set_search(query);
            let page = apply_view(&records, &view);
            assert_eq!(page.total, 1, "query {query:?}");
            assert_eq!(page.items[0].name, "John Doe");
        }
    }

    #[test]
    fn test_search_covers_email_and_code() {
        let records = roster(5);

        let mut view = ViewState::default();
        view.set_search("member3@");
        assert_eq!(apply_view(&records, &view).total, 1);

        view.set_search("emp004");
        assert_eq!(apply_view(&records, &view).total, 1);
    }

    #[test]
    fn test_apply_view_never_mutates_snapshot() {
        let records = roster(12);
        let before = records.clone();

        let mut view = ViewState::default();
        view.set_search("member 1");
        view.set_filter("status", "active");
        let _ = apply_view(&records, &view);

        assert_eq!(records, before);
    }

    #[test]
    fn test_total_independent_of_pagination() {
        let records = roster(25);

        for (page, page_size) in [(1, 10), (2, 10), (3, 10), (1, 5), (7, 3)] {
            let view = ViewState {
                page,
                page_size,
                ..Default::default()
            };
            assert_eq!(apply_view(&records, &view).total, 25);
        }
    }

    #[test]
    fn test_apply_view_is_idempotent() {
        let records = roster(25);
        let mut view = ViewState::default();
        view.set_search("member 1");
        view.page = 2;
        view.page_size = 3;

        let first = apply_view(&records, &view);
        let second = apply_view(&records, &view);
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_beyond_last_is_empty_not_error() {
        let records = roster(25);
        let view = ViewState {
            page: 99,
            ..Default::default()
        };

        let page = apply_view(&records, &view);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.first_row(), 0);
    }

    #[test]
    fn test_first_page_of_25_records() {
        let records = roster(25);
        let page = apply_view(&records, &ViewState::default());

        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.first_row(), 1);
        assert_eq!(page.last_row(), 10);
    }

    #[test]
    fn test_equality_filters_are_anded() {
        let records = roster(10);

        let mut view = ViewState::default();
        view.set_filter("status", "active");
        assert_eq!(apply_view(&records, &view).total, 5);

        view.set_search("member 2");
        let page = apply_view(&records, &view);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].code, "EMP002");
    }

    #[test]
    fn test_empty_filter_value_is_ignored() {
        let records = roster(10);

        let mut view = ViewState::default();
        view.filters.insert("status".to_string(), String::new());
        assert_eq!(apply_view(&records, &view).total, 10);
    }

    #[test]
    fn test_unknown_filter_key_matches_nothing() {
        let records = roster(4);

        let mut view = ViewState::default();
        view.set_filter("department", "engineering");
        assert_eq!(apply_view(&records, &view).total, 0);
    }

    #[test]
    fn test_page_resets_on_search_and_filter_change() {
        let mut view = ViewState::default();
        view.page = 4;
        view.set_search("x");
        assert_eq!(view.page, 1);

        view.page = 3;
        view.set_filter("status", "active");
        assert_eq!(view.page, 1);

        view.page = 2;
        view.pop_search_char();
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_clear_restores_defaults() {
        let mut view = ViewState::default();
        view.set_search("abc");
        view.set_filter("status", "active");
        view.page_size = 50;
        view.clear();

        assert_eq!(view, ViewState::default());
        assert!(!view.is_filtered());
    }

    #[test]
    fn test_page_count_and_navigation() {
        let mut view = ViewState::default();
        assert_eq!(view.page_count(0), 1);
        assert_eq!(view.page_count(25), 3);
        assert_eq!(view.page_count(30), 3);

        view.next_page(25);
        view.next_page(25);
        view.next_page(25); // clamped at last page
        assert_eq!(view.page, 3);

        view.prev_page();
        view.prev_page();
        view.prev_page(); // clamped at first page
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_cycle_page_size_resets_page() {
        let mut view = ViewState::default();
        view.page = 2;
        view.cycle_page_size();
        assert_eq!(view.page_size, 20);
        assert_eq!(view.page, 1);
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once_while_fresh() {
        let fetches = AtomicUsize::new(0);
        let mut cache: ListingCache<Member> = ListingCache::new();

        for _ in 0..3 {
            cache
                .ensure_loaded(|| async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(roster(4))
                })
                .await
                .unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_in_same_tick() {
        let fetches = AtomicUsize::new(0);
        let mut cache: ListingCache<Member> = ListingCache::new();

        let fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(roster(2))
        };

        cache.ensure_loaded(fetch).await.unwrap();
        cache.invalidate();
        cache.ensure_loaded(fetch).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let mut cache: ListingCache<Member> = ListingCache::new();
        cache.install(roster(3));
        cache.invalidate();

        let result = cache
            .ensure_loaded(|| async { Err::<Vec<Member>, _>("store unreachable".to_string()) })
            .await;

        assert!(result.is_err());
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.state(), LoadState::Error);
        assert_eq!(cache.last_error(), Some("store unreachable"));
        // Still dirty: an explicit retry will hit the store again
        assert!(cache.needs_refresh());
    }
}

//! Per-screen table rendering.
//!
//! Every tab is the same shape: a table over the current page of the
//! screen's listing cache, with a footer describing pagination and any
//! active search/filter.

pub mod applications;
pub mod attendance;
pub mod budgets;
pub mod campus;
pub mod postings;
pub mod users;

use crewcache_core::cache::{ViewPage, ViewState};

/// Footer line under each table: page position, row range, and the active
/// search/filter, if any.
pub(crate) fn footer_text<T>(page: &ViewPage<'_, T>, view: &ViewState) -> String {
    let pages = view.page_count(page.total);
    let mut text = if page.items.is_empty() {
        format!(" Page {}/{} - no rows", page.page, pages)
    } else {
        format!(
            " Page {}/{} - rows {}-{} of {}",
            page.page,
            pages,
            page.first_row(),
            page.last_row(),
            page.total
        )
    };

    if let Some(status) = view.filter("status") {
        text.push_str(&format!(" - filter: {}", status));
    }
    if !view.search.is_empty() {
        text.push_str(&format!(" - search: \"{}\"", view.search));
    }
    text.push_str(&format!(" - {} per page", view.page_size));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewcache_core::cache::apply_view;
    use crewcache_core::cache::Searchable;

    struct Row(String);

    impl Searchable for Row {
        fn search_keys(&self) -> Vec<&str> {
            vec![&self.0]
        }
        fn filter_value(&self, _key: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_footer_text_shapes() {
        let records: Vec<Row> = (0..25).map(|i| Row(format!("row{i}"))).collect();
        let mut view = ViewState::default();

        let page = apply_view(&records, &view);
        let text = footer_text(&page, &view);
        assert!(text.contains("Page 1/3"));
        assert!(text.contains("rows 1-10 of 25"));

        view.set_search("nothing-matches");
        let page = apply_view(&records, &view);
        let text = footer_text(&page, &view);
        assert!(text.contains("no rows"));
        assert!(text.contains("search: \"nothing-matches\""));
    }
}

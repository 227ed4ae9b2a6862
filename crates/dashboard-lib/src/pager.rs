//! Pagination, sort and filter state of the history view
//!
//! Every transition that needs new data returns the descriptor to fetch.
//! `None` means the transition was a no-op and nothing should be requested.

use crate::models::{FilterState, PageState, SortOrder};
use crate::query::{self, QueryDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPager {
    filters: FilterState,
    sort: SortOrder,
    page: PageState,
}

impl Default for HistoryPager {
    fn default() -> Self {
        Self::new(PageState::default().page_size)
    }
}

impl HistoryPager {
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: FilterState::default(),
            sort: SortOrder::default(),
            page: PageState::first(page_size),
        }
    }

    /// Start from the given filters and sort order on the first page
    pub fn with_view(mut self, filters: FilterState, sort: SortOrder) -> Self {
        self.filters = filters;
        self.sort = sort;
        self.page.page_number = 1;
        self
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn page_number(&self) -> u32 {
        self.page.page_number
    }

    /// Change sort order and go back to the first page
    pub fn set_sort(&mut self, order: SortOrder) -> Option<QueryDescriptor> {
        self.sort = order;
        self.page.page_number = 1;
        Some(self.refresh())
    }

    /// Replace filters and go back to the first page
    pub fn set_filters(&mut self, filters: FilterState) -> Option<QueryDescriptor> {
        self.filters = filters;
        self.page.page_number = 1;
        Some(self.refresh())
    }

    /// Advance one page. The service answers pages past the end with an empty list.
    pub fn next_page(&mut self) -> Option<QueryDescriptor> {
        self.page.page_number = self.page.page_number.saturating_add(1);
        Some(self.refresh())
    }

    /// Go back one page; no-op on the first page
    pub fn prev_page(&mut self) -> Option<QueryDescriptor> {
        if self.page.page_number <= 1 {
            return None;
        }
        self.page.page_number -= 1;
        Some(self.refresh())
    }

    /// Jump to `page` (clamped to 1), keeping filters and sort order
    pub fn go_to_page(&mut self, page: u32) -> Option<QueryDescriptor> {
        self.page.page_number = page.max(1);
        Some(self.refresh())
    }

    /// Descriptor for the current state
    pub fn refresh(&self) -> QueryDescriptor {
        query::build(&self.filters, self.sort, self.page)
    }

    /// Descriptor for a CSV export of the current filters and sort order
    pub fn export_query(&self) -> QueryDescriptor {
        query::build_export(&self.filters, self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    #[test]
    fn test_prev_page_is_noop_on_first_page() {
        let mut pager = HistoryPager::new(10);
        assert!(pager.prev_page().is_none());
        assert_eq!(pager.page_number(), 1);
    }

    #[test]
    fn test_next_then_prev() {
        let mut pager = HistoryPager::new(10);
        let q = pager.next_page().unwrap();
        assert_eq!(q.get("page"), Some("2"));
        let q = pager.next_page().unwrap();
        assert_eq!(q.get("page"), Some("3"));
        let q = pager.prev_page().unwrap();
        assert_eq!(q.get("page"), Some("2"));
        assert_eq!(pager.page_number(), 2);
    }

    #[test]
    fn test_set_sort_resets_page() {
        let mut pager = HistoryPager::new(10);
        pager.next_page();
        pager.next_page();

        let q = pager.set_sort(SortOrder::Asc).unwrap();
        assert_eq!(pager.page_number(), 1);
        assert_eq!(q.to_query_string(), "?order=ASC&page=1&limit=10");
    }

    #[test]
    fn test_set_filters_resets_page() {
        let mut pager = HistoryPager::new(10);
        pager.next_page();

        let q = pager
            .set_filters(FilterState::default().risk_level(RiskLevel::High))
            .unwrap();
        assert_eq!(pager.page_number(), 1);
        assert_eq!(q.to_query_string(), "?order=DESC&page=1&limit=10&risk=HIGH");
    }

    #[test]
    fn test_refresh_reflects_state_without_mutating() {
        let mut pager = HistoryPager::new(5);
        pager.next_page();
        let before = pager.clone();
        assert_eq!(pager.refresh(), pager.refresh());
        assert_eq!(pager, before);
        assert_eq!(pager.refresh().get("limit"), Some("5"));
    }

    #[test]
    fn test_go_to_page_clamps_to_first() {
        let mut pager = HistoryPager::new(10);
        assert_eq!(pager.go_to_page(4).unwrap().get("page"), Some("4"));
        assert_eq!(pager.go_to_page(0).unwrap().get("page"), Some("1"));
        assert_eq!(pager.page_number(), 1);
    }

    #[test]
    fn test_with_view_presets_without_paging() {
        let pager = HistoryPager::new(20)
            .with_view(FilterState::default().machine("M-9"), SortOrder::Asc);
        assert_eq!(
            pager.refresh().to_query_string(),
            "?order=ASC&page=1&limit=20&machine=M-9"
        );
    }

    #[test]
    fn test_export_query_keeps_filters_drops_paging() {
        let mut pager = HistoryPager::new(10);
        pager.set_filters(FilterState::default().machine("M-3"));
        pager.next_page();
        assert_eq!(
            pager.export_query().to_query_string(),
            "?order=DESC&machine=M-3&export=csv"
        );
    }
}

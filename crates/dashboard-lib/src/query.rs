//! Canonical history query descriptors
//!
//! Key emission order is fixed: `order`, `page`, `limit`, then the optional
//! filters `machine`, `risk`, `date`. Equal inputs always serialize to the
//! same bytes, so a descriptor doubles as a cache/staleness key.

use std::fmt;
use url::form_urlencoded;

use crate::models::{FilterState, PageState, SortOrder};

/// Immutable query against the history service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    sort: SortOrder,
    params: Vec<(&'static str, String)>,
}

impl QueryDescriptor {
    /// Sort order the page was requested in
    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Parameters in emission order
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Value of a single parameter, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query string including the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut out = String::from("?");
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(key);
            out.push('=');
            out.extend(form_urlencoded::byte_serialize(value.as_bytes()));
        }
        out
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Build the descriptor for one history page.
pub fn build(filters: &FilterState, sort: SortOrder, page: PageState) -> QueryDescriptor {
    let mut params = vec![
        ("order", sort.as_str().to_string()),
        ("page", page.page_number.max(1).to_string()),
        ("limit", page.page_size.max(1).to_string()),
    ];
    push_filters(&mut params, filters);
    QueryDescriptor { sort, params }
}

/// Build the descriptor for a CSV export of the whole filtered history.
///
/// Pagination keys are left out; the service ignores them for exports.
pub fn build_export(filters: &FilterState, sort: SortOrder) -> QueryDescriptor {
    let mut params = vec![("order", sort.as_str().to_string())];
    push_filters(&mut params, filters);
    params.push(("export", "csv".to_string()));
    QueryDescriptor { sort, params }
}

fn push_filters(params: &mut Vec<(&'static str, String)>, filters: &FilterState) {
    if let Some(machine) = filters.machine.as_deref().map(str::trim) {
        if !machine.is_empty() {
            params.push(("machine", machine.to_string()));
        }
    }
    if let Some(risk) = filters.risk_level {
        params.push(("risk", risk.as_str().to_string()));
    }
    if let Some(date) = filters.date {
        params.push(("date", date.format("%Y-%m-%d").to_string()));
    }
}

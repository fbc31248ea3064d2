//! List view data pipeline
//!
//! Every list view runs the same staged transformation over whatever
//! collection the data source returned:
//!
//! ```text
//! original -> filter -> search -> sort -> [paginate, client mode only]
//! ```
//!
//! Each view supplies a closed filter struct implementing [`ViewFilters`]
//! and an item type implementing [`Searchable`]. Stage functions are total:
//! malformed fields degrade instead of failing, so one bad record cannot
//! blank the list.

pub mod filter;
pub mod paginate;
pub mod query;
pub mod search;
pub mod sort;
pub mod view;

use chrono::NaiveDate;
use std::cmp::Ordering;

pub use filter::{apply_filters, AmountBuckets, AmountRange, DateRange};
pub use paginate::{paginate, Page, PageError, PageInfo};
pub use query::QueryState;
pub use search::{apply_search, Searchable};
pub use sort::{compare_values, sort_items, ColumnSort, Direction, SortValue};
pub use view::{FetchTicket, ListSummary, ListView, PageChange, PaginationMode};

/// A view's complete filter configuration
pub trait ViewFilters<T>: Clone + Default + PartialEq {
    /// Whether `item` satisfies every active predicate
    fn matches(&self, item: &T, today: NaiveDate) -> bool;

    /// Ordering for the sort stage
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Whether anything differs from the default selection
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Run filter, search and sort over `items`, returning a new collection
pub fn process<T, F>(items: &[T], filters: &F, search: &str, today: NaiveDate) -> Vec<T>
where
    T: Clone + Searchable,
    F: ViewFilters<T>,
{
    let filtered = apply_filters(items, filters, today);
    let searched = apply_search(&filtered, search);
    sort_items(&searched, |a, b| filters.compare(a, b))
}

//! List view controller
//!
//! Holds the fetched collection apart from the displayed one, runs the
//! pipeline whenever the query changes, and fences out stale fetch
//! responses with a monotonic request id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::notice::Notice;
use crate::core::sequence::{RequestId, RequestSequencer};
use crate::pipeline::paginate::{check_page, paginate, total_pages, Page, PageError, PageInfo};
use crate::pipeline::query::QueryState;
use crate::pipeline::search::{normalize_query, Searchable};
use crate::pipeline::{process, ViewFilters};

/// Where paging happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// The full collection is held and sliced locally
    #[default]
    Client,
    /// The data source returns one page at a time
    Server,
}

impl std::fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaginationMode::Client => write!(f, "client"),
            PaginationMode::Server => write!(f, "server"),
        }
    }
}

impl std::str::FromStr for PaginationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(PaginationMode::Client),
            "server" => Ok(PaginationMode::Server),
            _ => Err(format!("Unknown pagination mode: {}. Use client or server", s)),
        }
    }
}

/// A fetch the view is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: RequestId,
    pub page: usize,
    pub limit: usize,
}

/// Result of a page change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    /// Page switched locally
    Local,
    /// The caller must fetch this page and hand it to `complete_fetch`
    Fetch(FetchTicket),
}

/// Counts describing what the view currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSummary {
    pub page: usize,
    pub limit: usize,
    /// Size of the full collection known to the view
    pub total: usize,
    /// Items left after filter and search
    pub filtered: usize,
    pub total_pages: usize,
}

/// State for one list view
#[derive(Debug)]
pub struct ListView<T, F> {
    mode: PaginationMode,
    query: QueryState<F>,
    original: Vec<T>,
    displayed: Vec<T>,
    server_page: Option<PageInfo>,
    sequencer: RequestSequencer,
    today: NaiveDate,
}

impl<T, F> ListView<T, F>
where
    T: Clone + Searchable,
    F: ViewFilters<T>,
{
    pub fn new(mode: PaginationMode, limit: usize, today: NaiveDate) -> Self {
        Self {
            mode,
            query: QueryState::new(limit),
            original: Vec::new(),
            displayed: Vec::new(),
            server_page: None,
            sequencer: RequestSequencer::new(),
            today,
        }
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn query(&self) -> &QueryState<F> {
        &self.query
    }

    /// The collection as fetched, before any stage ran
    pub fn original(&self) -> &[T] {
        &self.original
    }

    /// The processed collection, before client-side slicing
    pub fn displayed(&self) -> &[T] {
        &self.displayed
    }

    /// Replace the held collection with a full, locally held set
    pub fn load(&mut self, items: Vec<T>) {
        self.original = items;
        self.server_page = None;
        self.query.page = 1;
        self.refresh();
    }

    /// Register a fetch for `page`; any earlier outstanding fetch becomes stale
    pub fn begin_fetch(&mut self, page: usize) -> FetchTicket {
        let id = self.sequencer.issue();
        debug!(request = %id, page, "fetch issued");
        FetchTicket {
            id,
            page,
            limit: self.query.limit,
        }
    }

    /// Accept a response if it belongs to the latest fetch.
    ///
    /// Returns `false` and leaves the view untouched for stale responses.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, response: Page<T>) -> bool {
        if !self.sequencer.is_latest(ticket.id) {
            warn!(request = %ticket.id, "discarding stale response");
            return false;
        }

        self.original = response.data;
        match self.mode {
            PaginationMode::Server => {
                self.query.page = response.pagination.page.max(1);
                self.server_page = Some(response.pagination);
            }
            PaginationMode::Client => {
                self.query.page = 1;
                self.server_page = None;
            }
        }
        self.refresh();
        true
    }

    /// Record a failed fetch; the view keeps its previous state
    pub fn fail_fetch(&mut self, ticket: &FetchTicket, message: &str) -> Option<Notice> {
        if !self.sequencer.is_latest(ticket.id) {
            debug!(request = %ticket.id, "ignoring failure of stale request");
            return None;
        }
        warn!(request = %ticket.id, error = message, "fetch failed");
        Some(Notice::error(format!("Failed to load page {}: {}", ticket.page, message)))
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.set_search(search);
        self.after_query_change();
    }

    pub fn set_filters(&mut self, filters: F) {
        self.query.set_filters(filters);
        self.after_query_change();
    }

    /// Restore the default query and show the fetched collection as-is
    pub fn reset_filters(&mut self) {
        let page = self.query.page;
        self.query.reset();
        if self.mode == PaginationMode::Server {
            self.query.page = page;
        }
        self.displayed = self.original.clone();
    }

    /// Move to another page.
    ///
    /// In client mode an out-of-range page is rejected and nothing changes.
    /// In server mode the caller receives a ticket to fetch the new page.
    pub fn change_page(&mut self, page: usize) -> Result<PageChange, PageError> {
        match self.mode {
            PaginationMode::Client => {
                check_page(page, self.query.limit, self.displayed.len())?;
                self.query.page = page;
                Ok(PageChange::Local)
            }
            PaginationMode::Server => {
                if let Some(info) = self.server_page {
                    check_page(page, info.limit.max(1), info.total)?;
                } else if page == 0 {
                    return Err(PageError::OutOfRange {
                        requested: page,
                        total_pages: 1,
                    });
                }
                Ok(PageChange::Fetch(self.begin_fetch(page)))
            }
        }
    }

    /// The rows to render right now
    pub fn visible(&self) -> &[T] {
        match self.mode {
            PaginationMode::Client => paginate(&self.displayed, self.query.page, self.query.limit),
            PaginationMode::Server => &self.displayed,
        }
    }

    pub fn summary(&self) -> ListSummary {
        match (self.mode, self.server_page) {
            (PaginationMode::Server, Some(info)) => ListSummary {
                page: info.page,
                limit: info.limit,
                total: info.total,
                filtered: self.displayed.len(),
                total_pages: info.total_pages(),
            },
            _ => ListSummary {
                page: self.query.page,
                limit: self.query.limit,
                total: self.original.len(),
                filtered: self.displayed.len(),
                total_pages: total_pages(self.displayed.len(), self.query.limit),
            },
        }
    }

    /// Whether search or filters narrow or reorder the collection
    pub fn filters_active(&self) -> bool {
        !self.query.filters.is_default() || normalize_query(&self.query.search).is_some()
    }

    fn after_query_change(&mut self) {
        if self.mode == PaginationMode::Client {
            self.query.page = 1;
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.displayed = process(
            &self.original,
            &self.query.filters,
            &self.query.search,
            self.today,
        );
    }
}

//! Query state holder - search text, filter selection and page cursor

/// Ephemeral query state owned by one list view
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<F> {
    pub search: String,
    pub filters: F,
    pub page: usize,
    pub limit: usize,
}

impl<F: Default> QueryState<F> {
    pub fn new(limit: usize) -> Self {
        Self {
            search: String::new(),
            filters: F::default(),
            page: 1,
            limit: limit.max(1),
        }
    }

    /// Replace the whole filter value; callers build the full struct themselves
    pub fn set_filters(&mut self, filters: F) {
        self.filters = filters;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Restore default filters, clear the search, and go back to the first page
    pub fn reset(&mut self) {
        self.search.clear();
        self.filters = F::default();
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Probe {
        category: Option<String>,
        statuses: Vec<u8>,
    }

    #[test]
    fn test_set_filters_replaces_whole_value() {
        let mut q = QueryState::<Probe>::new(10);
        q.set_filters(Probe {
            category: Some("tech".into()),
            statuses: vec![1],
        });
        q.set_filters(Probe {
            category: None,
            statuses: vec![2],
        });
        assert_eq!(q.filters.category, None);
        assert_eq!(q.filters.statuses, vec![2]);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut q = QueryState::<Probe>::new(10);
        q.set_search("water");
        q.page = 3;
        q.filters.statuses.push(4);
        q.reset();
        assert_eq!(q, QueryState::new(10));
    }

    #[test]
    fn test_zero_limit_clamped() {
        assert_eq!(QueryState::<Probe>::new(0).limit, 1);
    }
}

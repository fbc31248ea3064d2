//! Search stage - case-insensitive substring match over a fixed field list

/// Items that expose the text fields a free-text query is matched against
pub trait Searchable {
    /// Field values to search; absent fields are returned as `""`
    fn search_fields(&self) -> Vec<&str>;

    /// Whether the already lower-cased `needle` occurs in any field
    fn matches_query(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Normalize a raw query; blank input yields `None`
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Keep items where the query occurs in at least one search field
pub fn apply_search<T>(items: &[T], query: &str) -> Vec<T>
where
    T: Clone + Searchable,
{
    match normalize_query(query) {
        None => items.to_vec(),
        Some(needle) => items
            .iter()
            .filter(|item| item.matches_query(&needle))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        title: String,
        note: Option<String>,
    }

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.title.as_str(), self.note.as_deref().unwrap_or("")]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                title: "Clean Water".into(),
                note: None,
            },
            Row {
                title: "School Books".into(),
                note: Some("water damaged".into()),
            },
            Row {
                title: "Solar Lamps".into(),
                note: None,
            },
        ]
    }

    #[test]
    fn test_blank_query_is_noop() {
        assert_eq!(apply_search(&rows(), ""), rows());
        assert_eq!(apply_search(&rows(), "   "), rows());
    }

    #[test]
    fn test_case_insensitive_across_fields() {
        let hits = apply_search(&rows(), "WATER");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Clean Water");
        assert_eq!(hits[1].title, "School Books");
    }

    #[test]
    fn test_results_subset_of_blank_query() {
        let all = apply_search(&rows(), "");
        for q in ["sol", "books", "zzz", "a"] {
            let hits = apply_search(&rows(), q);
            assert!(hits.iter().all(|h| all.contains(h)));
        }
    }

    #[test]
    fn test_missing_field_does_not_match() {
        assert!(apply_search(&rows(), "damaged").len() == 1);
    }
}

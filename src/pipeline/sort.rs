//! Sort stage - typed comparators and column header sorting

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// The opposite direction
    pub fn toggled(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Asc),
            "desc" | "descending" => Ok(Direction::Desc),
            _ => Err(format!("Unknown direction: {}. Use asc or desc", s)),
        }
    }
}

/// A value extracted from an item for comparison
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// Numeric field; NaN marks a malformed or missing value
    Number(f64),
    /// Timestamp field; `None` marks a missing or unparseable value
    Time(Option<DateTime<Utc>>),
    /// Text field, compared case-insensitively
    Text(String),
}

/// Stand-in for an absent end date so open-ended campaigns sort last
pub fn far_future() -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(2099, 12, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    Utc.from_utc_datetime(&date)
}

/// Compare two extracted values in the given direction.
///
/// NaN numbers and absent times always sort last regardless of direction,
/// so a bad record never jumps to the top of a descending list.
pub fn compare_values(a: &SortValue, b: &SortValue, direction: Direction) -> Ordering {
    let directed = |ord: Ordering| match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    };

    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => directed(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        },
        (SortValue::Time(x), SortValue::Time(y)) => match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => directed(x.cmp(y)),
        },
        (SortValue::Text(x), SortValue::Text(y)) => directed(x.to_lowercase().cmp(&y.to_lowercase())),
        _ => Ordering::Equal,
    }
}

/// Copy then stable-sort a collection; the input slice is left untouched
pub fn sort_items<T, F>(items: &[T], compare: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| compare(a, b));
    sorted
}

/// Column header sort state for table views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSort<C> {
    pub column: C,
    pub direction: Direction,
}

impl<C: Copy + PartialEq> ColumnSort<C> {
    pub fn new(column: C) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    /// Apply a header click: the active column toggles, a new column starts ascending
    pub fn click(&mut self, column: C) {
        if self.column == column {
            self.direction = self.direction.toggled();
        } else {
            self.column = column;
            self.direction = Direction::Asc;
        }
    }
}

impl<C: Default + Copy + PartialEq> Default for ColumnSort<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64], direction: Direction) -> Vec<f64> {
        let mut v: Vec<f64> = values.to_vec();
        v.sort_by(|a, b| compare_values(&SortValue::Number(*a), &SortValue::Number(*b), direction));
        v
    }

    #[test]
    fn test_nan_sorts_last_in_both_directions() {
        let asc = numbers(&[3.0, f64::NAN, 1.0, 2.0], Direction::Asc);
        assert_eq!(&asc[..3], &[1.0, 2.0, 3.0]);
        assert!(asc[3].is_nan());

        let desc = numbers(&[3.0, f64::NAN, 1.0, 2.0], Direction::Desc);
        assert_eq!(&desc[..3], &[3.0, 2.0, 1.0]);
        assert!(desc[3].is_nan());
    }

    #[test]
    fn test_missing_time_sorts_last() {
        let t = far_future();
        let some = SortValue::Time(Some(t));
        let none = SortValue::Time(None);
        assert_eq!(compare_values(&none, &some, Direction::Asc), Ordering::Greater);
        assert_eq!(compare_values(&none, &some, Direction::Desc), Ordering::Greater);
    }

    #[test]
    fn test_text_case_insensitive() {
        let a = SortValue::Text("alpha".to_string());
        let b = SortValue::Text("Beta".to_string());
        assert_eq!(compare_values(&a, &b, Direction::Asc), Ordering::Less);
        assert_eq!(compare_values(&a, &b, Direction::Desc), Ordering::Greater);
        assert_eq!(
            compare_values(
                &SortValue::Text("ABC".into()),
                &SortValue::Text("abc".into()),
                Direction::Asc
            ),
            Ordering::Equal
        );
    }

    #[test]
    fn test_sort_items_is_stable_and_copies() {
        let items = vec![(1, "b"), (0, "a"), (1, "a"), (0, "b")];
        let sorted = sort_items(&items, |x, y| x.0.cmp(&y.0));
        assert_eq!(sorted, vec![(0, "a"), (0, "b"), (1, "b"), (1, "a")]);
        assert_eq!(items[0], (1, "b"));
    }

    #[test]
    fn test_column_click_toggles() {
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        enum Col {
            #[default]
            Name,
            Code,
        }

        let mut sort = ColumnSort::<Col>::default();
        assert_eq!(sort.direction, Direction::Asc);

        sort.click(Col::Name);
        assert_eq!((sort.column, sort.direction), (Col::Name, Direction::Desc));

        sort.click(Col::Code);
        assert_eq!((sort.column, sort.direction), (Col::Code, Direction::Asc));

        sort.click(Col::Code);
        sort.click(Col::Code);
        assert_eq!((sort.column, sort.direction), (Col::Code, Direction::Asc));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("desc".parse::<Direction>().unwrap(), Direction::Desc);
        assert_eq!("ASC".parse::<Direction>().unwrap(), Direction::Asc);
        assert!("sideways".parse::<Direction>().is_err());
    }
}

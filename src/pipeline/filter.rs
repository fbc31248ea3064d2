//! Filter stage - predicate building blocks shared by every list view

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::pipeline::ViewFilters;

/// Relative date window applied against an item's reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "90days")]
    Last90Days,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    /// Number of days covered by the window, `None` for no constraint
    pub fn days(self) -> Option<i64> {
        match self {
            DateRange::Last7Days => Some(7),
            DateRange::Last30Days => Some(30),
            DateRange::Last90Days => Some(90),
            DateRange::All => None,
        }
    }

    /// The earliest admitted date relative to `today`
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        self.days().map(|n| today - Duration::days(n))
    }

    /// Whether an item dated `date` passes this window.
    ///
    /// With an active window, an item without a usable date never passes.
    pub fn admits(self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
        match self.cutoff(today) {
            None => true,
            Some(cutoff) => date.is_some_and(|d| d >= cutoff),
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRange::Last7Days => write!(f, "7days"),
            DateRange::Last30Days => write!(f, "30days"),
            DateRange::Last90Days => write!(f, "90days"),
            DateRange::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "7days" => Ok(DateRange::Last7Days),
            "30days" => Ok(DateRange::Last30Days),
            "90days" => Ok(DateRange::Last90Days),
            "all" => Ok(DateRange::All),
            _ => Err(format!(
                "Unknown date range: {}. Use 7days, 30days, 90days, or all",
                s
            )),
        }
    }
}

/// Amount bucket selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountRange {
    Small,
    Medium,
    Large,
    #[default]
    All,
}

impl std::fmt::Display for AmountRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountRange::Small => write!(f, "small"),
            AmountRange::Medium => write!(f, "medium"),
            AmountRange::Large => write!(f, "large"),
            AmountRange::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for AmountRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(AmountRange::Small),
            "medium" => Ok(AmountRange::Medium),
            "large" => Ok(AmountRange::Large),
            "all" => Ok(AmountRange::All),
            _ => Err(format!(
                "Unknown amount range: {}. Use small, medium, large, or all",
                s
            )),
        }
    }
}

/// Bucket boundaries for one view.
///
/// Buckets are half-open: small is `[0, small_max)`, medium is
/// `[small_max, medium_max)`, large is `[medium_max, ∞)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountBuckets {
    pub small_max: f64,
    pub medium_max: f64,
}

impl AmountBuckets {
    /// Campaign goal buckets
    pub const CAMPAIGN: AmountBuckets = AmountBuckets {
        small_max: 10_000.0,
        medium_max: 50_000.0,
    };

    /// Withdrawal amount buckets
    pub const WITHDRAWAL: AmountBuckets = AmountBuckets {
        small_max: 1_000.0,
        medium_max: 5_000.0,
    };

    /// Bucket a value falls into; NaN and negatives fall into none
    pub fn classify(&self, value: f64) -> Option<AmountRange> {
        if value.is_nan() || value < 0.0 {
            None
        } else if value < self.small_max {
            Some(AmountRange::Small)
        } else if value < self.medium_max {
            Some(AmountRange::Medium)
        } else {
            Some(AmountRange::Large)
        }
    }

    /// Whether `value` passes the selected range
    pub fn admits(&self, range: AmountRange, value: f64) -> bool {
        match range {
            AmountRange::All => true,
            selected => self.classify(value) == Some(selected),
        }
    }
}

/// Status membership; an empty allowed set imposes no constraint
pub fn status_allowed<S: PartialEq>(allowed: &[S], status: &S) -> bool {
    allowed.is_empty() || allowed.contains(status)
}

/// Exact match when a selection is present
pub fn selection_matches<V: PartialEq + ?Sized>(selected: Option<&V>, value: Option<&V>) -> bool {
    match selected {
        None => true,
        Some(wanted) => value == Some(wanted),
    }
}

/// Keep the items satisfying every active predicate
pub fn apply_filters<T, F>(items: &[T], filters: &F, today: NaiveDate) -> Vec<T>
where
    T: Clone,
    F: ViewFilters<T>,
{
    items
        .iter()
        .filter(|item| filters.matches(item, today))
        .cloned()
        .collect()
}

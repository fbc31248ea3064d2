//! Bank entity - payout institutions creators can withdraw to

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::entity::{Exportable, Record, ValidationError};
use crate::core::value::{lenient_bool, lenient_string, lenient_text, parse_timestamp};
use crate::pipeline::filter::selection_matches;
use crate::pipeline::sort::{compare_values, ColumnSort, SortValue};
use crate::pipeline::{Searchable, ViewFilters};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,

    /// Sort or routing code; some backends send it as a number
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: bool,

    #[serde(
        default,
        rename = "createdAt",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl Bank {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }
}

impl Record for Bank {
    const COLLECTION: &'static str = "banks";
    const LABEL: &'static str = "bank";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        Ok(())
    }
}

impl Searchable for Bank {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.code.as_deref().unwrap_or(""),
            self.country.as_deref().unwrap_or(""),
        ]
    }
}

impl Exportable for Bank {
    fn csv_header() -> &'static [&'static str] {
        &["id", "name", "code", "country", "is_active", "created_at"]
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.code.clone().unwrap_or_default(),
            self.country.clone().unwrap_or_default(),
            self.is_active.to_string(),
            self.created_at.clone().unwrap_or_default(),
        ]
    }
}

/// Sortable columns of the bank table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BankColumn {
    #[default]
    Name,
    Code,
    Country,
    Active,
    Created,
}

impl BankColumn {
    fn value(self, b: &Bank) -> SortValue {
        match self {
            BankColumn::Name => SortValue::Text(b.name.clone()),
            BankColumn::Code => SortValue::Text(b.code.clone().unwrap_or_default()),
            BankColumn::Country => SortValue::Text(b.country.clone().unwrap_or_default()),
            BankColumn::Active => SortValue::Number(if b.is_active { 1.0 } else { 0.0 }),
            BankColumn::Created => SortValue::Time(b.created()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankFilters {
    pub country: Option<String>,
    pub active_only: bool,
    pub sort: ColumnSort<BankColumn>,
}

impl ViewFilters<Bank> for BankFilters {
    fn matches(&self, b: &Bank, _today: NaiveDate) -> bool {
        selection_matches(self.country.as_deref(), b.country.as_deref())
            && (!self.active_only || b.is_active)
    }

    fn compare(&self, a: &Bank, b: &Bank) -> Ordering {
        let column = self.sort.column;
        compare_values(&column.value(a), &column.value(b), self.sort.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::process;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn banks() -> Vec<Bank> {
        serde_json::from_value(json!([
            {"id": "b1", "name": "Zenith Bank", "code": 57, "country": "NG", "is_active": true, "createdAt": "2024-02-01"},
            {"id": "b2", "name": "access bank", "code": "044", "country": "NG", "is_active": false},
            {"id": "b3", "name": "Equity Bank", "code": "068", "country": "KE", "is_active": true, "createdAt": "2024-01-01"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_country_and_active_filter() {
        let filters = BankFilters {
            country: Some("NG".to_string()),
            active_only: true,
            ..Default::default()
        };
        let hits = process(&banks(), &filters, "", today());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b1");
        assert_eq!(hits[0].code.as_deref(), Some("57"));
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let ids: Vec<String> = process(&banks(), &BankFilters::default(), "", today())
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["b2", "b3", "b1"]);
    }

    #[test]
    fn test_created_sort_missing_last_both_ways() {
        let mut filters = BankFilters::default();
        filters.sort.click(BankColumn::Created);
        let asc = process(&banks(), &filters, "", today());
        assert_eq!(asc[0].id, "b3");
        assert_eq!(asc[2].id, "b2");

        filters.sort.click(BankColumn::Created);
        let desc = process(&banks(), &filters, "", today());
        assert_eq!(desc[0].id, "b1");
        assert_eq!(desc[2].id, "b2");
    }

    #[test]
    fn test_search_by_code() {
        let hits = process(&banks(), &BankFilters::default(), "068", today());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Equity Bank");
    }
}

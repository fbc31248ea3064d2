//! Withdrawal entity - payout requests from campaign creators

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::entity::{Exportable, Record};
use crate::core::value::{
    lenient_string, lenient_text, lenient_u32, or_default, parse_amount, parse_date,
    parse_timestamp,
};
use crate::core::workflow::{ReviewAction, ReviewRequest, Reviewable, WorkflowError};
use crate::pipeline::filter::{selection_matches, status_allowed, AmountBuckets, AmountRange, DateRange};
use crate::pipeline::sort::{compare_values, Direction, SortValue};
use crate::pipeline::{Searchable, ViewFilters};

/// Payout review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalStatus::Pending => write!(f, "pending"),
            WithdrawalStatus::Approved => write!(f, "approved"),
            WithdrawalStatus::Rejected => write!(f, "rejected"),
            WithdrawalStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            _ => Err(format!(
                "Invalid withdrawal status: {}. Use pending, approved, or rejected",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    MobileMoney,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::MobileMoney => write!(f, "mobile_money"),
            PaymentMethod::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "bank_transfer" | "bank" => Ok(PaymentMethod::BankTransfer),
            "mobile_money" | "mobile" => Ok(PaymentMethod::MobileMoney),
            _ => Err(format!(
                "Invalid payment method: {}. Use bank_transfer or mobile_money",
                s
            )),
        }
    }
}

/// Risk band derived from the 0-100 risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => RiskLevel::Low,
            30..=69 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    #[serde(default, deserialize_with = "lenient_text")]
    pub account_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub account_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bank_name: String,
}

/// A payout request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub fee: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub net_amount: Option<String>,

    #[serde(default, deserialize_with = "or_default")]
    pub status: WithdrawalStatus,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,

    /// 0-100, higher is riskier
    #[serde(default, deserialize_with = "lenient_u32")]
    pub risk_score: Option<u32>,

    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,

    #[serde(default, deserialize_with = "or_default")]
    pub account_details: AccountDetails,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Withdrawal {
    pub fn amount(&self) -> f64 {
        parse_amount(self.amount.as_deref())
    }

    pub fn fee(&self) -> f64 {
        parse_amount(self.fee.as_deref())
    }

    pub fn net(&self) -> f64 {
        parse_amount(self.net_amount.as_deref())
    }

    pub fn requested(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.request_date.as_deref())
    }

    pub fn requested_date(&self) -> Option<NaiveDate> {
        parse_date(self.request_date.as_deref())
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk_score.map(RiskLevel::from_score)
    }
}

impl Record for Withdrawal {
    const COLLECTION: &'static str = "withdrawals";
    const LABEL: &'static str = "withdrawal";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Withdrawal {
    fn search_fields(&self) -> Vec<&str> {
        let method = match self.payment_method {
            Some(PaymentMethod::BankTransfer) => "bank_transfer",
            Some(PaymentMethod::MobileMoney) => "mobile_money",
            _ => "",
        };
        vec![
            self.id.as_str(),
            self.account_details.account_name.as_str(),
            self.account_details.account_number.as_deref().unwrap_or(""),
            self.account_details.bank_name.as_str(),
            method,
        ]
    }
}

impl Reviewable for Withdrawal {
    type Status = WithdrawalStatus;

    fn status(&self) -> WithdrawalStatus {
        self.status
    }

    fn apply_review(
        &mut self,
        request: &ReviewRequest,
        _reviewer: &str,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        request.validate()?;

        let next = match request.action {
            ReviewAction::Approve => WithdrawalStatus::Approved,
            ReviewAction::Reject => WithdrawalStatus::Rejected,
            action => {
                return Err(WorkflowError::Unsupported {
                    action,
                    entity: Self::LABEL,
                })
            }
        };
        if self.status != WithdrawalStatus::Pending {
            return Err(WorkflowError::InvalidTransition {
                from: self.status.to_string(),
                action: request.action,
            });
        }

        self.status = next;
        self.review_date = Some(at.to_rfc3339());
        if let Some(notes) = request.notes() {
            self.notes = Some(notes.to_string());
        }
        if next == WithdrawalStatus::Rejected {
            self.rejection_reason = request.reason().map(str::to_string);
        }
        Ok(())
    }
}

impl Exportable for Withdrawal {
    fn csv_header() -> &'static [&'static str] {
        &[
            "id",
            "amount",
            "fee",
            "net_amount",
            "status",
            "request_date",
            "review_date",
            "risk_score",
            "payment_method",
            "account_name",
            "bank_name",
        ]
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.amount.clone().unwrap_or_default(),
            self.fee.clone().unwrap_or_default(),
            self.net_amount.clone().unwrap_or_default(),
            self.status.to_string(),
            self.request_date.clone().unwrap_or_default(),
            self.review_date.clone().unwrap_or_default(),
            self.risk_score.map(|s| s.to_string()).unwrap_or_default(),
            self.payment_method.map(|m| m.to_string()).unwrap_or_default(),
            self.account_details.account_name.clone(),
            self.account_details.bank_name.clone(),
        ]
    }
}

/// Withdrawal sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalSort {
    #[default]
    Newest,
    Oldest,
    AmountHigh,
    AmountLow,
    RiskHigh,
}

impl WithdrawalSort {
    pub fn natural_direction(self) -> Direction {
        match self {
            WithdrawalSort::Oldest | WithdrawalSort::AmountLow => Direction::Asc,
            _ => Direction::Desc,
        }
    }

    fn value(self, w: &Withdrawal) -> SortValue {
        match self {
            WithdrawalSort::Newest | WithdrawalSort::Oldest => SortValue::Time(w.requested()),
            WithdrawalSort::AmountHigh | WithdrawalSort::AmountLow => {
                SortValue::Number(w.amount())
            }
            WithdrawalSort::RiskHigh => {
                SortValue::Number(w.risk_score.map(f64::from).unwrap_or(f64::NAN))
            }
        }
    }
}

impl std::fmt::Display for WithdrawalSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalSort::Newest => write!(f, "newest"),
            WithdrawalSort::Oldest => write!(f, "oldest"),
            WithdrawalSort::AmountHigh => write!(f, "amount_high"),
            WithdrawalSort::AmountLow => write!(f, "amount_low"),
            WithdrawalSort::RiskHigh => write!(f, "risk_high"),
        }
    }
}

impl std::str::FromStr for WithdrawalSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "newest" => Ok(WithdrawalSort::Newest),
            "oldest" => Ok(WithdrawalSort::Oldest),
            "amount_high" => Ok(WithdrawalSort::AmountHigh),
            "amount_low" => Ok(WithdrawalSort::AmountLow),
            "risk_high" => Ok(WithdrawalSort::RiskHigh),
            _ => Err(format!(
                "Unknown sort: {}. Use newest, oldest, amount_high, amount_low, or risk_high",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawalFilters {
    pub statuses: Vec<WithdrawalStatus>,
    pub date_range: DateRange,
    pub amount_range: AmountRange,
    pub payment_method: Option<PaymentMethod>,
    pub sort_by: WithdrawalSort,
    pub direction: Option<Direction>,
}

impl ViewFilters<Withdrawal> for WithdrawalFilters {
    fn matches(&self, w: &Withdrawal, today: NaiveDate) -> bool {
        status_allowed(&self.statuses, &w.status)
            && self.date_range.admits(w.requested_date(), today)
            && AmountBuckets::WITHDRAWAL.admits(self.amount_range, w.amount())
            && selection_matches(self.payment_method.as_ref(), w.payment_method.as_ref())
    }

    fn compare(&self, a: &Withdrawal, b: &Withdrawal) -> Ordering {
        let direction = self
            .direction
            .unwrap_or_else(|| self.sort_by.natural_direction());
        compare_values(&self.sort_by.value(a), &self.sort_by.value(b), direction)
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

    fn sample() -> Vec<Withdrawal> {
        serde_json::from_value(json!([
            {
                "id": "w1", "amount": "750", "status": "pending",
                "requestDate": "2024-06-30T09:00:00Z", "riskScore": 12,
                "paymentMethod": "bank_transfer",
                "accountDetails": {"accountName": "Ngozi Eze", "accountNumber": "0123456789", "bankName": "First Bank"}
            },
            {
                "id": "w2", "amount": 2500, "status": "approved",
                "requestDate": "2024-05-02", "riskScore": 55,
                "paymentMethod": "mobile_money",
                "accountDetails": {"accountName": "Tunde Bello", "accountNumber": 8031234567_u64, "bankName": "MTN"}
            },
            {
                "id": "w3", "amount": "9000", "status": "pending",
                "requestDate": "2024-06-28", "riskScore": 91,
                "paymentMethod": "bank_transfer",
                "accountDetails": {"accountName": "Ada Obi", "bankName": "GTBank"}
            },
            {
                "id": "w4", "amount": "n/a", "status": "pending",
                "paymentMethod": "cheque"
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(sample()[3].risk_level(), None);
    }

    #[test]
    fn test_lenient_fields() {
        let items = sample();
        assert_eq!(items[1].amount(), 2500.0);
        assert_eq!(
            items[1].account_details.account_number.as_deref(),
            Some("8031234567")
        );
        assert_eq!(items[3].payment_method, Some(PaymentMethod::Other));
        assert!(items[3].amount().is_nan());
    }

    #[test]
    fn test_filters() {
        let items = sample();
        let pending_bank = WithdrawalFilters {
            statuses: vec![WithdrawalStatus::Pending],
            payment_method: Some(PaymentMethod::BankTransfer),
            ..Default::default()
        };
        let ids: Vec<String> = process(&items, &pending_bank, "", today())
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["w1", "w3"]);

        let medium = WithdrawalFilters {
            amount_range: AmountRange::Medium,
            ..Default::default()
        };
        let hits = process(&items, &medium, "", today());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "w2");

        let recent = WithdrawalFilters {
            date_range: DateRange::Last7Days,
            ..Default::default()
        };
        assert_eq!(process(&items, &recent, "", today()).len(), 2);
    }

    #[test]
    fn test_sorts() {
        let items = sample();
        let risk = WithdrawalFilters {
            sort_by: WithdrawalSort::RiskHigh,
            ..Default::default()
        };
        let ids: Vec<String> = process(&items, &risk, "", today())
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["w3", "w2", "w1", "w4"]);

        let low = WithdrawalFilters {
            sort_by: WithdrawalSort::AmountLow,
            ..Default::default()
        };
        let ids: Vec<String> = process(&items, &low, "", today())
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec!["w1", "w2", "w3", "w4"]);

        let newest = WithdrawalFilters::default();
        assert_eq!(process(&items, &newest, "", today())[0].id, "w1");
        assert_eq!(process(&items, &newest, "", today())[3].id, "w4");
    }

    #[test]
    fn test_search_by_account() {
        let items = sample();
        let hits = process(&items, &WithdrawalFilters::default(), "gtbank", today());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "w3");
        let hits = process(&items, &WithdrawalFilters::default(), "MOBILE", today());
        assert_eq!(hits[0].id, "w2");
    }

    #[test]
    fn test_review_sets_dates_and_reason() {
        let mut w = sample().remove(0);
        let at = Utc::now();
        w.apply_review(
            &ReviewRequest::reject("Name mismatch").with_notes("Ask for ID"),
            "ana",
            at,
        )
        .unwrap();
        assert_eq!(w.status, WithdrawalStatus::Rejected);
        assert_eq!(w.rejection_reason.as_deref(), Some("Name mismatch"));
        assert_eq!(w.notes.as_deref(), Some("Ask for ID"));
        assert_eq!(w.review_date, Some(at.to_rfc3339()));

        let err = w
            .apply_review(&ReviewRequest::approve(), "ana", at)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_unsupported_action() {
        let mut w = sample().remove(0);
        let err = w
            .apply_review(&ReviewRequest::new(ReviewAction::Publish), "ana", Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Unsupported {
                action: ReviewAction::Publish,
                entity: "withdrawal"
            }
        );
    }
}

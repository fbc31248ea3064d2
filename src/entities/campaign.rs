//! Campaign entity - fundraising campaigns awaiting or under moderation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::entity::{Exportable, Record};
use crate::core::value::{
    lenient_bool, lenient_string, lenient_text, or_default, parse_amount, parse_date,
    parse_timestamp,
};
use crate::core::workflow::{ReviewAction, ReviewRecord, ReviewRequest, Reviewable, WorkflowError};
use crate::pipeline::filter::{selection_matches, status_allowed, AmountBuckets, AmountRange, DateRange};
use crate::pipeline::sort::{compare_values, far_future, Direction, SortValue};
use crate::pipeline::{Searchable, ViewFilters};

/// Campaign moderation/lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    PendingApproval,
    Approved,
    Active,
    Rejected,
    Completed,
    Paused,
    /// Any status string this console does not know about
    #[serde(other)]
    Unknown,
}

impl CampaignStatus {
    /// Status reached by applying `action`, if the transition is allowed
    pub fn after(self, action: ReviewAction) -> Option<CampaignStatus> {
        use CampaignStatus::*;
        match (self, action) {
            (PendingApproval, ReviewAction::Approve) => Some(Approved),
            (PendingApproval, ReviewAction::Reject) => Some(Rejected),
            (Approved, ReviewAction::Publish) => Some(Active),
            (Active, ReviewAction::Pause) => Some(Paused),
            (Paused, ReviewAction::Resume) => Some(Active),
            (Active | Paused, ReviewAction::Complete) => Some(Completed),
            _ => None,
        }
    }

    /// Actions available from this status
    pub fn allowed_actions(self) -> Vec<ReviewAction> {
        ReviewAction::all()
            .iter()
            .copied()
            .filter(|a| self.after(*a).is_some())
            .collect()
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::PendingApproval => write!(f, "pending_approval"),
            CampaignStatus::Approved => write!(f, "approved"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Rejected => write!(f, "rejected"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_approval" | "pending" => Ok(CampaignStatus::PendingApproval),
            "approved" => Ok(CampaignStatus::Approved),
            "active" => Ok(CampaignStatus::Active),
            "rejected" => Ok(CampaignStatus::Rejected),
            "completed" => Ok(CampaignStatus::Completed),
            "paused" => Ok(CampaignStatus::Paused),
            _ => Err(format!(
                "Invalid campaign status: {}. Use pending_approval, approved, active, rejected, completed, or paused",
                s
            )),
        }
    }
}

/// A fundraising campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "or_default")]
    pub status: CampaignStatus,

    /// Target amount as a decimal string
    #[serde(default, deserialize_with = "lenient_string")]
    pub goal_amount: Option<String>,

    /// Amount raised so far as a decimal string
    #[serde(default, deserialize_with = "lenient_string")]
    pub raised_amount: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub featured: bool,

    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    /// Moderation history, oldest first
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<ReviewRecord>,
}

/// Funding progress in whole percent, clamped to `0..=100`.
///
/// A non-positive or malformed goal, or a malformed raised amount, yields 0.
pub fn progress(raised: f64, goal: f64) -> u32 {
    if raised.is_nan() || goal.is_nan() || goal <= 0.0 {
        return 0;
    }
    let pct = (raised / goal * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

impl Campaign {
    pub fn goal(&self) -> f64 {
        parse_amount(self.goal_amount.as_deref())
    }

    pub fn raised(&self) -> f64 {
        parse_amount(self.raised_amount.as_deref())
    }

    /// Funding progress in whole percent
    pub fn progress(&self) -> u32 {
        progress(self.raised(), self.goal())
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        parse_date(self.created_at.as_deref())
    }

    /// End date, with open-ended or unparseable dates pushed to the far future
    pub fn end_or_sentinel(&self) -> DateTime<Utc> {
        parse_timestamp(self.end_date.as_deref()).unwrap_or_else(far_future)
    }
}

impl Record for Campaign {
    const COLLECTION: &'static str = "campaigns";
    const LABEL: &'static str = "campaign";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Campaign {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.description.as_deref().unwrap_or(""),
            self.category.as_deref().unwrap_or(""),
            self.subtitle.as_deref().unwrap_or(""),
            self.creator_name.as_deref().unwrap_or(""),
        ]
    }
}

impl Reviewable for Campaign {
    type Status = CampaignStatus;

    fn status(&self) -> CampaignStatus {
        self.status
    }

    fn apply_review(
        &mut self,
        request: &ReviewRequest,
        reviewer: &str,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        request.validate()?;

        if matches!(request.action, ReviewAction::Feature | ReviewAction::Unfeature) {
            self.featured = request.action == ReviewAction::Feature;
        } else {
            let next = self
                .status
                .after(request.action)
                .ok_or_else(|| WorkflowError::InvalidTransition {
                    from: self.status.to_string(),
                    action: request.action,
                })?;
            self.status = next;
        }

        self.reviews
            .push(ReviewRecord::from_request(request, reviewer, at));
        Ok(())
    }
}

impl Exportable for Campaign {
    fn csv_header() -> &'static [&'static str] {
        &[
            "id",
            "title",
            "category",
            "status",
            "goal_amount",
            "raised_amount",
            "progress",
            "created_at",
            "end_date",
            "creator_name",
            "featured",
        ]
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.category.clone().unwrap_or_default(),
            self.status.to_string(),
            self.goal_amount.clone().unwrap_or_default(),
            self.raised_amount.clone().unwrap_or_default(),
            self.progress().to_string(),
            self.created_at.clone().unwrap_or_default(),
            self.end_date.clone().unwrap_or_default(),
            self.creator_name.clone().unwrap_or_default(),
            self.featured.to_string(),
        ]
    }
}

/// Campaign sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignSort {
    #[default]
    Newest,
    Oldest,
    GoalHigh,
    GoalLow,
    RaisedHigh,
    ProgressHigh,
    EndDate,
}

impl CampaignSort {
    /// Direction the key sorts in unless overridden
    pub fn natural_direction(self) -> Direction {
        match self {
            CampaignSort::Oldest | CampaignSort::GoalLow | CampaignSort::EndDate => Direction::Asc,
            _ => Direction::Desc,
        }
    }

    fn value(self, c: &Campaign) -> SortValue {
        match self {
            CampaignSort::Newest | CampaignSort::Oldest => SortValue::Time(c.created()),
            CampaignSort::GoalHigh | CampaignSort::GoalLow => SortValue::Number(c.goal()),
            CampaignSort::RaisedHigh => SortValue::Number(c.raised()),
            CampaignSort::ProgressHigh => SortValue::Number(f64::from(c.progress())),
            CampaignSort::EndDate => SortValue::Time(Some(c.end_or_sentinel())),
        }
    }
}

impl std::fmt::Display for CampaignSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignSort::Newest => write!(f, "newest"),
            CampaignSort::Oldest => write!(f, "oldest"),
            CampaignSort::GoalHigh => write!(f, "goal_high"),
            CampaignSort::GoalLow => write!(f, "goal_low"),
            CampaignSort::RaisedHigh => write!(f, "raised_high"),
            CampaignSort::ProgressHigh => write!(f, "progress_high"),
            CampaignSort::EndDate => write!(f, "end_date"),
        }
    }
}

impl std::str::FromStr for CampaignSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "newest" => Ok(CampaignSort::Newest),
            "oldest" => Ok(CampaignSort::Oldest),
            "goal_high" => Ok(CampaignSort::GoalHigh),
            "goal_low" => Ok(CampaignSort::GoalLow),
            "raised_high" => Ok(CampaignSort::RaisedHigh),
            "progress_high" => Ok(CampaignSort::ProgressHigh),
            "end_date" => Ok(CampaignSort::EndDate),
            _ => Err(format!(
                "Unknown sort: {}. Use newest, oldest, goal_high, goal_low, raised_high, progress_high, or end_date",
                s
            )),
        }
    }
}

/// Every recognized campaign filter dimension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignFilters {
    pub category: Option<String>,
    /// Allowed statuses; empty means any
    pub statuses: Vec<CampaignStatus>,
    pub date_range: DateRange,
    pub amount_range: AmountRange,
    pub featured_only: bool,
    pub sort_by: CampaignSort,
    /// Overrides the sort key's natural direction
    pub direction: Option<Direction>,
}

impl ViewFilters<Campaign> for CampaignFilters {
    fn matches(&self, c: &Campaign, today: NaiveDate) -> bool {
        selection_matches(self.category.as_deref(), c.category.as_deref())
            && status_allowed(&self.statuses, &c.status)
            && self.date_range.admits(c.created_date(), today)
            && AmountBuckets::CAMPAIGN.admits(self.amount_range, c.goal())
            && (!self.featured_only || c.featured)
    }

    fn compare(&self, a: &Campaign, b: &Campaign) -> Ordering {
        let direction = self
            .direction
            .unwrap_or_else(|| self.sort_by.natural_direction());
        compare_values(&self.sort_by.value(a), &self.sort_by.value(b), direction)
    }
}

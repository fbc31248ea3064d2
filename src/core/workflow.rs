//! Moderation workflow: review actions, requests and history records
//!
//! A review request is validated before anything is dispatched. Entities
//! that can be moderated implement [`Reviewable`], which checks the status
//! transition and appends a [`ReviewRecord`] to the entity's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during workflow operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {action} a record in '{from}' status")]
    InvalidTransition { from: String, action: ReviewAction },

    #[error("A reason is required to {0}")]
    ReasonRequired(ReviewAction),

    #[error("Action '{action}' is not supported for {entity}")]
    Unsupported {
        action: ReviewAction,
        entity: &'static str,
    },
}

/// A moderation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
    Publish,
    Pause,
    Resume,
    Complete,
    Feature,
    Unfeature,
}

impl ReviewAction {
    pub fn all() -> &'static [ReviewAction] {
        &[
            ReviewAction::Approve,
            ReviewAction::Reject,
            ReviewAction::Publish,
            ReviewAction::Pause,
            ReviewAction::Resume,
            ReviewAction::Complete,
            ReviewAction::Feature,
            ReviewAction::Unfeature,
        ]
    }

    /// Whether the action cannot be submitted without a reason
    pub fn requires_reason(self) -> bool {
        self == ReviewAction::Reject
    }
}

impl std::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewAction::Approve => write!(f, "approve"),
            ReviewAction::Reject => write!(f, "reject"),
            ReviewAction::Publish => write!(f, "publish"),
            ReviewAction::Pause => write!(f, "pause"),
            ReviewAction::Resume => write!(f, "resume"),
            ReviewAction::Complete => write!(f, "complete"),
            ReviewAction::Feature => write!(f, "feature"),
            ReviewAction::Unfeature => write!(f, "unfeature"),
        }
    }
}

impl std::str::FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(ReviewAction::Approve),
            "reject" => Ok(ReviewAction::Reject),
            "publish" => Ok(ReviewAction::Publish),
            "pause" => Ok(ReviewAction::Pause),
            "resume" => Ok(ReviewAction::Resume),
            "complete" => Ok(ReviewAction::Complete),
            "feature" => Ok(ReviewAction::Feature),
            "unfeature" => Ok(ReviewAction::Unfeature),
            _ => Err(format!("Unknown review action: {}", s)),
        }
    }
}

/// Payload of a workflow transition: `{action, reason?, notes?}`
///
/// `feedback` is accepted as an alias for `notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub action: ReviewAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, alias = "feedback", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReviewRequest {
    pub fn new(action: ReviewAction) -> Self {
        Self {
            action,
            reason: None,
            notes: None,
        }
    }

    pub fn approve() -> Self {
        Self::new(ReviewAction::Approve)
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            action: ReviewAction::Reject,
            reason: Some(reason.into()),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Blank notes are treated as absent
    pub fn notes(&self) -> Option<&str> {
        non_blank(self.notes.as_deref())
    }

    pub fn reason(&self) -> Option<&str> {
        non_blank(self.reason.as_deref())
    }

    /// Check required fields before the request is dispatched
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.action.requires_reason() && self.reason().is_none() {
            return Err(WorkflowError::ReasonRequired(self.action));
        }
        Ok(())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// One entry in a record's moderation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer: String,
    pub action: ReviewAction,
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReviewRecord {
    pub fn from_request(request: &ReviewRequest, reviewer: &str, at: DateTime<Utc>) -> Self {
        Self {
            reviewer: reviewer.to_string(),
            action: request.action,
            timestamp: at,
            reason: request.reason().map(str::to_string),
            notes: request.notes().map(str::to_string),
        }
    }
}

/// A record that moves through a moderation workflow
pub trait Reviewable {
    type Status: Copy + std::fmt::Display;

    fn status(&self) -> Self::Status;

    /// Validate `request`, apply the transition and record it.
    ///
    /// On error the record is left untouched.
    fn apply_review(
        &mut self,
        request: &ReviewRequest,
        reviewer: &str,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_requires_reason() {
        let blank = ReviewRequest {
            action: ReviewAction::Reject,
            reason: Some("   ".to_string()),
            notes: None,
        };
        assert_eq!(
            blank.validate(),
            Err(WorkflowError::ReasonRequired(ReviewAction::Reject))
        );
        assert!(ReviewRequest::new(ReviewAction::Reject).validate().is_err());
        assert!(ReviewRequest::reject("Incomplete profile").validate().is_ok());
        assert!(ReviewRequest::approve().validate().is_ok());
    }

    #[test]
    fn test_feedback_alias() {
        let req: ReviewRequest =
            serde_json::from_str(r#"{"action":"approve","feedback":"Looks good"}"#).unwrap();
        assert_eq!(req.notes(), Some("Looks good"));

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["notes"], "Looks good");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_record_drops_blank_notes() {
        let req = ReviewRequest::approve().with_notes("  ");
        let at = Utc::now();
        let record = ReviewRecord::from_request(&req, "ana", at);
        assert_eq!(record.reviewer, "ana");
        assert_eq!(record.action, ReviewAction::Approve);
        assert!(record.notes.is_none());
        assert_eq!(record.timestamp, at);
    }

    #[test]
    fn test_action_round_trip_through_str() {
        for action in ReviewAction::all() {
            let parsed: ReviewAction = action.to_string().parse().unwrap();
            assert_eq!(parsed, *action);
        }
        assert!("archive".parse::<ReviewAction>().is_err());
    }
}

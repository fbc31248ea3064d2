//! Confirmation dialog state machine
//!
//! At most one dialog is open at a time. Submitting validates the form and,
//! only when it passes, closes the dialog and hands back the intent to
//! dispatch. A failed submit keeps the dialog open with its input intact.

use crate::core::workflow::{ReviewAction, ReviewRequest, WorkflowError};

/// Dialog state for a record of type `T`
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog<T> {
    Closed,
    Approve {
        target: T,
        notes: String,
    },
    Reject {
        target: T,
        reason: String,
        notes: String,
    },
    Delete {
        target: T,
    },
}

/// What a successfully submitted dialog asks the caller to do
#[derive(Debug, Clone, PartialEq)]
pub enum DialogIntent<T> {
    Review { target: T, request: ReviewRequest },
    Delete { target: T },
}

impl<T> Default for Dialog<T> {
    fn default() -> Self {
        Dialog::Closed
    }
}

impl<T> Dialog<T> {
    pub fn approve(target: T) -> Self {
        Dialog::Approve {
            target,
            notes: String::new(),
        }
    }

    pub fn reject(target: T) -> Self {
        Dialog::Reject {
            target,
            reason: String::new(),
            notes: String::new(),
        }
    }

    pub fn delete(target: T) -> Self {
        Dialog::Delete { target }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Dialog::Closed)
    }

    pub fn target(&self) -> Option<&T> {
        match self {
            Dialog::Closed => None,
            Dialog::Approve { target, .. }
            | Dialog::Reject { target, .. }
            | Dialog::Delete { target } => Some(target),
        }
    }

    /// Set the notes field; ignored by dialogs without one
    pub fn set_notes(&mut self, value: impl Into<String>) {
        if let Dialog::Approve { notes, .. } | Dialog::Reject { notes, .. } = self {
            *notes = value.into();
        }
    }

    /// Set the rejection reason; ignored by other dialogs
    pub fn set_reason(&mut self, value: impl Into<String>) {
        if let Dialog::Reject { reason, .. } = self {
            *reason = value.into();
        }
    }

    pub fn cancel(&mut self) {
        *self = Dialog::Closed;
    }

    /// Validate and close. Returns `Ok(None)` when no dialog was open.
    pub fn submit(&mut self) -> Result<Option<DialogIntent<T>>, WorkflowError> {
        if let Dialog::Reject { reason, .. } = self {
            if reason.trim().is_empty() {
                return Err(WorkflowError::ReasonRequired(ReviewAction::Reject));
            }
        }

        let intent = match std::mem::replace(self, Dialog::Closed) {
            Dialog::Closed => None,
            Dialog::Approve { target, notes } => Some(DialogIntent::Review {
                target,
                request: with_optional_notes(ReviewRequest::approve(), notes),
            }),
            Dialog::Reject {
                target,
                reason,
                notes,
            } => Some(DialogIntent::Review {
                target,
                request: with_optional_notes(ReviewRequest::reject(reason.trim()), notes),
            }),
            Dialog::Delete { target } => Some(DialogIntent::Delete { target }),
        };
        Ok(intent)
    }
}

fn with_optional_notes(request: ReviewRequest, notes: String) -> ReviewRequest {
    if notes.trim().is_empty() {
        request
    } else {
        request.with_notes(notes.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_without_reason_stays_open() {
        let mut dialog = Dialog::reject("w1");
        dialog.set_notes("checked documents");
        let err = dialog.submit().unwrap_err();
        assert_eq!(err, WorkflowError::ReasonRequired(ReviewAction::Reject));
        assert!(dialog.is_open());
        assert_eq!(dialog.target(), Some(&"w1"));
    }

    #[test]
    fn test_reject_submit_closes_and_builds_request() {
        let mut dialog = Dialog::reject("w1");
        dialog.set_reason("  Account name mismatch ");
        let intent = dialog.submit().unwrap().unwrap();
        assert!(!dialog.is_open());
        match intent {
            DialogIntent::Review { target, request } => {
                assert_eq!(target, "w1");
                assert_eq!(request.action, ReviewAction::Reject);
                assert_eq!(request.reason.as_deref(), Some("Account name mismatch"));
                assert!(request.notes.is_none());
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_approve_carries_notes() {
        let mut dialog = Dialog::approve(7);
        dialog.set_reason("ignored");
        dialog.set_notes("verified");
        let intent = dialog.submit().unwrap();
        assert_eq!(
            intent,
            Some(DialogIntent::Review {
                target: 7,
                request: ReviewRequest::approve().with_notes("verified"),
            })
        );
    }

    #[test]
    fn test_closed_and_cancel() {
        let mut dialog: Dialog<u8> = Dialog::Closed;
        assert_eq!(dialog.submit().unwrap(), None);

        let mut dialog = Dialog::delete(3u8);
        dialog.cancel();
        assert_eq!(dialog, Dialog::Closed);
        assert_eq!(dialog.submit().unwrap(), None);
    }

    #[test]
    fn test_delete_intent() {
        let mut dialog = Dialog::delete("bank-1");
        assert_eq!(
            dialog.submit().unwrap(),
            Some(DialogIntent::Delete { target: "bank-1" })
        );
    }
}

//! Events delivered to a review FSM

use crate::types::IssueDraft;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An event a review FSM may be asked to process
///
/// Events originate from the service façade (`SubmitForReview`, `Resubmit`,
/// `Cancel`), from the sub-actor supervisor (`StartReview`, `RequestChanges`,
/// `Approve`, `Reject`), or from recovery replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReviewEvent {
    SubmitForReview {
        requester: String,
    },
    StartReview {
        reviewer_id: String,
    },
    RequestChanges {
        reviewer_id: String,
        issues: Vec<IssueDraft>,
    },
    Approve {
        reviewer_id: String,
    },
    Reject {
        reviewer_id: String,
        reason: String,
    },
    Resubmit {
        commit_sha: String,
    },
    Cancel {
        reason: String,
    },
}

impl ReviewEvent {
    /// Stable event name for logs and error payloads
    pub fn name(&self) -> &'static str {
        match self {
            ReviewEvent::SubmitForReview { .. } => "submit_for_review",
            ReviewEvent::StartReview { .. } => "start_review",
            ReviewEvent::RequestChanges { .. } => "request_changes",
            ReviewEvent::Approve { .. } => "approve",
            ReviewEvent::Reject { .. } => "reject",
            ReviewEvent::Resubmit { .. } => "resubmit",
            ReviewEvent::Cancel { .. } => "cancel",
        }
    }
}

impl fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = ReviewEvent::Cancel {
            reason: "closed".to_string(),
        };
        assert_eq!(event.name(), "cancel");
        assert_eq!(event.to_string(), "cancel");
    }

    #[test]
    fn test_event_serde_tagging() {
        let event = ReviewEvent::Approve {
            reviewer_id: "full".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"approve\""));
    }
}

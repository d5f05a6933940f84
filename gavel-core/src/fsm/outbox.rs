//! Outbox effects emitted by FSM transitions
//!
//! The kernel never performs I/O; it describes the side effects of a
//! transition as plain data for the dispatcher to apply. Effects for one
//! transition are emitted in a fixed order: persist, notify, create-issues,
//! spawn, record-activity. Storage is durably consistent before anything
//! observable happens.

use crate::ids::{ReviewId, ThreadId};
use crate::fsm::state::ReviewState;
use crate::types::{ActivityKind, IssueDraft};
use serde::{Deserialize, Serialize};

/// One side effect requested by a transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Effect {
    /// Write the new state to the store; always first
    PersistReviewState {
        review_id: ReviewId,
        new_state: ReviewState,
    },
    /// Tell observers the state actually changed
    NotifyReviewStateChange {
        review_id: ReviewId,
        old_state: ReviewState,
        new_state: ReviewState,
    },
    /// Append reviewer findings to the issue ledger
    CreateReviewIssues {
        review_id: ReviewId,
        issues: Vec<IssueDraft>,
    },
    /// Register intent to start a reviewer worker
    SpawnReviewerAgent {
        review_id: ReviewId,
        thread_id: ThreadId,
        repo_path: String,
        requester: String,
    },
    /// Append an author-visible activity entry
    RecordActivity {
        agent_id: String,
        activity: ActivityKind,
        description: String,
        review_id: ReviewId,
    },
}

impl Effect {
    /// Short effect name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Effect::PersistReviewState { .. } => "persist_review_state",
            Effect::NotifyReviewStateChange { .. } => "notify_review_state_change",
            Effect::CreateReviewIssues { .. } => "create_review_issues",
            Effect::SpawnReviewerAgent { .. } => "spawn_reviewer_agent",
            Effect::RecordActivity { .. } => "record_activity",
        }
    }

    /// Position in the mandated emission order
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Effect::PersistReviewState { .. } => 0,
            Effect::NotifyReviewStateChange { .. } => 1,
            Effect::CreateReviewIssues { .. } => 2,
            Effect::SpawnReviewerAgent { .. } => 3,
            Effect::RecordActivity { .. } => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_ranks_follow_emission_order() {
        let review_id = ReviewId::new("rev-1");
        let persist = Effect::PersistReviewState {
            review_id: review_id.clone(),
            new_state: ReviewState::PendingReview,
        };
        let activity = Effect::RecordActivity {
            agent_id: "author".to_string(),
            activity: ActivityKind::ReviewRequested,
            description: String::new(),
            review_id,
        };
        assert!(persist.rank() < activity.rank());
    }
}

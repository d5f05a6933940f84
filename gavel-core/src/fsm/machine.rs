//! The pure review state machine
//!
//! `transition` is a function from `(state, event, environment)` to the next
//! state plus the outbox effects the dispatcher must apply. It performs no
//! I/O and takes no locks; callers serialize invocations per review.

use crate::error::{Error, Result};
use crate::fsm::event::ReviewEvent;
use crate::fsm::outbox::Effect;
use crate::fsm::state::ReviewState;
use crate::ids::{ReviewId, ThreadId};
use crate::types::ActivityKind;

/// Immutable per-review context used to populate outbox effects
#[derive(Debug, Clone)]
pub struct ReviewEnv {
    pub review_id: ReviewId,
    pub thread_id: ThreadId,
    pub repo_path: String,
    pub requester: String,
}

/// Result of a successful transition
#[derive(Debug, Clone)]
pub struct Transition {
    /// The state the review moves to
    pub next: ReviewState,
    /// Side effects, in mandated application order
    pub effects: Vec<Effect>,
}

/// Builder enforcing the persist / notify / issues / spawn / activity order
struct EffectList {
    from: ReviewState,
    next: ReviewState,
    env: ReviewEnv,
    effects: Vec<Effect>,
}

impl EffectList {
    fn new(from: ReviewState, next: ReviewState, env: &ReviewEnv) -> Self {
        let mut list = Self {
            from,
            next,
            env: env.clone(),
            effects: Vec::with_capacity(4),
        };
        list.effects.push(Effect::PersistReviewState {
            review_id: list.env.review_id.clone(),
            new_state: next,
        });
        if from != next {
            list.effects.push(Effect::NotifyReviewStateChange {
                review_id: list.env.review_id.clone(),
                old_state: from,
                new_state: next,
            });
        }
        list
    }

    fn issues(mut self, issues: Vec<crate::types::IssueDraft>) -> Self {
        self.effects.push(Effect::CreateReviewIssues {
            review_id: self.env.review_id.clone(),
            issues,
        });
        self
    }

    fn spawn(mut self) -> Self {
        self.effects.push(Effect::SpawnReviewerAgent {
            review_id: self.env.review_id.clone(),
            thread_id: self.env.thread_id.clone(),
            repo_path: self.env.repo_path.clone(),
            requester: self.env.requester.clone(),
        });
        self
    }

    fn activity(mut self, agent_id: &str, activity: ActivityKind, description: String) -> Self {
        self.effects.push(Effect::RecordActivity {
            agent_id: agent_id.to_string(),
            activity,
            description,
            review_id: self.env.review_id.clone(),
        });
        self
    }

    fn build(self) -> Transition {
        debug_assert!(
            self.effects.windows(2).all(|w| w[0].rank() <= w[1].rank()),
            "effect emission order violated for {} -> {}",
            self.from,
            self.next
        );
        Transition {
            next: self.next,
            effects: self.effects,
        }
    }
}

/// Process one event against the current state
///
/// Terminal states reject every event with `Error::TerminalState`; pairs
/// outside the transition table reject with `Error::UnexpectedEvent`. The
/// match below is exhaustive over both unions, so adding a state or event
/// without deciding its row is a compile error.
pub fn transition(current: ReviewState, event: &ReviewEvent, env: &ReviewEnv) -> Result<Transition> {
    if current.is_terminal() {
        return Err(Error::TerminalState {
            state: current.as_str().to_string(),
        });
    }

    let transition = match (current, event) {
        (ReviewState::New, ReviewEvent::SubmitForReview { requester }) => {
            EffectList::new(current, ReviewState::PendingReview, env)
                .spawn()
                .activity(
                    requester,
                    ActivityKind::ReviewRequested,
                    format!("Review requested by {}", requester),
                )
                .build()
        }

        (ReviewState::PendingReview, ReviewEvent::StartReview { reviewer_id })
        | (ReviewState::ReReview, ReviewEvent::StartReview { reviewer_id }) => {
            EffectList::new(current, ReviewState::UnderReview, env)
                .activity(
                    reviewer_id,
                    ActivityKind::ReviewStarted,
                    format!("Reviewer {} started analysis", reviewer_id),
                )
                .build()
        }

        (ReviewState::UnderReview, ReviewEvent::RequestChanges { reviewer_id, issues })
        | (ReviewState::ChangesRequested, ReviewEvent::RequestChanges { reviewer_id, issues }) => {
            // Self-loop from changes_requested: the reviewer keeps raising
            // findings mid-conversation without a resubmit.
            EffectList::new(current, ReviewState::ChangesRequested, env)
                .issues(issues.clone())
                .activity(
                    reviewer_id,
                    ActivityKind::ReviewCompletedWithChanges,
                    format!("Reviewer {} requested changes ({} issues)", reviewer_id, issues.len()),
                )
                .build()
        }

        (ReviewState::UnderReview, ReviewEvent::Approve { reviewer_id })
        | (ReviewState::ChangesRequested, ReviewEvent::Approve { reviewer_id }) => {
            EffectList::new(current, ReviewState::Approved, env)
                .activity(
                    reviewer_id,
                    ActivityKind::ReviewApproved,
                    format!("Reviewer {} approved the change", reviewer_id),
                )
                .build()
        }

        (ReviewState::UnderReview, ReviewEvent::Reject { reviewer_id, reason })
        | (ReviewState::ChangesRequested, ReviewEvent::Reject { reviewer_id, reason }) => {
            EffectList::new(current, ReviewState::Rejected, env)
                .activity(
                    reviewer_id,
                    ActivityKind::ReviewRejected,
                    format!("Reviewer {} rejected the change: {}", reviewer_id, reason),
                )
                .build()
        }

        (ReviewState::ChangesRequested, ReviewEvent::Resubmit { commit_sha }) => {
            EffectList::new(current, ReviewState::ReReview, env)
                .spawn()
                .activity(
                    &env.requester,
                    ActivityKind::ReviewRequested,
                    format!("Resubmitted for review at {}", commit_sha),
                )
                .build()
        }

        (_, ReviewEvent::Cancel { .. }) => {
            // Cancellation is not an author-visible activity; persist and
            // notify only.
            EffectList::new(current, ReviewState::Cancelled, env).build()
        }

        // Every remaining pair is an explicit rejection.
        (ReviewState::New, _)
        | (ReviewState::PendingReview, _)
        | (ReviewState::UnderReview, _)
        | (ReviewState::ChangesRequested, _)
        | (ReviewState::ReReview, _) => {
            return Err(Error::UnexpectedEvent {
                state: current.as_str().to_string(),
                event: event.name().to_string(),
            })
        }

        // Unreachable: terminal states were handled above.
        (ReviewState::Approved, _)
        | (ReviewState::Rejected, _)
        | (ReviewState::Cancelled, _) => {
            return Err(Error::TerminalState {
                state: current.as_str().to_string(),
            })
        }
    };

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IssueDraft, IssueKind, IssueSeverity};

    fn env() -> ReviewEnv {
        ReviewEnv {
            review_id: ReviewId::new("rev-1"),
            thread_id: ThreadId::new("thread-1"),
            repo_path: "/repos/demo".to_string(),
            requester: "author-1".to_string(),
        }
    }

    fn submit() -> ReviewEvent {
        ReviewEvent::SubmitForReview {
            requester: "author-1".to_string(),
        }
    }

    fn start() -> ReviewEvent {
        ReviewEvent::StartReview {
            reviewer_id: "full".to_string(),
        }
    }

    fn request_changes() -> ReviewEvent {
        ReviewEvent::RequestChanges {
            reviewer_id: "full".to_string(),
            issues: vec![IssueDraft::new(
                IssueKind::Bug,
                IssueSeverity::High,
                "missing null check",
            )],
        }
    }

    fn all_events() -> Vec<ReviewEvent> {
        vec![
            submit(),
            start(),
            request_changes(),
            ReviewEvent::Approve {
                reviewer_id: "full".to_string(),
            },
            ReviewEvent::Reject {
                reviewer_id: "full".to_string(),
                reason: "scope".to_string(),
            },
            ReviewEvent::Resubmit {
                commit_sha: "b2".to_string(),
            },
            ReviewEvent::Cancel {
                reason: "closed".to_string(),
            },
        ]
    }

    fn effect_names(t: &Transition) -> Vec<&'static str> {
        t.effects.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn test_submit_moves_to_pending_and_spawns() {
        let t = transition(ReviewState::New, &submit(), &env()).unwrap();
        assert_eq!(t.next, ReviewState::PendingReview);
        assert_eq!(
            effect_names(&t),
            vec![
                "persist_review_state",
                "notify_review_state_change",
                "spawn_reviewer_agent",
                "record_activity",
            ]
        );
    }

    #[test]
    fn test_start_moves_to_under_review() {
        let t = transition(ReviewState::PendingReview, &start(), &env()).unwrap();
        assert_eq!(t.next, ReviewState::UnderReview);

        let t = transition(ReviewState::ReReview, &start(), &env()).unwrap();
        assert_eq!(t.next, ReviewState::UnderReview);
    }

    #[test]
    fn test_request_changes_emits_issue_effect() {
        let t = transition(ReviewState::UnderReview, &request_changes(), &env()).unwrap();
        assert_eq!(t.next, ReviewState::ChangesRequested);
        assert_eq!(
            effect_names(&t),
            vec![
                "persist_review_state",
                "notify_review_state_change",
                "create_review_issues",
                "record_activity",
            ]
        );
    }

    #[test]
    fn test_request_changes_self_loop_skips_notify() {
        let t = transition(ReviewState::ChangesRequested, &request_changes(), &env()).unwrap();
        assert_eq!(t.next, ReviewState::ChangesRequested);
        assert_eq!(
            effect_names(&t),
            vec![
                "persist_review_state",
                "create_review_issues",
                "record_activity",
            ]
        );
    }

    #[test]
    fn test_approve_and_reject_short_circuit_from_changes_requested() {
        let approve = ReviewEvent::Approve {
            reviewer_id: "full".to_string(),
        };
        let t = transition(ReviewState::ChangesRequested, &approve, &env()).unwrap();
        assert_eq!(t.next, ReviewState::Approved);

        let reject = ReviewEvent::Reject {
            reviewer_id: "full".to_string(),
            reason: "wrong direction".to_string(),
        };
        let t = transition(ReviewState::ChangesRequested, &reject, &env()).unwrap();
        assert_eq!(t.next, ReviewState::Rejected);
    }

    #[test]
    fn test_resubmit_spawns_re_review() {
        let resubmit = ReviewEvent::Resubmit {
            commit_sha: "b2".to_string(),
        };
        let t = transition(ReviewState::ChangesRequested, &resubmit, &env()).unwrap();
        assert_eq!(t.next, ReviewState::ReReview);
        assert!(effect_names(&t).contains(&"spawn_reviewer_agent"));
    }

    #[test]
    fn test_cancel_from_every_live_state() {
        let cancel = ReviewEvent::Cancel {
            reason: "closed".to_string(),
        };
        for state in ReviewState::live() {
            let t = transition(*state, &cancel, &env()).unwrap();
            assert_eq!(t.next, ReviewState::Cancelled);
            assert_eq!(
                effect_names(&t),
                vec!["persist_review_state", "notify_review_state_change"]
            );
        }
    }

    #[test]
    fn test_terminal_states_are_sinks() {
        for state in [
            ReviewState::Approved,
            ReviewState::Rejected,
            ReviewState::Cancelled,
        ] {
            for event in all_events() {
                let err = transition(state, &event, &env()).unwrap_err();
                assert!(matches!(err, Error::TerminalState { .. }), "{state} x {event}");
            }
        }
    }

    #[test]
    fn test_every_pair_is_decided() {
        // Every (state, event) pair either transitions or fails with one of
        // the two typed rejections; nothing panics or falls through.
        for state in ReviewState::all() {
            for event in all_events() {
                match transition(*state, &event, &env()) {
                    Ok(t) => assert!(!t.effects.is_empty()),
                    Err(Error::UnexpectedEvent { .. }) => assert!(state.is_live()),
                    Err(Error::TerminalState { .. }) => assert!(state.is_terminal()),
                    Err(other) => panic!("unexpected error {other} for {state} x {event}"),
                }
            }
        }
    }

    #[test]
    fn test_rejected_pairs_from_table() {
        let cases: Vec<(ReviewState, ReviewEvent)> = vec![
            (ReviewState::New, start()),
            (ReviewState::New, request_changes()),
            (ReviewState::PendingReview, submit()),
            (
                ReviewState::UnderReview,
                ReviewEvent::Resubmit {
                    commit_sha: "b2".to_string(),
                },
            ),
            (ReviewState::ReReview, request_changes()),
            (ReviewState::ChangesRequested, start()),
        ];
        for (state, event) in cases {
            let err = transition(state, &event, &env()).unwrap_err();
            assert!(matches!(err, Error::UnexpectedEvent { .. }), "{state} x {event}");
        }
    }

    #[test]
    fn test_effects_are_rank_ordered() {
        for state in ReviewState::live() {
            for event in all_events() {
                if let Ok(t) = transition(*state, &event, &env()) {
                    let ranks: Vec<u8> = t.effects.iter().map(|e| e.rank()).collect();
                    let mut sorted = ranks.clone();
                    sorted.sort_unstable();
                    assert_eq!(ranks, sorted, "{state} x {event}");
                }
            }
        }
    }
}

//! Review lifecycle states and their wire codec

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a review
///
/// `Approved`, `Rejected`, and `Cancelled` are terminal: no event moves a
/// review out of them, and terminal reviews are evicted from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    #[default]
    New,
    PendingReview,
    UnderReview,
    ChangesRequested,
    ReReview,
    Approved,
    Rejected,
    Cancelled,
}

impl ReviewState {
    /// All states, in lifecycle order
    pub fn all() -> &'static [ReviewState] {
        &[
            ReviewState::New,
            ReviewState::PendingReview,
            ReviewState::UnderReview,
            ReviewState::ChangesRequested,
            ReviewState::ReReview,
            ReviewState::Approved,
            ReviewState::Rejected,
            ReviewState::Cancelled,
        ]
    }

    /// The live (non-terminal) states
    pub fn live() -> &'static [ReviewState] {
        &[
            ReviewState::New,
            ReviewState::PendingReview,
            ReviewState::UnderReview,
            ReviewState::ChangesRequested,
            ReviewState::ReReview,
        ]
    }

    /// Stable storage/wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::New => "new",
            ReviewState::PendingReview => "pending_review",
            ReviewState::UnderReview => "under_review",
            ReviewState::ChangesRequested => "changes_requested",
            ReviewState::ReReview => "re_review",
            ReviewState::Approved => "approved",
            ReviewState::Rejected => "rejected",
            ReviewState::Cancelled => "cancelled",
        }
    }

    /// Check if this state accepts no further events
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReviewState::Approved | ReviewState::Rejected | ReviewState::Cancelled
        )
    }

    /// Check if this state is live (inverse of terminal)
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ReviewState::New),
            "pending_review" => Ok(ReviewState::PendingReview),
            "under_review" => Ok(ReviewState::UnderReview),
            "changes_requested" => Ok(ReviewState::ChangesRequested),
            "re_review" => Ok(ReviewState::ReReview),
            "approved" => Ok(ReviewState::Approved),
            "rejected" => Ok(ReviewState::Rejected),
            "cancelled" => Ok(ReviewState::Cancelled),
            _ => Err(format!("Unknown review state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codec_round_trips_every_variant() {
        for state in ReviewState::all() {
            let parsed: ReviewState = state.as_str().parse().unwrap();
            assert_eq!(parsed, *state);
        }
    }

    #[test]
    fn test_unknown_state_name_rejected() {
        assert!("in_review".parse::<ReviewState>().is_err());
        assert!("".parse::<ReviewState>().is_err());
    }

    #[test]
    fn test_terminal_partition() {
        let terminal: Vec<_> = ReviewState::all().iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal.len(), 3);
        assert_eq!(ReviewState::live().len(), 5);
        assert!(ReviewState::live().iter().all(|s| s.is_live()));
    }
}

//! Data models for persisted review records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A review row from the `reviews` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewRecord {
    pub review_id: String,
    pub thread_id: String,
    pub requester_id: String,
    pub repo_path: String,
    pub remote_url: Option<String>,
    pub branch: String,
    pub base_branch: String,
    pub commit_sha: String,
    pub pr_number: Option<i64>,
    pub review_type: String,
    pub priority: String,
    pub state: String,
    pub iterations: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a new review
#[derive(Debug, Clone, Default)]
pub struct NewReview {
    pub review_id: String,
    pub thread_id: String,
    pub requester_id: String,
    pub repo_path: String,
    pub remote_url: Option<String>,
    pub branch: String,
    pub base_branch: String,
    pub commit_sha: String,
    pub pr_number: Option<i64>,
    pub review_type: String,
    pub priority: String,
    pub state: String,
}

/// One completed round of reviewer analysis
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IterationRecord {
    pub review_id: String,
    pub iteration_num: i64,
    pub reviewer_id: String,
    pub decision: String,
    pub summary: String,
    pub files_reviewed: i64,
    pub lines_analyzed: i64,
    pub duration_ms: i64,
    pub cost_usd: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// A reviewer finding attached to an iteration
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueRecord {
    pub id: i64,
    pub review_id: String,
    pub iteration_num: i64,
    pub issue_type: String,
    pub severity: String,
    pub file_path: String,
    pub line_start: Option<i64>,
    pub line_end: Option<i64>,
    pub title: String,
    pub description: String,
    pub code_snippet: Option<String>,
    pub suggestion: Option<String>,
    pub claude_md_ref: Option<String>,
    pub status: String,
}

/// Fields required to insert a new issue
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub issue_type: String,
    pub severity: String,
    pub file_path: String,
    pub line_start: Option<i64>,
    pub line_end: Option<i64>,
    pub title: String,
    pub description: String,
    pub code_snippet: Option<String>,
    pub suggestion: Option<String>,
    pub claude_md_ref: Option<String>,
}

/// An author-visible activity entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityRecord {
    pub id: i64,
    pub agent_id: String,
    pub activity_type: String,
    pub description: String,
    pub review_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Issue status vocabulary as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Fixed,
    WontFix,
    Duplicate,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::Fixed => "fixed",
            IssueStatus::WontFix => "wont_fix",
            IssueStatus::Duplicate => "duplicate",
        }
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(IssueStatus::Open),
            "fixed" => Ok(IssueStatus::Fixed),
            "wont_fix" => Ok(IssueStatus::WontFix),
            "duplicate" => Ok(IssueStatus::Duplicate),
            _ => Err(format!("Unknown issue status: {}", s)),
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_status_round_trip() {
        for status in [
            IssueStatus::Open,
            IssueStatus::Fixed,
            IssueStatus::WontFix,
            IssueStatus::Duplicate,
        ] {
            let parsed: IssueStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_issue_status_rejects_unknown() {
        assert!("resolved".parse::<IssueStatus>().is_err());
    }
}

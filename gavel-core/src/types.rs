//! Domain vocabulary shared across the engine
//!
//! Review kinds, priorities, reviewer decisions, and issue classification.
//! Every enum carries stable snake_case wire names used both in the store
//! and in request/response envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of review requested by the author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    /// Review the whole change set
    #[default]
    Full,
    /// Review only the delta since the last round
    Incremental,
    /// Security-focused review
    Security,
    /// Performance-focused review
    Performance,
}

impl ReviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::Full => "full",
            ReviewType::Incremental => "incremental",
            ReviewType::Security => "security",
            ReviewType::Performance => "performance",
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "full" => Ok(ReviewType::Full),
            "incremental" => Ok(ReviewType::Incremental),
            "security" => Ok(ReviewType::Security),
            "performance" => Ok(ReviewType::Performance),
            _ => Err(format!("Unknown review type: {}", s)),
        }
    }
}

/// Scheduling hint attached to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "" | "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Verdict carried by a reviewer result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    RequestChanges,
    Reject,
    /// Commentary only; does not move the review
    Comment,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::RequestChanges => "request_changes",
            ReviewDecision::Reject => "reject",
            ReviewDecision::Comment => "comment",
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a reviewer finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Bug,
    Security,
    ClaudeMdViolation,
    LogicError,
    Performance,
    Architecture,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Bug => "bug",
            IssueKind::Security => "security",
            IssueKind::ClaudeMdViolation => "claude_md_violation",
            IssueKind::LogicError => "logic_error",
            IssueKind::Performance => "performance",
            IssueKind::Architecture => "architecture",
        }
    }
}

/// Severity of a reviewer finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Critical => "critical",
            IssueSeverity::High => "high",
            IssueSeverity::Medium => "medium",
            IssueSeverity::Low => "low",
        }
    }
}

/// A finding as produced by a reviewer, before it has a database id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDraft {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub file_path: String,
    #[serde(default)]
    pub line_start: Option<i64>,
    #[serde(default)]
    pub line_end: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code_snippet: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub claude_md_ref: Option<String>,
}

impl IssueDraft {
    /// Minimal draft used by synthetic findings and tests
    pub fn new(kind: IssueKind, severity: IssueSeverity, title: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            file_path: String::new(),
            line_start: None,
            line_end: None,
            title: title.into(),
            description: String::new(),
            code_snippet: None,
            suggestion: None,
            claude_md_ref: None,
        }
    }
}

/// Author-visible activity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ReviewRequested,
    ReviewStarted,
    ReviewApproved,
    ReviewRejected,
    ReviewCompletedWithChanges,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::ReviewRequested => "review_requested",
            ActivityKind::ReviewStarted => "review_started",
            ActivityKind::ReviewApproved => "review_approved",
            ActivityKind::ReviewRejected => "review_rejected",
            ActivityKind::ReviewCompletedWithChanges => "review_completed_with_changes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_type_defaults_to_full() {
        assert_eq!("".parse::<ReviewType>().unwrap(), ReviewType::Full);
        assert_eq!("security".parse::<ReviewType>().unwrap(), ReviewType::Security);
        assert!("fuzzing".parse::<ReviewType>().is_err());
    }

    #[test]
    fn test_priority_defaults_to_normal() {
        assert_eq!("".parse::<Priority>().unwrap(), Priority::Normal);
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
    }

    #[test]
    fn test_decision_names() {
        assert_eq!(ReviewDecision::RequestChanges.as_str(), "request_changes");
        assert_eq!(ReviewDecision::Comment.as_str(), "comment");
    }

    #[test]
    fn test_issue_kind_wire_names() {
        assert_eq!(IssueKind::ClaudeMdViolation.as_str(), "claude_md_violation");
        assert_eq!(IssueKind::LogicError.as_str(), "logic_error");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(IssueSeverity::Critical < IssueSeverity::Low);
    }
}

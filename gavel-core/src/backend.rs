//! Reviewer agent boundary
//!
//! The engine never talks to an LLM directly; it hands a `ReviewJob` to a
//! `ReviewerBackend` and gets a `ReviewerVerdict` back. The default
//! production backend shells out to a configured agent executable and parses
//! a JSON verdict from its output.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::config::{AgentConfig, PersonaKey};
use crate::ids::{ReviewId, ThreadId};
use crate::types::{IssueDraft, ReviewDecision};
use crate::{Error, Result};

/// Everything a reviewer worker needs for one iteration
#[derive(Debug, Clone)]
pub struct ReviewJob {
    pub review_id: ReviewId,
    pub thread_id: ThreadId,
    pub repo_path: String,
    pub branch: String,
    pub base_branch: String,
    pub commit_sha: String,
    pub persona: PersonaKey,
    pub display_name: String,
    pub focus_areas: Vec<String>,
    pub iteration: i64,
    pub timeout: Duration,
    pub model: Option<String>,
}

impl ReviewJob {
    /// Generate the prompt handed to the reviewer agent
    pub fn to_prompt(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("# {} Request\n\n", self.display_name));
        prompt.push_str(&format!(
            "Review the changes on branch `{}` against `{}` at commit `{}`.\n\n",
            self.branch, self.base_branch, self.commit_sha
        ));

        if self.iteration > 1 {
            prompt.push_str(&format!(
                "## Review Iteration: {}\n\nEarlier findings are recorded in thread {}; \
                 verify they have been addressed before raising new ones.\n\n",
                self.iteration, self.thread_id
            ));
        }

        prompt.push_str("## Focus Areas\n\n");
        for area in &self.focus_areas {
            prompt.push_str(&format!("- {}\n", area));
        }
        prompt.push('\n');

        prompt.push_str("## Expected Output Format\n\n");
        prompt.push_str("Respond with a single JSON object on the last line:\n\n");
        prompt.push_str("```json\n");
        prompt.push_str(
            "{\"decision\": \"approve|request_changes|reject|comment\", \
             \"summary\": \"...\", \"issues\": [], \
             \"files_reviewed\": 0, \"lines_analyzed\": 0, \"cost_usd\": 0.0}\n",
        );
        prompt.push_str("```\n");

        prompt
    }
}

/// The verdict a reviewer worker produces for one iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerVerdict {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<IssueDraft>,
    #[serde(default)]
    pub files_reviewed: i64,
    #[serde(default)]
    pub lines_analyzed: i64,
    #[serde(default)]
    pub cost_usd: f64,
}

impl ReviewerVerdict {
    /// An approval verdict
    pub fn approve(summary: impl Into<String>) -> Self {
        Self {
            decision: ReviewDecision::Approve,
            summary: summary.into(),
            issues: vec![],
            files_reviewed: 0,
            lines_analyzed: 0,
            cost_usd: 0.0,
        }
    }

    /// A request-changes verdict carrying findings
    pub fn request_changes(summary: impl Into<String>, issues: Vec<IssueDraft>) -> Self {
        Self {
            decision: ReviewDecision::RequestChanges,
            summary: summary.into(),
            issues,
            files_reviewed: 0,
            lines_analyzed: 0,
            cost_usd: 0.0,
        }
    }

    /// A rejection verdict; the summary doubles as the reason
    pub fn reject(summary: impl Into<String>) -> Self {
        Self {
            decision: ReviewDecision::Reject,
            summary: summary.into(),
            issues: vec![],
            files_reviewed: 0,
            lines_analyzed: 0,
            cost_usd: 0.0,
        }
    }

    /// A commentary-only verdict
    pub fn comment(summary: impl Into<String>) -> Self {
        Self {
            decision: ReviewDecision::Comment,
            summary: summary.into(),
            issues: vec![],
            files_reviewed: 0,
            lines_analyzed: 0,
            cost_usd: 0.0,
        }
    }
}

/// Boundary to the process that actually performs the analysis
#[async_trait]
pub trait ReviewerBackend: Send + Sync {
    /// Run one review iteration to completion and return the verdict
    async fn run(&self, job: &ReviewJob) -> Result<ReviewerVerdict>;
}

/// Backend that replays a queue of canned verdicts
///
/// Each spawned worker pops the next verdict; once the queue is empty,
/// workers park forever, which keeps a review visibly `under_review`.
/// Used by integration tests in place of a real agent process.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    verdicts: std::sync::Mutex<std::collections::VecDeque<ReviewerVerdict>>,
}

impl ScriptedBackend {
    /// Create a backend that will serve the given verdicts in order
    pub fn new(verdicts: impl IntoIterator<Item = ReviewerVerdict>) -> Self {
        Self {
            verdicts: std::sync::Mutex::new(verdicts.into_iter().collect()),
        }
    }

    /// Queue another verdict
    pub fn push(&self, verdict: ReviewerVerdict) {
        self.verdicts
            .lock()
            .expect("scripted backend lock poisoned")
            .push_back(verdict);
    }
}

#[async_trait]
impl ReviewerBackend for ScriptedBackend {
    async fn run(&self, _job: &ReviewJob) -> Result<ReviewerVerdict> {
        let next = self
            .verdicts
            .lock()
            .expect("scripted backend lock poisoned")
            .pop_front();

        match next {
            Some(verdict) => Ok(verdict),
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Backend that spawns the configured agent executable per iteration
///
/// The agent receives the prompt as its final argument and is expected to
/// print the verdict as the last JSON object line on stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    config: AgentConfig,
}

impl CommandBackend {
    /// Create a backend from agent configuration
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    fn parse_verdict(stdout: &str) -> Result<ReviewerVerdict> {
        // The agent may stream commentary before the verdict; take the last
        // line that parses.
        stdout
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str::<ReviewerVerdict>(line.trim()).ok())
            .ok_or_else(|| Error::Spawn("reviewer produced no parsable verdict".to_string()))
    }
}

#[async_trait]
impl ReviewerBackend for CommandBackend {
    async fn run(&self, job: &ReviewJob) -> Result<ReviewerVerdict> {
        let prompt = job.to_prompt();

        let mut command = Command::new(&self.config.executable);
        command.args(&self.config.args);

        if let Some(model) = job.model.as_ref().or(self.config.model.as_ref()) {
            command.arg("--model").arg(model);
        }

        let output = command
            .arg(&prompt)
            .current_dir(&job.repo_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Spawn(format!(
                        "Reviewer executable not found at '{}'",
                        self.config.executable
                    ))
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Spawn(format!(
                "Reviewer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Self::parse_verdict(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IssueKind, IssueSeverity};

    fn sample_job() -> ReviewJob {
        ReviewJob {
            review_id: ReviewId::new("rev-1"),
            thread_id: ThreadId::new("thread-1"),
            repo_path: "/repos/demo".to_string(),
            branch: "feature/a".to_string(),
            base_branch: "main".to_string(),
            commit_sha: "a1".to_string(),
            persona: PersonaKey::Security,
            display_name: "Security Review".to_string(),
            focus_areas: vec!["Secrets handling".to_string()],
            iteration: 2,
            timeout: Duration::from_secs(60),
            model: None,
        }
    }

    #[test]
    fn test_prompt_contains_context() {
        let prompt = sample_job().to_prompt();
        assert!(prompt.contains("Security Review"));
        assert!(prompt.contains("feature/a"));
        assert!(prompt.contains("Secrets handling"));
        assert!(prompt.contains("Review Iteration: 2"));
        assert!(prompt.contains("Expected Output Format"));
    }

    #[test]
    fn test_first_iteration_skips_rereview_section() {
        let mut job = sample_job();
        job.iteration = 1;
        assert!(!job.to_prompt().contains("Review Iteration"));
    }

    #[test]
    fn test_parse_verdict_takes_last_json_line() {
        let stdout = "analyzing...\nstill thinking\n\
            {\"decision\":\"request_changes\",\"summary\":\"two problems\",\
             \"issues\":[{\"kind\":\"bug\",\"severity\":\"high\",\
             \"file_path\":\"src/a.rs\",\"title\":\"oops\"}]}\n";
        let verdict = CommandBackend::parse_verdict(stdout).unwrap();
        assert_eq!(verdict.decision, ReviewDecision::RequestChanges);
        assert_eq!(verdict.issues.len(), 1);
        assert_eq!(verdict.issues[0].kind, IssueKind::Bug);
        assert_eq!(verdict.issues[0].severity, IssueSeverity::High);
    }

    #[test]
    fn test_parse_verdict_without_json_fails() {
        let err = CommandBackend::parse_verdict("no verdict here\n").unwrap_err();
        assert!(matches!(err, Error::Spawn(_)));
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_failure() {
        let backend = CommandBackend::new(AgentConfig {
            executable: "/nonexistent/gavel-reviewer-12345".to_string(),
            args: vec![],
            model: None,
        });
        let mut job = sample_job();
        job.repo_path = std::env::temp_dir().display().to_string();

        let err = backend.run(&job).await.unwrap_err();
        assert!(matches!(err, Error::Spawn(_)));
    }
}

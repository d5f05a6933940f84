//! Sub-actor supervisor for reviewer workers
//!
//! One bounded worker task per (review, iteration). The supervisor registers
//! spawn intent, enforces the persona timeout, and funnels results back to
//! the engine through a channel; decision-to-event mapping happens on the
//! receiving side.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{ReviewJob, ReviewerBackend, ReviewerVerdict};
use crate::ids::ReviewId;
use crate::types::{IssueDraft, IssueKind, IssueSeverity, ReviewDecision};
use crate::{Error, Result};

/// A completed reviewer iteration as delivered to the engine
#[derive(Debug, Clone)]
pub struct SubActorResult {
    pub review_id: ReviewId,
    pub iteration: i64,
    pub reviewer_id: String,
    pub verdict: ReviewerVerdict,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Default)]
struct SupervisorState {
    /// Workers currently running, keyed by (review, iteration)
    active: HashMap<(String, i64), JoinHandle<()>>,
    /// Iterations that already delivered a result; later results are dropped
    completed: HashSet<(String, i64)>,
}

/// Spawns and tracks reviewer workers
pub struct Supervisor {
    backend: Arc<dyn ReviewerBackend>,
    results_tx: mpsc::UnboundedSender<SubActorResult>,
    state: Mutex<SupervisorState>,
}

impl Supervisor {
    /// Create a supervisor delivering results on the given channel
    pub fn new(
        backend: Arc<dyn ReviewerBackend>,
        results_tx: mpsc::UnboundedSender<SubActorResult>,
    ) -> Self {
        Self {
            backend,
            results_tx,
            state: Mutex::new(SupervisorState::default()),
        }
    }

    /// Start a worker for one review iteration
    ///
    /// Registering intent is all that happens here; the worker runs in its
    /// own task and reports through the results channel. A duplicate spawn
    /// for an iteration that is already running or done is a no-op.
    pub fn spawn(&self, job: ReviewJob) -> Result<()> {
        let key = (job.review_id.as_str().to_string(), job.iteration);

        let mut state = self.state.lock().expect("supervisor lock poisoned");
        state.active.retain(|_, handle| !handle.is_finished());

        if state.completed.contains(&key) || state.active.contains_key(&key) {
            tracing::warn!(
                review_id = %job.review_id,
                iteration = job.iteration,
                "Duplicate spawn request ignored"
            );
            return Ok(());
        }

        tracing::info!(
            review_id = %job.review_id,
            iteration = job.iteration,
            persona = %job.persona,
            "Spawning reviewer worker"
        );

        let backend = Arc::clone(&self.backend);
        let results_tx = self.results_tx.clone();
        let handle = tokio::spawn(run_worker(backend, job, results_tx));
        state.active.insert(key, handle);

        Ok(())
    }

    /// First-wins gate for results of one iteration
    ///
    /// Returns false when the iteration already reported; the caller must
    /// discard the result in that case.
    pub fn begin_result(&self, review_id: &ReviewId, iteration: i64) -> bool {
        let key = (review_id.as_str().to_string(), iteration);
        let mut state = self.state.lock().expect("supervisor lock poisoned");
        if !state.completed.insert(key.clone()) {
            return false;
        }
        state.active.remove(&key);
        true
    }

    /// Tear down any workers still running for a review
    ///
    /// Called when the review reaches a terminal state; a verdict for a
    /// cancelled or decided review has nowhere to go.
    pub fn abort_review(&self, review_id: &ReviewId) {
        let mut state = self.state.lock().expect("supervisor lock poisoned");
        state.active.retain(|(id, iteration), handle| {
            if id == review_id.as_str() {
                tracing::debug!(
                    review_id = %review_id,
                    iteration,
                    "Aborting reviewer worker after terminal transition"
                );
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    /// Number of workers still running
    pub fn active_count(&self) -> usize {
        let mut state = self.state.lock().expect("supervisor lock poisoned");
        state.active.retain(|_, handle| !handle.is_finished());
        state.active.len()
    }

    /// Abort every outstanding worker and wait out the grace period
    pub async fn shutdown(&self, grace: Duration) {
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.state.lock().expect("supervisor lock poisoned");
            state.active.drain().map(|(_, handle)| handle).collect()
        };

        if handles.is_empty() {
            return;
        }

        tracing::info!(workers = handles.len(), "Cancelling reviewer workers");
        for handle in &handles {
            handle.abort();
        }

        let drain = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!("Shutdown grace period elapsed with workers still pending");
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("active", &self.active_count())
            .finish()
    }
}

/// Drive one reviewer iteration to completion
///
/// A timeout is downgraded to a `request_changes` verdict carrying a single
/// synthetic `review_timed_out` finding; an erroring worker produces no
/// result at all and the review stays in its current live state.
async fn run_worker(
    backend: Arc<dyn ReviewerBackend>,
    job: ReviewJob,
    results_tx: mpsc::UnboundedSender<SubActorResult>,
) {
    let started_at = Utc::now();

    let verdict = match tokio::time::timeout(job.timeout, backend.run(&job)).await {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(err)) => {
            tracing::error!(
                review_id = %job.review_id,
                iteration = job.iteration,
                error = %err,
                "Reviewer worker failed"
            );
            return;
        }
        Err(_) => {
            let err = Error::WorkerTimeout {
                persona: job.persona.to_string(),
                seconds: job.timeout.as_secs(),
            };
            tracing::warn!(
                review_id = %job.review_id,
                iteration = job.iteration,
                "{err}; recording synthetic request_changes"
            );
            timeout_verdict(&job)
        }
    };

    let result = SubActorResult {
        review_id: job.review_id.clone(),
        iteration: job.iteration,
        reviewer_id: job.persona.to_string(),
        verdict,
        started_at,
        completed_at: Utc::now(),
    };

    if results_tx.send(result).is_err() {
        tracing::warn!(
            review_id = %job.review_id,
            "Result channel closed; dropping reviewer result"
        );
    }
}

fn timeout_verdict(job: &ReviewJob) -> ReviewerVerdict {
    let mut issue = IssueDraft::new(IssueKind::Bug, IssueSeverity::Medium, "review_timed_out");
    issue.description = format!(
        "Reviewer persona {} exceeded its {}s budget on iteration {}",
        job.persona,
        job.timeout.as_secs(),
        job.iteration
    );

    ReviewerVerdict {
        decision: ReviewDecision::RequestChanges,
        summary: format!("Review timed out after {}s", job.timeout.as_secs()),
        issues: vec![issue],
        files_reviewed: 0,
        lines_analyzed: 0,
        cost_usd: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersonaKey;
    use crate::ids::ThreadId;
    use async_trait::async_trait;

    struct SlowBackend;

    #[async_trait]
    impl ReviewerBackend for SlowBackend {
        async fn run(&self, _job: &ReviewJob) -> Result<ReviewerVerdict> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("worker should be timed out or aborted first");
        }
    }

    struct ApproveBackend;

    #[async_trait]
    impl ReviewerBackend for ApproveBackend {
        async fn run(&self, _job: &ReviewJob) -> Result<ReviewerVerdict> {
            Ok(ReviewerVerdict {
                decision: ReviewDecision::Approve,
                summary: "LGTM".to_string(),
                issues: vec![],
                files_reviewed: 1,
                lines_analyzed: 10,
                cost_usd: 0.01,
            })
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ReviewerBackend for FailingBackend {
        async fn run(&self, _job: &ReviewJob) -> Result<ReviewerVerdict> {
            Err(Error::Spawn("agent crashed".to_string()))
        }
    }

    fn job(iteration: i64, timeout: Duration) -> ReviewJob {
        ReviewJob {
            review_id: ReviewId::new("rev-1"),
            thread_id: ThreadId::new("thread-1"),
            repo_path: "/repos/demo".to_string(),
            branch: "feature/a".to_string(),
            base_branch: "main".to_string(),
            commit_sha: "a1".to_string(),
            persona: PersonaKey::Full,
            display_name: "Full Review".to_string(),
            focus_areas: vec![],
            iteration,
            timeout,
            model: None,
        }
    }

    #[tokio::test]
    async fn test_worker_result_is_delivered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(ApproveBackend), tx);

        supervisor.spawn(job(1, Duration::from_secs(5))).unwrap();
        let result = rx.recv().await.unwrap();

        assert_eq!(result.iteration, 1);
        assert_eq!(result.verdict.decision, ReviewDecision::Approve);
        assert_eq!(result.reviewer_id, "full");
    }

    #[tokio::test]
    async fn test_timeout_produces_synthetic_request_changes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(SlowBackend), tx);

        supervisor.spawn(job(1, Duration::from_millis(20))).unwrap();
        let result = rx.recv().await.unwrap();

        assert_eq!(result.verdict.decision, ReviewDecision::RequestChanges);
        assert_eq!(result.verdict.issues.len(), 1);
        assert_eq!(result.verdict.issues[0].title, "review_timed_out");
        assert_eq!(result.verdict.issues[0].severity, IssueSeverity::Medium);
    }

    #[tokio::test]
    async fn test_failed_worker_delivers_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(FailingBackend), tx);

        supervisor.spawn(job(1, Duration::from_secs(5))).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(supervisor.active_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_spawn_is_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(SlowBackend), tx);

        supervisor.spawn(job(1, Duration::from_secs(3600))).unwrap();
        supervisor.spawn(job(1, Duration::from_secs(3600))).unwrap();
        assert_eq!(supervisor.active_count(), 1);

        supervisor.shutdown(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_begin_result_is_first_wins() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(ApproveBackend), tx);

        let review_id = ReviewId::new("rev-1");
        assert!(supervisor.begin_result(&review_id, 1));
        assert!(!supervisor.begin_result(&review_id, 1));
        assert!(supervisor.begin_result(&review_id, 2));
    }

    #[tokio::test]
    async fn test_abort_review_tears_down_its_workers_only() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(SlowBackend), tx);

        supervisor.spawn(job(1, Duration::from_secs(3600))).unwrap();
        let mut other = job(1, Duration::from_secs(3600));
        other.review_id = ReviewId::new("rev-2");
        supervisor.spawn(other).unwrap();
        assert_eq!(supervisor.active_count(), 2);

        supervisor.abort_review(&ReviewId::new("rev-1"));
        assert_eq!(supervisor.active_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_workers() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(Arc::new(SlowBackend), tx);

        supervisor.spawn(job(1, Duration::from_secs(3600))).unwrap();
        assert_eq!(supervisor.active_count(), 1);

        supervisor.shutdown(Duration::from_secs(1)).await;
        assert_eq!(supervisor.active_count(), 0);
    }
}

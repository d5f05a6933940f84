//! The review engine and its typed service surface
//!
//! `ReviewEngine` owns the registry, the outbox dispatcher, and the
//! sub-actor supervisor. Façade methods map one-to-one onto the request
//! operations; every mutation funnels through `process_event`, which holds
//! the review's cell lock across the FSM call and the dispatch of its
//! outbox.

use std::sync::{Arc, Mutex};

use gavel_db::{
    ActivityRepo, Database, IssueRecord, IssueStatus, IssuesRepo, IterationRecord, IterationsRepo,
    NewReview, ReviewRecord, ReviewsRepo,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::ReviewerBackend;
use crate::config::{Config, PersonaKey};
use crate::engine::dispatch::Dispatcher;
use crate::engine::registry::{ReviewCell, ReviewRegistry};
use crate::engine::supervisor::{SubActorResult, Supervisor};
use crate::fsm::{self, ReviewEnv, ReviewEvent, ReviewState};
use crate::ids::{ReviewId, ThreadId};
use crate::notify::Notifier;
use crate::types::{Priority, ReviewDecision, ReviewType};
use crate::{Error, Result};

/// Inputs for the `Create` operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReview {
    pub requester: String,
    pub branch: String,
    #[serde(default)]
    pub base_branch: String,
    pub commit_sha: String,
    pub repo_path: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub pr_number: Option<i64>,
    #[serde(default)]
    pub review_type: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// What `Create` hands back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOutcome {
    pub review_id: ReviewId,
    pub thread_id: ThreadId,
    pub state: ReviewState,
}

/// Full descriptor returned by `Get`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDetails {
    pub review: ReviewRecord,
    pub iterations: Vec<IterationRecord>,
    pub open_issues: i64,
}

/// Filters for the `List` operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

const DEFAULT_LIST_LIMIT: u32 = 50;

/// The review coordination engine
pub struct ReviewEngine {
    reviews: ReviewsRepo,
    iterations: IterationsRepo,
    issues: IssuesRepo,
    registry: ReviewRegistry,
    supervisor: Arc<Supervisor>,
    dispatcher: Dispatcher,
    config: Config,
    results_rx: Mutex<Option<mpsc::UnboundedReceiver<SubActorResult>>>,
}

impl ReviewEngine {
    /// Build an engine over an already-migrated database
    pub fn new(
        db: &Database,
        config: Config,
        backend: Arc<dyn ReviewerBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let pool = db.pool().clone();
        let reviews = ReviewsRepo::new(pool.clone());
        let iterations = IterationsRepo::new(pool.clone());
        let issues = IssuesRepo::new(pool.clone());
        let activity = ActivityRepo::new(pool);

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let supervisor = Arc::new(Supervisor::new(backend, results_tx));

        let dispatcher = Dispatcher::new(
            reviews.clone(),
            iterations.clone(),
            issues.clone(),
            activity,
            notifier,
            Arc::clone(&supervisor),
            config.personas.clone(),
        );

        Arc::new(Self {
            reviews,
            iterations,
            issues,
            registry: ReviewRegistry::new(),
            supervisor,
            dispatcher,
            config,
            results_rx: Mutex::new(Some(results_rx)),
        })
    }

    /// Start the worker-result loop; call once after construction
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self
            .results_rx
            .lock()
            .expect("results receiver lock poisoned")
            .take()
            .expect("engine already started");

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                let review_id = result.review_id.clone();
                if let Err(err) = engine.handle_worker_result(result).await {
                    tracing::error!(
                        review_id = %review_id,
                        error = %err,
                        "Failed to apply reviewer result"
                    );
                }
            }
        })
    }

    /// Number of live reviews in the registry
    pub fn active_review_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Create a review and drive it to its initial reviewed state
    pub async fn create(&self, request: CreateReview) -> Result<CreateOutcome> {
        let review_type = resolve_review_type(&request)?;
        let priority: Priority = request
            .priority
            .parse()
            .map_err(Error::Config)?;

        let review_id = ReviewId::generate();
        let thread_id = ThreadId::generate();
        let persona = PersonaKey::for_review_type(review_type);

        tracing::info!(
            review_id = %review_id,
            requester = %request.requester,
            branch = %request.branch,
            review_type = %review_type,
            description = %request.description,
            "Creating review"
        );

        self.reviews
            .insert(NewReview {
                review_id: review_id.as_str().to_string(),
                thread_id: thread_id.as_str().to_string(),
                requester_id: request.requester.clone(),
                repo_path: request.repo_path.clone(),
                remote_url: request.remote_url.clone(),
                branch: request.branch.clone(),
                base_branch: if request.base_branch.is_empty() {
                    "main".to_string()
                } else {
                    request.base_branch.clone()
                },
                commit_sha: request.commit_sha.clone(),
                pr_number: request.pr_number,
                review_type: review_type.as_str().to_string(),
                priority: priority.as_str().to_string(),
                state: ReviewState::New.as_str().to_string(),
            })
            .await?;

        let env = ReviewEnv {
            review_id: review_id.clone(),
            thread_id: thread_id.clone(),
            repo_path: request.repo_path,
            requester: request.requester.clone(),
        };
        self.registry
            .insert(Arc::new(ReviewCell::new(env, ReviewState::New)));

        self.process_event(
            &review_id,
            ReviewEvent::SubmitForReview {
                requester: request.requester,
            },
        )
        .await?;

        let state = self.start_review(&review_id, persona).await?;

        Ok(CreateOutcome {
            review_id,
            thread_id,
            state,
        })
    }

    /// Read the full descriptor of one review
    pub async fn get(&self, review_id: &ReviewId) -> Result<ReviewDetails> {
        let review = self
            .reviews
            .get(review_id.as_str())
            .await
            .map_err(Error::from_db)?;
        let iterations = self.iterations.list_for_review(review_id.as_str()).await?;
        let open_issues = self.issues.count_open(review_id.as_str()).await?;

        Ok(ReviewDetails {
            review,
            iterations,
            open_issues,
        })
    }

    /// List persisted reviews
    pub async fn list(&self, filter: ListFilter) -> Result<Vec<ReviewRecord>> {
        if let Some(state) = filter.state.as_deref() {
            state
                .parse::<ReviewState>()
                .map_err(Error::Config)?;
        }

        self.reviews
            .list(
                filter.state.as_deref(),
                filter.requester.as_deref(),
                filter.limit.unwrap_or(DEFAULT_LIST_LIMIT),
                filter.offset.unwrap_or(0),
            )
            .await
            .map_err(Error::Storage)
    }

    /// Resubmit a review at a new commit and kick off the next round
    pub async fn resubmit(&self, review_id: &ReviewId, commit_sha: &str) -> Result<ReviewState> {
        // The next worker reviews the new commit, so it must be persisted
        // before the spawn effect reads the review back.
        let cell = self.cell_for(review_id).await?;
        self.reviews
            .update_commit(review_id.as_str(), commit_sha)
            .await?;

        let persona = self.persona_of(&cell).await?;
        self.process_event(
            review_id,
            ReviewEvent::Resubmit {
                commit_sha: commit_sha.to_string(),
            },
        )
        .await?;

        self.start_review(review_id, persona).await
    }

    /// Cancel a review
    pub async fn cancel(&self, review_id: &ReviewId, reason: &str) -> Result<()> {
        self.process_event(
            review_id,
            ReviewEvent::Cancel {
                reason: reason.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    /// Remove a review from the registry and the store
    pub async fn delete(&self, review_id: &ReviewId) -> Result<()> {
        self.registry.evict(review_id);
        self.reviews
            .delete(review_id.as_str())
            .await
            .map_err(Error::from_db)
    }

    /// List all findings for a review
    pub async fn issues(&self, review_id: &ReviewId) -> Result<Vec<IssueRecord>> {
        // Surface not_found for unknown reviews rather than an empty slice.
        self.reviews
            .get(review_id.as_str())
            .await
            .map_err(Error::from_db)?;
        self.issues
            .list_for_review(review_id.as_str())
            .await
            .map_err(Error::Storage)
    }

    /// Update the status of one finding
    pub async fn update_issue(
        &self,
        review_id: &ReviewId,
        issue_id: i64,
        status: &str,
    ) -> Result<()> {
        let status: IssueStatus = status.parse().map_err(Error::Config)?;
        self.issues
            .update_status(review_id.as_str(), issue_id, status.as_str())
            .await
            .map_err(Error::from_db)
    }

    /// Deliver one event to a review's FSM and apply its outbox
    ///
    /// The cell lock is held across the pure transition and the dispatch;
    /// the in-memory state commits only after every effect succeeded.
    pub async fn process_event(
        &self,
        review_id: &ReviewId,
        event: ReviewEvent,
    ) -> Result<ReviewState> {
        let cell = self.cell_for(review_id).await?;
        let mut state = cell.lock().await;

        let transition = fsm::transition(*state, &event, cell.env())?;
        self.dispatcher.apply_all(&transition.effects).await?;

        let old_state = *state;
        *state = transition.next;
        drop(state);

        tracing::info!(
            review_id = %review_id,
            event = event.name(),
            from = %old_state,
            to = %transition.next,
            "Review transition"
        );

        if transition.next.is_terminal() {
            self.registry.evict(review_id);
            self.supervisor.abort_review(review_id);
        }

        Ok(transition.next)
    }

    /// Gracefully stop: cancel workers, wait out the grace period, drop the
    /// registry. Live reviews remain durable and recovery rebuilds them.
    pub async fn shutdown(&self) {
        self.supervisor
            .shutdown(self.config.engine.shutdown_grace)
            .await;
        self.registry.clear();
    }

    /// Locate a review's cell, rehydrating from storage after a restart gap
    pub(crate) async fn cell_for(&self, review_id: &ReviewId) -> Result<Arc<ReviewCell>> {
        if let Some(cell) = self.registry.get(review_id) {
            return Ok(cell);
        }

        let record = self
            .reviews
            .find(review_id.as_str())
            .await?
            .ok_or_else(|| Error::NotFound(format!("review {}", review_id)))?;

        let state: ReviewState = record
            .state
            .parse()
            .map_err(|e: String| Error::Config(format!("corrupt persisted state: {}", e)))?;

        if state.is_terminal() {
            return Err(Error::TerminalState {
                state: state.as_str().to_string(),
            });
        }

        tracing::debug!(review_id = %review_id, state = %state, "Rehydrating review");
        let cell = Arc::new(ReviewCell::new(env_from_record(&record), state));
        Ok(self.registry.insert(cell))
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub(crate) fn registry(&self) -> &ReviewRegistry {
        &self.registry
    }

    pub(crate) fn reviews(&self) -> &ReviewsRepo {
        &self.reviews
    }

    /// Persona assigned to a review, derived from its persisted type
    async fn persona_of(&self, cell: &ReviewCell) -> Result<PersonaKey> {
        let record = self.reviews.get(cell.env().review_id.as_str()).await?;
        let review_type: ReviewType = record
            .review_type
            .parse()
            .map_err(Error::Config)?;
        Ok(PersonaKey::for_review_type(review_type))
    }

    /// Inject `StartReview`, tolerating a worker that raced ahead
    ///
    /// The spawned worker may already have delivered its result (and with it
    /// the implicit start), in which case the explicit start arrives in a
    /// later state and is rejected; that rejection is benign.
    async fn start_review(&self, review_id: &ReviewId, persona: PersonaKey) -> Result<ReviewState> {
        match self
            .process_event(
                review_id,
                ReviewEvent::StartReview {
                    reviewer_id: persona.to_string(),
                },
            )
            .await
        {
            Ok(state) => Ok(state),
            Err(Error::UnexpectedEvent { .. }) | Err(Error::TerminalState { .. }) => {
                match self.registry.get(review_id) {
                    Some(cell) => Ok(cell.current().await),
                    None => {
                        let record = self.reviews.get(review_id.as_str()).await?;
                        record
                            .state
                            .parse()
                            .map_err(|e: String| Error::Config(format!("corrupt persisted state: {}", e)))
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Apply one reviewer result: record the iteration, then map the
    /// decision onto the FSM
    ///
    /// Normally invoked by the result loop; callable directly when results
    /// arrive out-of-band. The first result for an iteration wins; later
    /// ones are dropped with a warning.
    pub async fn handle_worker_result(&self, result: SubActorResult) -> Result<()> {
        if !self
            .supervisor
            .begin_result(&result.review_id, result.iteration)
        {
            tracing::warn!(
                review_id = %result.review_id,
                iteration = result.iteration,
                "Duplicate reviewer result dropped"
            );
            return Ok(());
        }

        let duration_ms = (result.completed_at - result.started_at)
            .num_milliseconds()
            .max(0);

        self.iterations
            .insert(&IterationRecord {
                review_id: result.review_id.as_str().to_string(),
                iteration_num: result.iteration,
                reviewer_id: result.reviewer_id.clone(),
                decision: result.verdict.decision.as_str().to_string(),
                summary: result.verdict.summary.clone(),
                files_reviewed: result.verdict.files_reviewed,
                lines_analyzed: result.verdict.lines_analyzed,
                duration_ms,
                cost_usd: result.verdict.cost_usd,
                started_at: result.started_at,
                completed_at: result.completed_at,
            })
            .await?;

        if result.verdict.decision == ReviewDecision::Comment {
            tracing::debug!(
                review_id = %result.review_id,
                iteration = result.iteration,
                "Comment-only result recorded"
            );
            return Ok(());
        }

        // The worker reporting is proof the review started; catch up the FSM
        // if the explicit start never landed.
        let cell = self.cell_for(&result.review_id).await?;
        if matches!(
            cell.current().await,
            ReviewState::PendingReview | ReviewState::ReReview
        ) {
            match self
                .process_event(
                    &result.review_id,
                    ReviewEvent::StartReview {
                        reviewer_id: result.reviewer_id.clone(),
                    },
                )
                .await
            {
                Ok(_) | Err(Error::UnexpectedEvent { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        let event = match result.verdict.decision {
            ReviewDecision::Approve => ReviewEvent::Approve {
                reviewer_id: result.reviewer_id,
            },
            ReviewDecision::RequestChanges => ReviewEvent::RequestChanges {
                reviewer_id: result.reviewer_id,
                issues: result.verdict.issues,
            },
            ReviewDecision::Reject => ReviewEvent::Reject {
                reviewer_id: result.reviewer_id,
                reason: result.verdict.summary,
            },
            ReviewDecision::Comment => unreachable!("handled above"),
        };

        self.process_event(&result.review_id, event).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ReviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewEngine")
            .field("active_reviews", &self.active_review_count())
            .finish()
    }
}

fn resolve_review_type(request: &CreateReview) -> Result<ReviewType> {
    if request.review_type.is_empty() {
        // A requested persona can stand in for an omitted review type.
        let implied = request
            .reviewers
            .iter()
            .find_map(|key| key.parse::<PersonaKey>().ok())
            .map(|persona| persona.review_type())
            .unwrap_or_default();
        return Ok(implied);
    }

    request.review_type.parse().map_err(Error::Config)
}

fn env_from_record(record: &ReviewRecord) -> ReviewEnv {
    ReviewEnv {
        review_id: ReviewId::new(record.review_id.clone()),
        thread_id: ThreadId::new(record.thread_id.clone()),
        repo_path: record.repo_path.clone(),
        requester: record.requester_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_review_type_defaults() {
        let request = CreateReview::default();
        assert_eq!(resolve_review_type(&request).unwrap(), ReviewType::Full);
    }

    #[test]
    fn test_resolve_review_type_from_requested_persona() {
        let request = CreateReview {
            reviewers: vec!["security".to_string()],
            ..Default::default()
        };
        assert_eq!(resolve_review_type(&request).unwrap(), ReviewType::Security);
    }

    #[test]
    fn test_resolve_review_type_explicit_wins() {
        let request = CreateReview {
            review_type: "performance".to_string(),
            reviewers: vec!["security".to_string()],
            ..Default::default()
        };
        assert_eq!(
            resolve_review_type(&request).unwrap(),
            ReviewType::Performance
        );
    }

    #[test]
    fn test_resolve_review_type_rejects_unknown() {
        let request = CreateReview {
            review_type: "fuzzing".to_string(),
            ..Default::default()
        };
        assert!(resolve_review_type(&request).is_err());
    }
}

//! Outbox dispatcher
//!
//! Applies the effects of one transition sequentially, in emission order,
//! while the review's cell lock is held. The first failure aborts the
//! remainder and propagates; the caller only commits the in-memory state
//! after every effect succeeded (storage leads, memory follows).

use std::sync::Arc;

use gavel_db::{ActivityRepo, IssuesRepo, IterationsRepo, NewIssue, ReviewRecord, ReviewsRepo};

use crate::backend::ReviewJob;
use crate::config::{PersonaKey, PersonaTable};
use crate::engine::supervisor::Supervisor;
use crate::fsm::Effect;
use crate::ids::{ReviewId, ThreadId};
use crate::notify::Notifier;
use crate::types::IssueDraft;
use crate::{Error, Result};

pub(crate) struct Dispatcher {
    reviews: ReviewsRepo,
    iterations: IterationsRepo,
    issues: IssuesRepo,
    activity: ActivityRepo,
    notifier: Arc<dyn Notifier>,
    supervisor: Arc<Supervisor>,
    personas: PersonaTable,
}

impl Dispatcher {
    pub(crate) fn new(
        reviews: ReviewsRepo,
        iterations: IterationsRepo,
        issues: IssuesRepo,
        activity: ActivityRepo,
        notifier: Arc<dyn Notifier>,
        supervisor: Arc<Supervisor>,
        personas: PersonaTable,
    ) -> Self {
        Self {
            reviews,
            iterations,
            issues,
            activity,
            notifier,
            supervisor,
            personas,
        }
    }

    /// Apply all effects of one transition, aborting on the first failure
    pub(crate) async fn apply_all(&self, effects: &[Effect]) -> Result<()> {
        for effect in effects {
            self.apply(effect).await?;
        }
        Ok(())
    }

    async fn apply(&self, effect: &Effect) -> Result<()> {
        tracing::debug!(effect = effect.name(), "Applying outbox effect");

        match effect {
            Effect::PersistReviewState { review_id, new_state } => {
                self.reviews
                    .update_state(review_id.as_str(), new_state.as_str())
                    .await?;
            }

            Effect::NotifyReviewStateChange {
                review_id,
                old_state,
                new_state,
            } => {
                self.notifier
                    .review_state_changed(review_id, *old_state, *new_state)
                    .await?;
            }

            Effect::CreateReviewIssues { review_id, issues } => {
                // Findings belong to the iteration that produced them: the
                // supervisor records the iteration row before the event is
                // dispatched, so the review's counter points at it.
                let record = self.reviews.get(review_id.as_str()).await?;
                let iteration_num = record.iterations.max(1);

                let rows: Vec<NewIssue> = issues.iter().map(draft_to_row).collect();
                self.issues
                    .insert_batch(review_id.as_str(), iteration_num, &rows)
                    .await?;
            }

            Effect::SpawnReviewerAgent { review_id, .. } => {
                let record = self.reviews.get(review_id.as_str()).await?;
                let job = self.job_for(&record).await?;
                self.supervisor.spawn(job)?;
            }

            Effect::RecordActivity {
                agent_id,
                activity,
                description,
                review_id,
            } => {
                self.activity
                    .record(agent_id, activity.as_str(), description, review_id.as_str())
                    .await?;
            }
        }

        Ok(())
    }

    /// Build the worker job for the next iteration of a review
    pub(crate) async fn job_for(&self, record: &ReviewRecord) -> Result<ReviewJob> {
        let review_type = record
            .review_type
            .parse()
            .map_err(|e: String| Error::Config(e))?;
        let persona = PersonaKey::for_review_type(review_type);
        let persona_config = self.personas.get(persona);
        let iteration = self.iterations.next_iteration(&record.review_id).await?;

        Ok(ReviewJob {
            review_id: ReviewId::new(record.review_id.clone()),
            thread_id: ThreadId::new(record.thread_id.clone()),
            repo_path: record.repo_path.clone(),
            branch: record.branch.clone(),
            base_branch: record.base_branch.clone(),
            commit_sha: record.commit_sha.clone(),
            persona,
            display_name: persona_config.display_name.clone(),
            focus_areas: persona_config.focus_areas.clone(),
            iteration,
            timeout: persona_config.timeout,
            model: persona_config.model.clone(),
        })
    }
}

fn draft_to_row(draft: &IssueDraft) -> NewIssue {
    NewIssue {
        issue_type: draft.kind.as_str().to_string(),
        severity: draft.severity.as_str().to_string(),
        file_path: draft.file_path.clone(),
        line_start: draft.line_start,
        line_end: draft.line_end,
        title: draft.title.clone(),
        description: draft.description.clone(),
        code_snippet: draft.code_snippet.clone(),
        suggestion: draft.suggestion.clone(),
        claude_md_ref: draft.claude_md_ref.clone(),
    }
}

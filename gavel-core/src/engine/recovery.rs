//! Recovery of live reviews after a restart
//!
//! Only non-terminal reviews are loaded, so the registry stays bounded by
//! live work rather than history. Reviews that were mid-analysis lost their
//! worker with the old process; recovery re-issues the spawn effect so the
//! analysis restarts at the next iteration number.

use std::sync::Arc;

use crate::engine::registry::ReviewCell;
use crate::engine::service::ReviewEngine;
use crate::fsm::{Effect, ReviewEnv, ReviewState};
use crate::ids::{ReviewId, ThreadId};
use crate::Result;

impl ReviewEngine {
    /// Rebuild the registry from storage
    ///
    /// Returns the number of reviews brought back. A failed re-spawn leaves
    /// the review recovered but worker-less; it stays servable (resubmit,
    /// cancel) and is logged.
    pub async fn recover_active_reviews(&self) -> Result<usize> {
        let live_states: Vec<&str> = ReviewState::live().iter().map(|s| s.as_str()).collect();
        let records = self.reviews().list_in_states(&live_states).await?;
        let mut recovered = 0;

        for record in records {
            let state: ReviewState = match record.state.parse() {
                Ok(state) => state,
                Err(err) => {
                    tracing::error!(
                        review_id = %record.review_id,
                        error = %err,
                        "Skipping review with unparsable state"
                    );
                    continue;
                }
            };

            let env = ReviewEnv {
                review_id: ReviewId::new(record.review_id.clone()),
                thread_id: ThreadId::new(record.thread_id.clone()),
                repo_path: record.repo_path.clone(),
                requester: record.requester_id.clone(),
            };
            let review_id = env.review_id.clone();
            let thread_id = env.thread_id.clone();
            let repo_path = env.repo_path.clone();
            let requester = env.requester.clone();

            self.registry()
                .insert(Arc::new(ReviewCell::new(env, state)));
            recovered += 1;

            tracing::info!(review_id = %review_id, state = %state, "Recovered review");

            // Reviews that were mid-analysis lost their worker.
            if matches!(state, ReviewState::UnderReview | ReviewState::ReReview) {
                let spawn = Effect::SpawnReviewerAgent {
                    review_id: review_id.clone(),
                    thread_id,
                    repo_path,
                    requester,
                };
                if let Err(err) = self.dispatcher().apply_all(&[spawn]).await {
                    tracing::error!(
                        review_id = %review_id,
                        error = %err,
                        "Failed to respawn reviewer during recovery"
                    );
                }
            }
        }

        tracing::info!(count = recovered, "Recovery complete");
        Ok(recovered)
    }
}

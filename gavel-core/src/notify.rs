//! State-change notification boundary
//!
//! Observers (chat threads, dashboards, webhooks) subscribe behind this
//! trait; the dispatcher invokes it only after the new state is durably
//! persisted.

use async_trait::async_trait;

use crate::fsm::ReviewState;
use crate::ids::ReviewId;
use crate::Result;

/// Receives review state-change notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn review_state_changed(
        &self,
        review_id: &ReviewId,
        old_state: ReviewState,
        new_state: ReviewState,
    ) -> Result<()>;
}

/// Default notifier that reports transitions to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn review_state_changed(
        &self,
        review_id: &ReviewId,
        old_state: ReviewState,
        new_state: ReviewState,
    ) -> Result<()> {
        tracing::info!(
            review_id = %review_id,
            from = %old_state,
            to = %new_state,
            "Review state changed"
        );
        Ok(())
    }
}

//! In-memory index of live reviews

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use crate::fsm::{ReviewEnv, ReviewState};
use crate::ids::ReviewId;

/// The runtime object for one live review
///
/// The cell's mutex serializes the whole process-event-plus-dispatch
/// sequence, so two events for the same review never interleave.
pub struct ReviewCell {
    env: ReviewEnv,
    state: Mutex<ReviewState>,
}

impl ReviewCell {
    /// Create a cell pinned at the given state
    pub fn new(env: ReviewEnv, state: ReviewState) -> Self {
        Self {
            env,
            state: Mutex::new(state),
        }
    }

    /// The immutable per-review environment
    pub fn env(&self) -> &ReviewEnv {
        &self.env
    }

    /// Acquire the transition lock
    pub async fn lock(&self) -> MutexGuard<'_, ReviewState> {
        self.state.lock().await
    }

    /// Read the current state (takes and releases the lock)
    pub async fn current(&self) -> ReviewState {
        *self.state.lock().await
    }
}

impl std::fmt::Debug for ReviewCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewCell")
            .field("review_id", &self.env.review_id)
            .finish()
    }
}

/// O(1) map from review id to live cell
///
/// Lookups take the read side; insert and evict take the write side. The
/// registry lock is always released before a cell lock is acquired.
#[derive(Default)]
pub struct ReviewRegistry {
    inner: RwLock<HashMap<ReviewId, Arc<ReviewCell>>>,
}

impl ReviewRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live review
    pub fn get(&self, review_id: &ReviewId) -> Option<Arc<ReviewCell>> {
        self.inner.read().expect("registry lock poisoned").get(review_id).cloned()
    }

    /// Insert a cell; on a rehydration race the first writer wins and the
    /// already-present cell is returned
    pub fn insert(&self, cell: Arc<ReviewCell>) -> Arc<ReviewCell> {
        let mut map = self.inner.write().expect("registry lock poisoned");
        map.entry(cell.env().review_id.clone())
            .or_insert(cell)
            .clone()
    }

    /// Remove a review after it reached a terminal state
    pub fn evict(&self, review_id: &ReviewId) -> Option<Arc<ReviewCell>> {
        self.inner.write().expect("registry lock poisoned").remove(review_id)
    }

    /// Number of live reviews currently indexed
    pub fn active_count(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").len()
    }

    /// Drop every cell (shutdown)
    pub fn clear(&self) {
        self.inner.write().expect("registry lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ThreadId;

    fn cell(id: &str, state: ReviewState) -> Arc<ReviewCell> {
        Arc::new(ReviewCell::new(
            ReviewEnv {
                review_id: ReviewId::new(id),
                thread_id: ThreadId::new(format!("thread-{}", id)),
                repo_path: "/repos/demo".to_string(),
                requester: "author-1".to_string(),
            },
            state,
        ))
    }

    #[tokio::test]
    async fn test_insert_get_evict() {
        let registry = ReviewRegistry::new();
        assert_eq!(registry.active_count(), 0);

        registry.insert(cell("rev-1", ReviewState::New));
        registry.insert(cell("rev-2", ReviewState::UnderReview));
        assert_eq!(registry.active_count(), 2);

        let found = registry.get(&ReviewId::new("rev-1")).unwrap();
        assert_eq!(found.current().await, ReviewState::New);

        registry.evict(&ReviewId::new("rev-1"));
        assert_eq!(registry.active_count(), 1);
        assert!(registry.get(&ReviewId::new("rev-1")).is_none());
    }

    #[tokio::test]
    async fn test_insert_race_keeps_first_cell() {
        let registry = ReviewRegistry::new();
        let first = registry.insert(cell("rev-1", ReviewState::UnderReview));
        let second = registry.insert(cell("rev-1", ReviewState::New));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.current().await, ReviewState::UnderReview);
    }

    #[tokio::test]
    async fn test_clear() {
        let registry = ReviewRegistry::new();
        registry.insert(cell("rev-1", ReviewState::New));
        registry.clear();
        assert_eq!(registry.active_count(), 0);
    }
}

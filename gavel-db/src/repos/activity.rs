//! Activity repository for author-visible events

use crate::error::Result;
use crate::models::ActivityRecord;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository for the `agent_activity` table
#[derive(Clone)]
pub struct ActivityRepo {
    pool: SqlitePool,
}

impl ActivityRepo {
    /// Create a new activity repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one activity entry
    pub async fn record(
        &self,
        agent_id: &str,
        activity_type: &str,
        description: &str,
        review_id: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agent_activity (agent_id, activity_type, description, review_id, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(agent_id)
        .bind(activity_type)
        .bind(description)
        .bind(review_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List activity entries for a review, oldest first
    pub async fn list_for_review(&self, review_id: &str) -> Result<Vec<ActivityRecord>> {
        sqlx::query_as::<_, ActivityRecord>(
            "SELECT * FROM agent_activity WHERE review_id = ? ORDER BY id ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig::new(temp_dir.path().join("test.db"));
        let db = Database::connect(config).await.unwrap();
        db.migrate().await.unwrap();

        let repo = ActivityRepo::new(db.pool().clone());
        repo.record("author-1", "review_requested", "Review requested", "rev-1")
            .await
            .unwrap();
        repo.record("full", "review_started", "Review started", "rev-1")
            .await
            .unwrap();
        repo.record("full", "review_started", "Other review", "rev-2")
            .await
            .unwrap();

        let entries = repo.list_for_review("rev-1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].activity_type, "review_requested");
        assert_eq!(entries[1].agent_id, "full");
    }
}

//! Iteration repository for per-round reviewer results

use crate::error::Result;
use crate::models::IterationRecord;
use sqlx::SqlitePool;

/// Repository for the `review_iterations` table
///
/// Iteration numbers are 1-based, strictly increasing, and gap-free per
/// review; `next_iteration` derives the number from the rows already present
/// so an abandoned worker never burns a number.
#[derive(Clone)]
pub struct IterationsRepo {
    pool: SqlitePool,
}

impl IterationsRepo {
    /// Create a new iteration repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The iteration number the next reviewer round will use
    pub async fn next_iteration(&self, review_id: &str) -> Result<i64> {
        let (max,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(iteration_num), 0) FROM review_iterations WHERE review_id = ?",
        )
        .bind(review_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max + 1)
    }

    /// Insert an iteration row and advance the review's iteration counter
    pub async fn insert(&self, iteration: &IterationRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO review_iterations (
                review_id, iteration_num, reviewer_id, decision, summary,
                files_reviewed, lines_analyzed, duration_ms, cost_usd,
                started_at, completed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&iteration.review_id)
        .bind(iteration.iteration_num)
        .bind(&iteration.reviewer_id)
        .bind(&iteration.decision)
        .bind(&iteration.summary)
        .bind(iteration.files_reviewed)
        .bind(iteration.lines_analyzed)
        .bind(iteration.duration_ms)
        .bind(iteration.cost_usd)
        .bind(iteration.started_at)
        .bind(iteration.completed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE reviews SET iterations = ? WHERE review_id = ? AND iterations < ?")
            .bind(iteration.iteration_num)
            .bind(&iteration.review_id)
            .bind(iteration.iteration_num)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List all iterations for a review in order
    pub async fn list_for_review(&self, review_id: &str) -> Result<Vec<IterationRecord>> {
        sqlx::query_as::<_, IterationRecord>(
            "SELECT * FROM review_iterations WHERE review_id = ? ORDER BY iteration_num ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Count iterations recorded for a review
    pub async fn count_for_review(&self, review_id: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM review_iterations WHERE review_id = ?")
                .bind(review_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

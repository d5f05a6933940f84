//! Review repository for CRUD operations on review aggregates

use crate::error::{DbError, Result};
use crate::models::{NewReview, ReviewRecord};
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository for the `reviews` table
#[derive(Clone)]
pub struct ReviewsRepo {
    pool: SqlitePool,
}

impl ReviewsRepo {
    /// Create a new review repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new review row
    pub async fn insert(&self, review: NewReview) -> Result<ReviewRecord> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO reviews (
                review_id, thread_id, requester_id, repo_path, remote_url,
                branch, base_branch, commit_sha, pr_number, review_type,
                priority, state, iterations, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&review.review_id)
        .bind(&review.thread_id)
        .bind(&review.requester_id)
        .bind(&review.repo_path)
        .bind(&review.remote_url)
        .bind(&review.branch)
        .bind(&review.base_branch)
        .bind(&review.commit_sha)
        .bind(review.pr_number)
        .bind(&review.review_type)
        .bind(&review.priority)
        .bind(&review.state)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&review.review_id).await
    }

    /// Get a review by id
    pub async fn get(&self, review_id: &str) -> Result<ReviewRecord> {
        sqlx::query_as::<_, ReviewRecord>("SELECT * FROM reviews WHERE review_id = ?")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound(format!("review {}", review_id)),
                e => e.into(),
            })
    }

    /// Get a review by id, returning None when absent
    pub async fn find(&self, review_id: &str) -> Result<Option<ReviewRecord>> {
        sqlx::query_as::<_, ReviewRecord>("SELECT * FROM reviews WHERE review_id = ?")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    /// List reviews, optionally filtered by state and requester
    pub async fn list(
        &self,
        state: Option<&str>,
        requester: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ReviewRecord>> {
        let mut query = String::from("SELECT * FROM reviews WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(state) = state {
            query.push_str(" AND state = ?");
            bindings.push(state.to_string());
        }
        if let Some(requester) = requester {
            query.push_str(" AND requester_id = ?");
            bindings.push(requester.to_string());
        }
        query.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, ReviewRecord>(&query);
        for binding in bindings {
            q = q.bind(binding);
        }
        q.bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    /// List every review whose state is one of the given names
    pub async fn list_in_states(&self, states: &[&str]) -> Result<Vec<ReviewRecord>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; states.len()].join(", ");
        let query = format!(
            "SELECT * FROM reviews WHERE state IN ({}) ORDER BY created_at ASC",
            placeholders
        );

        let mut q = sqlx::query_as::<_, ReviewRecord>(&query);
        for state in states {
            q = q.bind(*state);
        }
        q.fetch_all(&self.pool).await.map_err(Into::into)
    }

    /// Update the persisted state of a review
    pub async fn update_state(&self, review_id: &str, state: &str) -> Result<()> {
        let result = sqlx::query("UPDATE reviews SET state = ?, updated_at = ? WHERE review_id = ?")
            .bind(state)
            .bind(Utc::now())
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("review {}", review_id)));
        }
        Ok(())
    }

    /// Update the commit under review (resubmission)
    pub async fn update_commit(&self, review_id: &str, commit_sha: &str) -> Result<()> {
        sqlx::query("UPDATE reviews SET commit_sha = ?, updated_at = ? WHERE review_id = ?")
            .bind(commit_sha)
            .bind(Utc::now())
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a review; iterations and issues cascade
    pub async fn delete(&self, review_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE review_id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("review {}", review_id)));
        }
        Ok(())
    }
}

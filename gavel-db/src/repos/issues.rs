//! Issue repository for reviewer findings

use crate::error::{DbError, Result};
use crate::models::{IssueRecord, NewIssue};
use sqlx::SqlitePool;

/// Repository for the `review_issues` table
#[derive(Clone)]
pub struct IssuesRepo {
    pool: SqlitePool,
}

impl IssuesRepo {
    /// Create a new issue repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a batch of findings for one review iteration
    pub async fn insert_batch(
        &self,
        review_id: &str,
        iteration_num: i64,
        issues: &[NewIssue],
    ) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(issues.len());

        for issue in issues {
            let result = sqlx::query(
                r#"
                INSERT INTO review_issues (
                    review_id, iteration_num, issue_type, severity, file_path,
                    line_start, line_end, title, description, code_snippet,
                    suggestion, claude_md_ref, status
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'open')
                "#,
            )
            .bind(review_id)
            .bind(iteration_num)
            .bind(&issue.issue_type)
            .bind(&issue.severity)
            .bind(&issue.file_path)
            .bind(issue.line_start)
            .bind(issue.line_end)
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(&issue.code_snippet)
            .bind(&issue.suggestion)
            .bind(&issue.claude_md_ref)
            .execute(&mut *tx)
            .await?;

            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// List all issues for a review, oldest first
    pub async fn list_for_review(&self, review_id: &str) -> Result<Vec<IssueRecord>> {
        sqlx::query_as::<_, IssueRecord>(
            "SELECT * FROM review_issues WHERE review_id = ? ORDER BY id ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Count issues for a review that are still open
    pub async fn count_open(&self, review_id: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM review_issues WHERE review_id = ? AND status = 'open'",
        )
        .bind(review_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Update the status of one issue belonging to the given review
    pub async fn update_status(&self, review_id: &str, issue_id: i64, status: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE review_issues SET status = ? WHERE id = ? AND review_id = ?")
                .bind(status)
                .bind(issue_id)
                .bind(review_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "issue {} in review {}",
                issue_id, review_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};
    use crate::models::NewReview;
    use crate::repos::ReviewsRepo;
    use tempfile::TempDir;

    async fn setup_with_review(review_id: &str) -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig::new(temp_dir.path().join("test.db"));
        let db = Database::connect(config).await.unwrap();
        db.migrate().await.unwrap();

        ReviewsRepo::new(db.pool().clone())
            .insert(NewReview {
                review_id: review_id.to_string(),
                thread_id: "thread-1".to_string(),
                requester_id: "author-1".to_string(),
                repo_path: "/repos/demo".to_string(),
                branch: "feature/a".to_string(),
                base_branch: "main".to_string(),
                commit_sha: "a1".to_string(),
                review_type: "full".to_string(),
                priority: "normal".to_string(),
                state: "under_review".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        (db, temp_dir)
    }

    fn sample_issue(title: &str) -> NewIssue {
        NewIssue {
            issue_type: "bug".to_string(),
            severity: "high".to_string(),
            file_path: "src/auth.rs".to_string(),
            line_start: Some(42),
            line_end: Some(48),
            title: title.to_string(),
            description: "Null token is not rejected".to_string(),
            suggestion: Some("Validate before use".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_batch_assigns_monotonic_ids() {
        let (db, _temp) = setup_with_review("rev-1").await;
        let repo = IssuesRepo::new(db.pool().clone());

        let ids = repo
            .insert_batch("rev-1", 1, &[sample_issue("a"), sample_issue("b")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[1] > ids[0]);

        let issues = repo.list_for_review("rev-1").await.unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].status, "open");
        assert_eq!(issues[0].iteration_num, 1);
    }

    #[tokio::test]
    async fn test_count_open_and_update_status() {
        let (db, _temp) = setup_with_review("rev-1").await;
        let repo = IssuesRepo::new(db.pool().clone());

        let ids = repo
            .insert_batch("rev-1", 1, &[sample_issue("a"), sample_issue("b")])
            .await
            .unwrap();
        assert_eq!(repo.count_open("rev-1").await.unwrap(), 2);

        repo.update_status("rev-1", ids[0], "fixed").await.unwrap();
        assert_eq!(repo.count_open("rev-1").await.unwrap(), 1);

        let issues = repo.list_for_review("rev-1").await.unwrap();
        assert_eq!(issues[0].status, "fixed");
    }

    #[tokio::test]
    async fn test_update_status_checks_ownership() {
        let (db, _temp) = setup_with_review("rev-1").await;
        let repo = IssuesRepo::new(db.pool().clone());

        let ids = repo.insert_batch("rev-1", 1, &[sample_issue("a")]).await.unwrap();

        let err = repo.update_status("other-review", ids[0], "fixed").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}

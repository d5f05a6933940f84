//! Create command - request a review for a branch

use std::time::Duration;

use clap::Args;
use gavel_core::{CreateReview, ReviewEngine};

/// Request a review
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Requesting author id
    #[arg(long)]
    requester: String,

    /// Branch under review
    #[arg(long)]
    branch: String,

    /// Base branch to diff against
    #[arg(long, default_value = "main")]
    base: String,

    /// Commit to review
    #[arg(long)]
    commit: String,

    /// Local checkout path
    #[arg(long, default_value = ".")]
    repo: String,

    /// Remote URL, if any
    #[arg(long)]
    remote: Option<String>,

    /// Pull request number, if any
    #[arg(long)]
    pr: Option<i64>,

    /// Review type: full, incremental, security, performance
    #[arg(long, default_value = "")]
    review_type: String,

    /// Priority: urgent, normal, low
    #[arg(long, default_value = "")]
    priority: String,

    /// Requested reviewer persona (repeatable)
    #[arg(long = "reviewer")]
    reviewers: Vec<String>,

    /// Free-form description of the change
    #[arg(long, default_value = "")]
    description: String,

    /// Block until the review reaches a terminal state
    #[arg(long)]
    wait: bool,
}

impl CreateArgs {
    /// Execute the create command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        let outcome = engine
            .create(CreateReview {
                requester: self.requester.clone(),
                branch: self.branch.clone(),
                base_branch: self.base.clone(),
                commit_sha: self.commit.clone(),
                repo_path: self.repo.clone(),
                remote_url: self.remote.clone(),
                pr_number: self.pr,
                review_type: self.review_type.clone(),
                priority: self.priority.clone(),
                reviewers: self.reviewers.clone(),
                description: self.description.clone(),
            })
            .await?;

        println!("Review:  {}", outcome.review_id);
        println!("Thread:  {}", outcome.thread_id);
        println!("State:   {}", outcome.state);

        if self.wait {
            loop {
                let details = engine.get(&outcome.review_id).await?;
                let state: gavel_core::ReviewState = details
                    .review
                    .state
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))?;
                if state.is_terminal() {
                    println!(
                        "Final:   {} ({} iterations, {} open issues)",
                        state, details.review.iterations, details.open_issues
                    );
                    break;
                }
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }

        Ok(())
    }
}

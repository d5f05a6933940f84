//! Show command - full detail for one review

use clap::Args;
use gavel_core::{ReviewEngine, ReviewId};

/// Show one review
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Review id
    review_id: String,
}

impl ShowArgs {
    /// Execute the show command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        let details = engine.get(&ReviewId::new(&self.review_id)).await?;
        let review = &details.review;

        println!("Review:      {}", review.review_id);
        println!("Thread:      {}", review.thread_id);
        println!("Requester:   {}", review.requester_id);
        println!("State:       {}", review.state);
        println!("Type:        {} ({})", review.review_type, review.priority);
        println!(
            "Change:      {} -> {} @ {}",
            review.base_branch, review.branch, review.commit_sha
        );
        if let Some(pr) = review.pr_number {
            println!("PR:          #{}", pr);
        }
        println!("Open issues: {}", details.open_issues);
        println!("Created:     {}", review.created_at);
        println!("Updated:     {}", review.updated_at);

        if !details.iterations.is_empty() {
            println!();
            println!("Iterations:");
            for iteration in &details.iterations {
                println!(
                    "  #{} {} by {} in {}ms (${:.4}): {}",
                    iteration.iteration_num,
                    iteration.decision,
                    iteration.reviewer_id,
                    iteration.duration_ms,
                    iteration.cost_usd,
                    iteration.summary
                );
            }
        }

        Ok(())
    }
}

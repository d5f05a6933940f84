//! List command - summarize reviews in the store

use chrono::Utc;
use clap::Args;
use gavel_core::{ListFilter, ReviewEngine};

/// List reviews
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only reviews in this state
    #[arg(long)]
    state: Option<String>,

    /// Only reviews by this requester
    #[arg(long)]
    requester: Option<String>,

    /// Maximum rows to print
    #[arg(long, default_value_t = 20)]
    limit: u32,

    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

impl ListArgs {
    /// Execute the list command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        let reviews = engine
            .list(ListFilter {
                state: self.state.clone(),
                requester: self.requester.clone(),
                limit: Some(self.limit),
                offset: Some(self.offset),
            })
            .await?;

        if reviews.is_empty() {
            println!("No reviews.");
            return Ok(());
        }

        let now = Utc::now();
        for review in reviews {
            let updated_ago = format_duration((now - review.updated_at).num_seconds());
            println!(
                "{}  {:<18} {:<7} {}@{}  iter {}  updated {} ago",
                review.review_id,
                review.state,
                review.priority,
                review.branch,
                &review.commit_sha[..review.commit_sha.len().min(8)],
                review.iterations,
                updated_ago
            );
        }

        Ok(())
    }
}

fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds.max(0))
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h{}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d", seconds / 86400)
    }
}

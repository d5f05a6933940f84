//! Resubmit command - start the next review round at a new commit

use clap::Args;
use gavel_core::{ReviewEngine, ReviewId};

/// Resubmit a review
#[derive(Args, Debug)]
pub struct ResubmitArgs {
    /// Review id
    review_id: String,

    /// The new commit to review
    #[arg(long)]
    commit: String,
}

impl ResubmitArgs {
    /// Execute the resubmit command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        let state = engine
            .resubmit(&ReviewId::new(&self.review_id), &self.commit)
            .await?;
        println!("State: {}", state);
        Ok(())
    }
}

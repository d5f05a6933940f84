//! Cancel command

use clap::Args;
use gavel_core::{ReviewEngine, ReviewId};

/// Cancel a review
#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Review id
    review_id: String,

    /// Why the review is being cancelled
    #[arg(long, default_value = "cancelled by author")]
    reason: String,
}

impl CancelArgs {
    /// Execute the cancel command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        engine
            .cancel(&ReviewId::new(&self.review_id), &self.reason)
            .await?;
        println!("Cancelled {}", self.review_id);
        Ok(())
    }
}

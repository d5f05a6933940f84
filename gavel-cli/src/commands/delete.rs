//! Delete command

use clap::Args;
use gavel_core::{ReviewEngine, ReviewId};

/// Delete a review and its findings
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Review id
    review_id: String,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        engine.delete(&ReviewId::new(&self.review_id)).await?;
        println!("Deleted {}", self.review_id);
        Ok(())
    }
}

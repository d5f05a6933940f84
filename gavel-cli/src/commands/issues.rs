//! Issues command - inspect and update review findings

use clap::{Args, Subcommand};
use gavel_core::{ReviewEngine, ReviewId};

/// Inspect or update findings
#[derive(Args, Debug)]
pub struct IssuesArgs {
    #[command(subcommand)]
    command: IssuesCommand,
}

#[derive(Subcommand, Debug)]
enum IssuesCommand {
    /// List all findings for a review
    List {
        /// Review id
        review_id: String,
    },

    /// Update the status of one finding
    Update {
        /// Review id
        review_id: String,

        /// Finding id
        issue_id: i64,

        /// New status: open, fixed, wont_fix, duplicate
        #[arg(long)]
        status: String,
    },
}

impl IssuesArgs {
    /// Execute the issues command
    pub async fn execute(&self, engine: &ReviewEngine) -> anyhow::Result<()> {
        match &self.command {
            IssuesCommand::List { review_id } => {
                let issues = engine.issues(&ReviewId::new(review_id)).await?;

                if issues.is_empty() {
                    println!("No findings.");
                    return Ok(());
                }

                for issue in issues {
                    println!(
                        "#{:<4} [{}] {}/{} iter {}: {}",
                        issue.id,
                        issue.status,
                        issue.issue_type,
                        issue.severity,
                        issue.iteration_num,
                        issue.title
                    );
                    if !issue.file_path.is_empty() {
                        match (issue.line_start, issue.line_end) {
                            (Some(start), Some(end)) => {
                                println!("      {}:{}-{}", issue.file_path, start, end)
                            }
                            (Some(start), None) => println!("      {}:{}", issue.file_path, start),
                            _ => println!("      {}", issue.file_path),
                        }
                    }
                }
            }

            IssuesCommand::Update {
                review_id,
                issue_id,
                status,
            } => {
                engine
                    .update_issue(&ReviewId::new(review_id), *issue_id, status)
                    .await?;
                println!("Updated issue {} to {}", issue_id, status);
            }
        }

        Ok(())
    }
}

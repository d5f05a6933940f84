//! CLI command implementations

pub mod cancel;
pub mod create;
pub mod delete;
pub mod issues;
pub mod list;
pub mod resubmit;
pub mod show;

pub use cancel::CancelArgs;
pub use create::CreateArgs;
pub use delete::DeleteArgs;
pub use issues::IssuesArgs;
pub use list::ListArgs;
pub use resubmit::ResubmitArgs;
pub use show::ShowArgs;

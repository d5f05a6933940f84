//! Runtime side of the engine
//!
//! The registry indexes live reviews, the dispatcher applies outbox
//! effects, the supervisor runs reviewer workers, and the service ties them
//! together behind the request operations.

pub mod dispatch;
pub mod recovery;
pub mod registry;
pub mod service;
pub mod supervisor;

pub use registry::{ReviewCell, ReviewRegistry};
pub use service::{CreateOutcome, CreateReview, ListFilter, ReviewDetails, ReviewEngine};
pub use supervisor::{SubActorResult, Supervisor};

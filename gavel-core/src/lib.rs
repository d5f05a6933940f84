//! Gavel Core - Review coordination engine for AI reviewer agents
//!
//! This crate drives automated code reviews through a defined lifecycle:
//! a pure state machine decides transitions, an outbox dispatcher applies
//! their side effects, a supervisor runs one reviewer worker per iteration,
//! and recovery rebuilds in-memory state from durable storage.

pub mod api;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod ids;
pub mod notify;
pub mod types;

pub use api::{Request, Response};
pub use backend::{CommandBackend, ReviewJob, ReviewerBackend, ReviewerVerdict, ScriptedBackend};
pub use config::{Config, PersonaConfig, PersonaKey, PersonaTable};
pub use engine::{
    CreateOutcome, CreateReview, ListFilter, ReviewDetails, ReviewEngine, SubActorResult,
};
pub use error::{Error, Result};
pub use fsm::{Effect, ReviewEnv, ReviewEvent, ReviewState};
pub use ids::{ReviewId, ThreadId};
pub use notify::{LogNotifier, Notifier};
pub use types::{
    ActivityKind, IssueDraft, IssueKind, IssueSeverity, Priority, ReviewDecision, ReviewType,
};

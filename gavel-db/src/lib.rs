//! Persistence layer for Gavel
//!
//! Provides SQLite storage for:
//! - Review aggregates and their lifecycle state
//! - Per-iteration reviewer results
//! - Reviewer findings (issues) and their statuses
//! - Author-visible activity entries

pub mod db;
pub mod error;
pub mod models;
pub mod repos;

pub use db::{Database, DatabaseConfig};
pub use error::{DbError, Result};
pub use models::{
    ActivityRecord, IssueRecord, IssueStatus, IterationRecord, NewIssue, NewReview, ReviewRecord,
};
pub use repos::{ActivityRepo, IssuesRepo, IterationsRepo, ReviewsRepo};

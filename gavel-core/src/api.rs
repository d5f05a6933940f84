//! Typed request/response envelope
//!
//! Each operation has a distinct discriminator; responses are concrete
//! variants matching the request. Unknown discriminators deserialize into
//! `Request::Unknown` and answer with the `unknown_message_type` error.

use gavel_db::{IssueRecord, ReviewRecord};
use serde::{Deserialize, Serialize};

use crate::engine::{CreateReview, ListFilter, ReviewDetails, ReviewEngine};
use crate::ids::ReviewId;
use crate::{Error, Result};

/// A request to the review service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    CreateReview(CreateReview),
    GetReview {
        review_id: String,
    },
    ListReviews(ListFilter),
    ResubmitReview {
        review_id: String,
        commit_sha: String,
    },
    CancelReview {
        review_id: String,
        reason: String,
    },
    DeleteReview {
        review_id: String,
    },
    GetIssues {
        review_id: String,
    },
    UpdateIssue {
        review_id: String,
        issue_id: i64,
        status: String,
    },
    /// Catch-all for unrecognized discriminators
    #[serde(other)]
    Unknown,
}

/// The response matching one request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    ReviewCreated {
        review_id: String,
        thread_id: String,
        state: String,
    },
    Review(ReviewDetails),
    Reviews {
        reviews: Vec<ReviewRecord>,
    },
    Resubmitted {
        state: String,
    },
    Ok,
    Issues {
        issues: Vec<IssueRecord>,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl Response {
    fn from_error(err: Error) -> Self {
        Response::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    /// The error payload, if this response is one
    pub fn error(&self) -> Option<(&str, &str)> {
        match self {
            Response::Error { kind, message } => Some((kind.as_str(), message.as_str())),
            _ => None,
        }
    }
}

impl ReviewEngine {
    /// Route one envelope request to its operation
    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => Response::from_error(err),
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response> {
        match request {
            Request::CreateReview(create) => {
                let outcome = self.create(create).await?;
                Ok(Response::ReviewCreated {
                    review_id: outcome.review_id.to_string(),
                    thread_id: outcome.thread_id.to_string(),
                    state: outcome.state.to_string(),
                })
            }
            Request::GetReview { review_id } => {
                let details = self.get(&ReviewId::new(review_id)).await?;
                Ok(Response::Review(details))
            }
            Request::ListReviews(filter) => {
                let reviews = self.list(filter).await?;
                Ok(Response::Reviews { reviews })
            }
            Request::ResubmitReview {
                review_id,
                commit_sha,
            } => {
                let state = self
                    .resubmit(&ReviewId::new(review_id), &commit_sha)
                    .await?;
                Ok(Response::Resubmitted {
                    state: state.to_string(),
                })
            }
            Request::CancelReview { review_id, reason } => {
                self.cancel(&ReviewId::new(review_id), &reason).await?;
                Ok(Response::Ok)
            }
            Request::DeleteReview { review_id } => {
                self.delete(&ReviewId::new(review_id)).await?;
                Ok(Response::Ok)
            }
            Request::GetIssues { review_id } => {
                let issues = self.issues(&ReviewId::new(review_id)).await?;
                Ok(Response::Issues { issues })
            }
            Request::UpdateIssue {
                review_id,
                issue_id,
                status,
            } => {
                self.update_issue(&ReviewId::new(review_id), issue_id, &status)
                    .await?;
                Ok(Response::Ok)
            }
            Request::Unknown => Err(Error::UnknownMessage),
        }
    }
}

//! Error taxonomy for moderation operations

use crate::moderation::state::PolicyViolation;
use crate::orm::comments::CommentState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;

/// Why a single member of a batch could not be transitioned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ItemFailure {
    /// No comment with this id exists
    NotFound,
    /// The transition guard refused this comment
    Rejected { violation: PolicyViolation },
    /// Another writer changed the comment after it was loaded
    StateChanged { expected: CommentState },
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemFailure::NotFound => write!(f, "comment not found"),
            ItemFailure::Rejected { violation } => write!(f, "{}", violation),
            ItemFailure::StateChanged { expected } => {
                write!(f, "comment is no longer {}", expected)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchItemFailure {
    pub comment_id: i32,
    #[serde(flatten)]
    pub failure: ItemFailure,
}

/// Moderation operation errors.
#[derive(Debug)]
pub enum ModerationError {
    /// The request carries no usable identity
    Unauthenticated,
    /// Missing capability or illegal transition
    PolicyViolation(PolicyViolation),
    /// Referenced comment or actor does not exist
    NotFound(String),
    /// Malformed request
    InvalidInput(String),
    /// One or more batch members failed; nothing was applied
    BatchFailure(Vec<BatchItemFailure>),
    /// Storage fault
    Database(DbErr),
}

impl ModerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ModerationError::Unauthenticated => "unauthenticated",
            ModerationError::PolicyViolation(_) => "policy_violation",
            ModerationError::NotFound(_) => "not_found",
            ModerationError::InvalidInput(_) => "invalid_input",
            ModerationError::BatchFailure(_) => "batch_failure",
            ModerationError::Database(_) => "storage_error",
        }
    }

    /// Ids named by a batch failure, in request order.
    pub fn failed_ids(&self) -> Vec<i32> {
        match self {
            ModerationError::BatchFailure(failures) => {
                failures.iter().map(|f| f.comment_id).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for ModerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationError::Unauthenticated => write!(f, "Authentication required"),
            ModerationError::PolicyViolation(v) => write!(f, "Policy violation: {}", v),
            ModerationError::NotFound(what) => write!(f, "Not found: {}", what),
            ModerationError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ModerationError::BatchFailure(failures) => {
                write!(f, "Batch rejected: {} comment(s) failed", failures.len())
            }
            ModerationError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ModerationError {}

impl From<DbErr> for ModerationError {
    fn from(e: DbErr) -> Self {
        ModerationError::Database(e)
    }
}

impl From<PolicyViolation> for ModerationError {
    fn from(v: PolicyViolation) -> Self {
        ModerationError::PolicyViolation(v)
    }
}

impl ResponseError for ModerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            ModerationError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ModerationError::PolicyViolation(_) => StatusCode::FORBIDDEN,
            ModerationError::NotFound(_) => StatusCode::NOT_FOUND,
            ModerationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ModerationError::BatchFailure(_) => StatusCode::CONFLICT,
            ModerationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ModerationError::PolicyViolation(v) => json!({
                "error": self.kind(),
                "message": self.to_string(),
                "violation": v,
            }),
            ModerationError::BatchFailure(failures) => json!({
                "error": self.kind(),
                "message": self.to_string(),
                "failed_ids": self.failed_ids(),
                "failures": failures,
            }),
            ModerationError::Database(e) => {
                // Storage details stay in the server log.
                log::error!("Request failed on storage error: {}", e);
                json!({
                    "error": self.kind(),
                    "message": "Database error",
                })
            }
            _ => json!({
                "error": self.kind(),
                "message": self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

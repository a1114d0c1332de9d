//! Errors raised at the document-container and action boundary.
//!
//! The reconciler itself never fails; everything here comes from loading,
//! committing or addressing book packages.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown book: {0}")]
    UnknownBook(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The supplied object is not a book package with a spine and a ToC.
    #[error("not a book container ({source_name}): {reason}")]
    InputShape { source_name: String, reason: String },

    #[error("ToC revision mismatch (expected={expected}, actual={actual})")]
    RevisionMismatch { expected: String, actual: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownBook(_) | Self::UnknownAction(_) => StatusCode::NOT_FOUND,
            Self::InputShape { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RevisionMismatch { .. } => StatusCode::CONFLICT,
            Self::Io(_) | Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for (StatusCode, String) {
    fn from(err: StoreError) -> Self {
        (err.status_code(), err.to_string())
    }
}

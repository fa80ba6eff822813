use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

use crate::{board::BoardError, transitions::TransitionError};

/// Client-entered data rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{context}: transport failure: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{context}: server responded {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },
    #[error("{context}: malformed response body: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid base url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Transport { .. } | ClientError::InvalidUrl { .. } => ErrorCode::Transport,
            ClientError::Status { status, .. } => ErrorCode::from_http_status(*status),
            ClientError::Decode { .. } => ErrorCode::MalformedResponse,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Validation(_) => ErrorCode::Validation,
            ClientError::Transition(_) | ClientError::Board(_) => ErrorCode::InvalidTransition,
        }
    }

    /// Reduces the error to the notice shown to the operator.
    pub fn notice(&self) -> ApiError {
        let message = match self {
            ClientError::Transport { context, .. } => {
                format!("{context}: server unreachable, check the connection and try again")
            }
            ClientError::Status {
                context, status, ..
            } => format!("{context}: request rejected ({status}), please try again"),
            ClientError::Decode { context, .. } => {
                format!("{context}: unexpected response from server")
            }
            other => other.to_string(),
        };
        ApiError::new(self.code(), message)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

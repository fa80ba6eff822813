use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request never produced an HTTP response.
    Transport,
    /// The backend answered with a non-success status.
    Rejected,
    NotFound,
    MalformedResponse,
    /// Client-entered data failed local checks; nothing was sent.
    Validation,
    InvalidTransition,
}

impl ErrorCode {
    pub fn from_http_status(status: u16) -> Self {
        match status {
            404 => ErrorCode::NotFound,
            _ => ErrorCode::Rejected,
        }
    }
}

/// User-visible error notice. Every failure surfaced to an operator is
/// reduced to one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether re-triggering the same action could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Transport | ErrorCode::Rejected | ErrorCode::MalformedResponse
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

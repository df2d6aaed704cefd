//! Client-side errors from talking to the health backend.

use serde::Deserialize;

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

/// Failures from the backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Request rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("No auth token stored for this tab")]
    Unauthorized,
    #[error("Backend unreachable: {0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Human-readable message supplied by the backend, if any.
    ///
    /// Transport and decode details are never returned here; callers fall
    /// back to a localized generic message instead.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Missing, expired, or refused credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::Rejected { status: 401 | 403, .. }
        )
    }
}

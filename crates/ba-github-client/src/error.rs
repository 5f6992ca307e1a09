// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the GitHub client

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for GitHub client operations
pub type GitHubClientResult<T> = std::result::Result<T, GitHubClientError>;

/// Errors that can occur while talking to the GitHub REST API
#[derive(Debug, Error)]
pub enum GitHubClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("GitHub API error ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
        documentation_url: Option<String>,
    },

    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse { status: StatusCode, body: String },
}

impl GitHubClientError {
    /// HTTP status returned by the API, if the error came from a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } | Self::UnexpectedResponse { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Whether an idempotent request may be retried after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => self
                .status()
                .is_some_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS),
        }
    }
}

/// Error body GitHub returns on non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubErrorBody {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let server = GitHubClientError::Api {
            status: StatusCode::BAD_GATEWAY,
            message: "bad gateway".to_string(),
            documentation_url: None,
        };
        assert!(server.is_retryable());

        let throttled = GitHubClientError::UnexpectedResponse {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        assert!(throttled.is_retryable());

        let unprocessable = GitHubClientError::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Reference already exists".to_string(),
            documentation_url: None,
        };
        assert!(!unprocessable.is_retryable());
        assert_eq!(unprocessable.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(!GitHubClientError::Auth("bad".to_string()).is_retryable());
    }
}

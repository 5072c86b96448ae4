//  Copyright (c) 2026 Metaform Systems, Inc
//
//  This program and the accompanying materials are made available under the
//  terms of the Apache License, Version 2.0 which is available at
//  https://www.apache.org/licenses/LICENSE-2.0
//
//  SPDX-License-Identifier: Apache-2.0
//
//  Contributors:
//       Metaform Systems, Inc. - initial API and implementation
//

use reqwest::StatusCode;
use thiserror::Error;

/// Message fragments that mark a failure as an authentication failure when
/// no HTTP status is available. Matching is case-insensitive.
const AUTH_FAILURE_MARKERS: &[&str] = &[
    "401",
    "unauthorized",
    "authentication",
    "invalid token",
    "token expired",
    "access denied",
    "forbidden",
];

/// Errors produced when calling the platform's REST API.
///
/// Failures carry the HTTP status where one was observed so that retry and
/// classification decisions can be made on structured data rather than on
/// rendered messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("failed to acquire an auth token: {0}")]
    TokenAcquisition(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("rate limited: maximum retries exceeded after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("operation cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport(message.into())
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn token_acquisition(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ApiError::TokenAcquisition(Box::new(source))
    }

    /// Returns the HTTP status observed for this failure, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

/// Classifies a failed operation as retryable via re-authentication.
///
/// Failures carrying a 401 or 403 status are authentication failures. For
/// failures without a status the rendered message is checked against a
/// fixed marker set. The fallback is a heuristic: an unrelated message
/// that happens to contain a marker (a resource named "forbidden-zone",
/// say) is misclassified.
pub fn is_auth_error(error: &ApiError) -> bool {
    match error.status_code() {
        Some(status) => {
            status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
        }
        None => message_indicates_auth_failure(&error.to_string()),
    }
}

/// Substring heuristic over a rendered error message.
pub fn message_indicates_auth_failure(message: &str) -> bool {
    let lowered = message.to_lowercase();
    AUTH_FAILURE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

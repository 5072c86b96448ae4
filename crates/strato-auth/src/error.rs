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

/// Errors raised while issuing or validating tokens against the identity
/// service.
///
/// Issuance failures are reported distinctly for diagnosability but are
/// treated alike by callers: the cached token is left untouched and the
/// next auth attempt may retry issuance.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to reach identity service: {0}")]
    Transport(String),

    #[error("token request failed with status {status}: {message}")]
    Endpoint { status: StatusCode, message: String },

    #[error("identity response carried no subject token header")]
    MissingToken,

    #[error("identity response carried no token expiry")]
    MissingExpiry,

    #[error("failed to parse token expiry '{value}': {source}")]
    InvalidExpiry {
        value: String,
        source: chrono::ParseError,
    },
}

impl AuthError {
    pub fn transport(message: impl Into<String>) -> Self {
        AuthError::Transport(message.into())
    }

    pub fn endpoint(status: StatusCode, message: impl Into<String>) -> Self {
        AuthError::Endpoint {
            status,
            message: message.into(),
        }
    }
}

impl From<AuthError> for strato_common::error::ApiError {
    fn from(error: AuthError) -> Self {
        strato_common::error::ApiError::token_acquisition(error)
    }
}

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

use crate::credentials::ApplicationCredential;
use crate::error::AuthError;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Response header carrying the issued bearer token.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Request header presenting a bearer token on authenticated calls.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// A bearer token together with its server-asserted expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Trait abstracting the identity service endpoints.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Exchanges the application credential for a fresh bearer token.
    ///
    /// # Returns
    /// - `Ok(IssuedToken)` - The token string and its expiry
    /// - `Err(AuthError)` - If the exchange fails at any stage
    async fn issue_token(&self) -> Result<IssuedToken, AuthError>;

    /// Checks whether a previously issued token is still live.
    ///
    /// A transport failure is an error; a definitive "no" from the
    /// identity service is `Ok(false)`.
    async fn validate_token(&self, token: &str) -> Result<bool, AuthError>;
}

/// Identity client speaking the application-credential grant over HTTP.
///
/// Issuance posts the credential to the tokens endpoint; the bearer token
/// comes back in the [`SUBJECT_TOKEN_HEADER`] response header and its
/// RFC3339 expiry in the response body.
#[derive(Builder)]
pub struct HttpIdentityApi {
    #[builder(default = Client::new())]
    http_client: Client,
    #[builder(into)]
    identity_url: String,
    credential: ApplicationCredential,
}

impl HttpIdentityApi {
    fn tokens_url(&self) -> String {
        format!("{}/v3/auth/tokens", self.identity_url)
    }
}

#[async_trait]
impl IdentityApi for HttpIdentityApi {
    async fn issue_token(&self) -> Result<IssuedToken, AuthError> {
        let request = TokenIssueRequest::for_credential(&self.credential);

        let response = self
            .http_client
            .post(self.tokens_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::transport(format!("failed to issue token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::endpoint(status, body));
        }

        // The token travels in a header, its expiry in the body. Read the
        // header before the body is consumed.
        let value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|header| header.to_str().ok())
            .map(|token| token.to_string())
            .ok_or(AuthError::MissingToken)?;

        let issue_response: TokenIssueResponse = response
            .json()
            .await
            .map_err(|e| AuthError::transport(format!("failed to parse token response: {}", e)))?;

        let raw_expiry = issue_response
            .token
            .and_then(|envelope| envelope.expires_at)
            .ok_or(AuthError::MissingExpiry)?;

        let expires_at = DateTime::parse_from_rfc3339(&raw_expiry)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|source| AuthError::InvalidExpiry {
                value: raw_expiry,
                source,
            })?;

        Ok(IssuedToken { value, expires_at })
    }

    async fn validate_token(&self, token: &str) -> Result<bool, AuthError> {
        let response = self
            .http_client
            .get(self.tokens_url())
            .header(AUTH_TOKEN_HEADER, token)
            .header(SUBJECT_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| AuthError::transport(format!("failed to validate token: {}", e)))?;

        if response.status().is_success() {
            Ok(true)
        } else {
            debug!("token validation returned status {}", response.status());
            Ok(false)
        }
    }
}

/// Application-credential grant request body
#[derive(Debug, Serialize)]
struct TokenIssueRequest {
    auth: AuthSection,
}

impl TokenIssueRequest {
    fn for_credential(credential: &ApplicationCredential) -> Self {
        Self {
            auth: AuthSection {
                identity: IdentitySection {
                    methods: vec!["application_credential".to_string()],
                    application_credential: CredentialSection {
                        id: credential.id.clone(),
                        secret: credential.secret.clone(),
                    },
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct AuthSection {
    identity: IdentitySection,
}

#[derive(Debug, Serialize)]
struct IdentitySection {
    methods: Vec<String>,
    application_credential: CredentialSection,
}

#[derive(Debug, Serialize)]
struct CredentialSection {
    id: String,
    secret: String,
}

/// Token issuance response body
#[derive(Debug, Deserialize)]
struct TokenIssueResponse {
    token: Option<TokenEnvelope>,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    expires_at: Option<String>,
}

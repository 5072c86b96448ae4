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

use crate::retry::{execute_with_retry_and_auth, RetryPolicy};
use bon::Builder;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use strato_auth::{ApplicationCredential, HttpIdentityApi, TokenManager};
use strato_common::error::ApiError;
use strato_common::lock::ResourceLockRegistry;
use strato_common::util::{default_clock, Clock};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

// Default values for configurable parameters
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EARLY_REFRESH_SECONDS: i64 = 300;

/// Configuration for the provider client.
#[derive(Builder, Clone)]
pub struct StratoClientConfig {
    /// Base URL of the identity service (e.g. "https://identity.strato.example")
    #[builder(into)]
    pub identity_url: String,
    /// Application credential used for the token grant
    pub credential: ApplicationCredential,
    /// HTTP request timeout (defaults to 10 seconds)
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    /// Seconds before expiry at which cached tokens are revalidated
    /// (defaults to 300 = 5 minutes)
    #[builder(default = DEFAULT_EARLY_REFRESH_SECONDS)]
    pub early_refresh_seconds: i64,
    /// Retry bounds applied by [`StratoClient::execute`]
    #[builder(default)]
    pub retry_policy: RetryPolicy,
    #[builder(default = default_clock())]
    pub(crate) clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StratoClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StratoClientConfig")
            .field("identity_url", &self.identity_url)
            .field("credential", &self.credential)
            .field("request_timeout", &self.request_timeout)
            .field("early_refresh_seconds", &self.early_refresh_seconds)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

/// Top-level client handed to every resource handler.
///
/// Built once at provider configuration time; owns the shared HTTP client,
/// the token manager, the per-resource-ID lock registry and the default
/// retry policy. Handlers run one HTTP call per operation closure through
/// [`execute`](Self::execute) and serialize conflicting mutations via
/// [`lock_for`](Self::lock_for).
pub struct StratoClient {
    http_client: Client,
    token_manager: Arc<TokenManager>,
    locks: ResourceLockRegistry,
    retry_policy: RetryPolicy,
}

impl StratoClient {
    pub fn new(config: StratoClientConfig) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to create HTTP client: {}", e)))?;

        let identity = HttpIdentityApi::builder()
            .http_client(http_client.clone())
            .identity_url(config.identity_url)
            .credential(config.credential)
            .build();

        let token_manager = Arc::new(
            TokenManager::builder()
                .identity(Arc::new(identity))
                .clock(config.clock)
                .early_refresh_seconds(config.early_refresh_seconds)
                .build(),
        );

        Ok(Self {
            http_client,
            token_manager,
            locks: ResourceLockRegistry::new(),
            retry_policy: config.retry_policy,
        })
    }

    /// Runs one API operation under the client's retry policy and token
    /// manager. See [`execute_with_retry_and_auth`].
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, ApiError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        execute_with_retry_and_auth(cancel, &self.token_manager, &self.retry_policy, operation)
            .await
    }

    /// Returns the process-wide lock for a resource ID. See
    /// [`ResourceLockRegistry::lock_for`].
    pub fn lock_for(&self, id: &str) -> Arc<AsyncMutex<()>> {
        self.locks.lock_for(id)
    }

    /// The shared HTTP client for resource endpoint calls.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

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

use bon::Builder;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use strato_auth::TokenManager;
use strato_common::error::{is_auth_error, ApiError};
use tokio_util::sync::CancellationToken;

// Default values for configurable parameters
const DEFAULT_MAX_AUTH_ATTEMPTS: u32 = 2;
const DEFAULT_MAX_RATE_LIMIT_ATTEMPTS: u32 = 1000;
const DEFAULT_RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(100);

/// Bounds for the retry-with-auth executor.
///
/// The rate-limit wait is a fixed interval rather than an exponential
/// backoff; the high attempt ceiling is the effective throttle.
#[derive(Builder, Debug, Clone)]
pub struct RetryPolicy {
    /// Token-refresh cycles before an authentication failure is fatal
    /// (defaults to 2)
    #[builder(default = DEFAULT_MAX_AUTH_ATTEMPTS)]
    pub max_auth_attempts: u32,
    /// Rate-limited calls tolerated per auth cycle (defaults to 1000)
    #[builder(default = DEFAULT_MAX_RATE_LIMIT_ATTEMPTS)]
    pub max_rate_limit_attempts: u32,
    /// Fixed wait between rate-limited calls (defaults to 100ms)
    #[builder(default = DEFAULT_RATE_LIMIT_INTERVAL)]
    pub rate_limit_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Runs one API operation with bounded rate-limit and re-authentication
/// retries.
///
/// A valid token is obtained from the manager before each auth cycle and
/// handed to the operation as its parameter; the operation performs one
/// HTTP call with it. Rate-limited calls (429) are retried on a fixed
/// interval up to the policy's ceiling. A failure classified as an
/// authentication failure invalidates the cached token and starts a new
/// auth cycle with a full rate-limit budget; a second consecutive auth
/// failure is returned as-is. Everything else, success or not, goes back
/// to the caller untouched.
///
/// Cancellation is observed during the rate-limit wait and surfaces as
/// [`ApiError::Cancelled`].
///
/// # Errors
/// - the token manager's error if a valid token cannot be obtained
/// - [`ApiError::RetryExhausted`] when every call of a cycle was rate limited
/// - [`ApiError::Cancelled`] when cancelled while waiting to retry
/// - the operation's own error for non-retryable failures
pub async fn execute_with_retry_and_auth<T, F, Fut>(
    cancel: &CancellationToken,
    token_manager: &TokenManager,
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, ApiError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut auth_attempt: u32 = 1;
    loop {
        let token = token_manager.get_valid_token().await?;

        let mut rate_limit_attempts: u32 = 0;
        loop {
            match operation(token.clone()).await {
                Err(error) if error.is_rate_limited() => {
                    rate_limit_attempts += 1;
                    if rate_limit_attempts >= policy.max_rate_limit_attempts {
                        warn!(
                            "giving up after {} rate-limited attempts",
                            rate_limit_attempts
                        );
                        return Err(ApiError::RetryExhausted {
                            attempts: rate_limit_attempts,
                        });
                    }
                    debug!(
                        "rate limited, retrying in {:?} (attempt {}/{})",
                        policy.rate_limit_interval, rate_limit_attempts, policy.max_rate_limit_attempts
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(policy.rate_limit_interval) => {}
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    }
                }
                Err(error)
                    if auth_attempt < policy.max_auth_attempts && is_auth_error(&error) =>
                {
                    debug!(
                        "authentication failure, invalidating token for retry: {}",
                        error
                    );
                    token_manager.invalidate_token().await;
                    break;
                }
                other => return other,
            }
        }

        auth_attempt += 1;
    }
}

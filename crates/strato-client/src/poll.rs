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
use log::debug;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use strato_common::diagnostics::Diagnostics;
use strato_common::error::ApiError;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

// Default values for configurable parameters
const DEFAULT_MAX_NOT_FOUND_ATTEMPTS: u32 = 10;

/// Tick interval and 404 grace budget for convergence polling.
///
/// The control plane is eventually consistent: a create call can return
/// before the resource is queryable, so a bounded run of consecutive 404s
/// is tolerated before polling fails.
#[derive(Builder, Debug, Clone)]
pub struct PollPolicy {
    /// Time between successive fetches
    pub interval: Duration,
    /// Consecutive 404 responses tolerated before giving up (defaults to 10)
    #[builder(default = DEFAULT_MAX_NOT_FOUND_ATTEMPTS)]
    pub max_not_found_attempts: u32,
}

/// Names the object being polled, for diagnostics and logs.
#[derive(Builder, Debug, Clone)]
#[builder(on(String, into))]
pub struct PollTarget {
    /// Resource type name, e.g. "vpc" or "security group"
    pub resource: String,
    /// Cloud-side identifier of the resource instance
    pub id: String,
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, self.id)
    }
}

/// Polls `fetch` until the extracted status matches one of
/// `target_statuses`.
///
/// Returns the fetched value once a target status is reached, or `None`
/// after appending an error diagnostic when polling fails: the 404 grace
/// budget is exhausted, the fetch fails with any other error, or the
/// caller cancels. Transient 404s within the budget are logged and
/// retried.
pub async fn poll_until_result<T, F, Fut, S>(
    cancel: &CancellationToken,
    policy: &PollPolicy,
    target: &PollTarget,
    target_statuses: &[&str],
    diagnostics: &mut Diagnostics,
    fetch: F,
    status_of: S,
) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    S: Fn(&T) -> String,
{
    poll_loop(
        cancel,
        policy,
        target,
        target_statuses,
        None,
        diagnostics,
        fetch,
        status_of,
    )
    .await
}

/// Variant of [`poll_until_result`] bounded by a hard timeout.
///
/// The timeout firing is terminal and reported distinctly from 404
/// exhaustion, so callers can say "timed out" rather than "not found".
#[allow(clippy::too_many_arguments)]
pub async fn poll_until_result_with_timeout<T, F, Fut, S>(
    cancel: &CancellationToken,
    policy: &PollPolicy,
    target: &PollTarget,
    timeout: Duration,
    target_statuses: &[&str],
    diagnostics: &mut Diagnostics,
    fetch: F,
    status_of: S,
) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    S: Fn(&T) -> String,
{
    poll_loop(
        cancel,
        policy,
        target,
        target_statuses,
        Some(timeout),
        diagnostics,
        fetch,
        status_of,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop<T, F, Fut, S>(
    cancel: &CancellationToken,
    policy: &PollPolicy,
    target: &PollTarget,
    target_statuses: &[&str],
    timeout: Option<Duration>,
    diagnostics: &mut Diagnostics,
    fetch: F,
    status_of: S,
) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    S: Fn(&T) -> String,
{
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut ticker = interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut not_found_attempts: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                diagnostics.add_error(
                    format!("gave up waiting for {}", target),
                    "operation cancelled".to_string(),
                );
                return None;
            }
            // The async block defers the unwrap: a disabled select branch
            // still evaluates its expression.
            _ = async { sleep_until(deadline.unwrap()).await }, if deadline.is_some() => {
                diagnostics.add_error(
                    format!("timed out waiting for {}", target),
                    format!(
                        "deadline exceeded before reaching one of {:?}",
                        target_statuses
                    ),
                );
                return None;
            }
        }

        match fetch().await {
            Ok(value) => {
                not_found_attempts = 0;
                let status = status_of(&value);
                if target_statuses.iter().any(|wanted| *wanted == status) {
                    debug!("{} reached status {}", target, status);
                    return Some(value);
                }
                debug!(
                    "{} in status {}, waiting for one of {:?}",
                    target, status, target_statuses
                );
            }
            Err(error) if error.is_not_found() => {
                not_found_attempts += 1;
                if not_found_attempts > policy.max_not_found_attempts {
                    diagnostics.add_error(
                        format!("{} not found", target),
                        format!(
                            "resource not found after {} retries: {}",
                            policy.max_not_found_attempts, error
                        ),
                    );
                    return None;
                }
                // Normal right after a create: the control plane has not
                // made the resource queryable yet.
                debug!(
                    "{} not visible yet ({}/{}), continuing to poll",
                    target, not_found_attempts, policy.max_not_found_attempts
                );
            }
            Err(error) => {
                diagnostics.add_error(format!("failed to read {}", target), error.to_string());
                return None;
            }
        }
    }
}

/// Polls `check` until the resource is confirmed gone.
///
/// The check reports `true` once the resource is absent; a 404 from the
/// underlying fetch is equally treated as confirmed deletion rather than
/// an error. Any other failure propagates, and cancellation surfaces as
/// [`ApiError::Cancelled`].
pub async fn poll_until_deletion<F, Fut>(
    cancel: &CancellationToken,
    policy: &PollPolicy,
    target: &PollTarget,
    check: F,
) -> Result<(), ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool, ApiError>>,
{
    let mut ticker = interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
        }

        match check().await {
            Ok(true) => {
                debug!("{} confirmed deleted", target);
                return Ok(());
            }
            Ok(false) => debug!("{} still present, continuing to poll", target),
            Err(error) if error.is_not_found() => {
                debug!("{} no longer queryable, treating as deleted", target);
                return Ok(());
            }
            Err(error) => return Err(error),
        }
    }
}

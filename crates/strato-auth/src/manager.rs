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

use crate::error::AuthError;
use crate::identity::IdentityApi;
use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use strato_common::util::{default_clock, Clock};
use tokio::sync::Mutex;

/// Start revalidating a cached token this long before its expiry.
const DEFAULT_EARLY_REFRESH_SECONDS: i64 = 300; // 5 minutes

/// A bearer token cached together with its server-asserted expiry.
///
/// Owned exclusively by the [`TokenManager`] and only ever replaced as a
/// whole, so a token value is never cached without its matching expiry.
#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    pub(crate) value: String,
    pub(crate) expires_at: DateTime<Utc>,
}

/// Caches one bearer token per credential and renews it as it approaches
/// expiry.
///
/// A token comfortably inside its lifetime is returned without any network
/// call. Near expiry, one remote validation round-trip decides whether the
/// token can still be used; a token that fails validation is replaced by a
/// freshly issued one. All state is guarded by a single lock held across
/// the validation and issuance calls, so concurrent callers are serialized
/// onto at most one outstanding refresh.
#[derive(Builder)]
pub struct TokenManager {
    identity: Arc<dyn IdentityApi>,
    #[builder(default = default_clock())]
    clock: Arc<dyn Clock>,
    /// Seconds before expiry at which a cached token is revalidated
    /// rather than returned directly (defaults to 300 = 5 minutes)
    #[builder(default = DEFAULT_EARLY_REFRESH_SECONDS)]
    early_refresh_seconds: i64,
    #[builder(skip)]
    state: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    /// Returns a token usable for at least a short grace window.
    ///
    /// # Errors
    /// Returns an error only if a fresh token had to be issued and
    /// issuance failed; the previously cached token is left untouched.
    pub async fn get_valid_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            let remaining = cached.expires_at.signed_duration_since(self.clock.now());
            if remaining > TimeDelta::seconds(self.early_refresh_seconds) {
                debug!(
                    "using cached token, expires in {}s",
                    remaining.num_seconds()
                );
                return Ok(cached.value.clone());
            }

            // Near expiry: one validation round-trip decides whether the
            // token is still live. Validation failure is recovered by
            // re-issuing, never surfaced.
            match self.identity.validate_token(&cached.value).await {
                Ok(true) => {
                    debug!(
                        "cached token expires in {}s but is still live",
                        remaining.num_seconds()
                    );
                    return Ok(cached.value.clone());
                }
                Ok(false) => debug!("cached token rejected by identity service, reissuing"),
                Err(e) => warn!("token validation failed, reissuing: {}", e),
            }
        }

        self.issue_locked(&mut state).await
    }

    /// Issues a fresh token and replaces the cached one.
    ///
    /// # Errors
    /// On any failure (transport, missing token header, missing or
    /// unparseable expiry) the prior cached state is unchanged.
    pub async fn issue_new_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        self.issue_locked(&mut state).await
    }

    /// Clears the cached token unconditionally. Idempotent.
    pub async fn invalidate_token(&self) {
        let mut state = self.state.lock().await;
        if state.take().is_some() {
            debug!("invalidated cached token");
        }
    }

    /// Issuance with the state lock already held. Both `get_valid_token`
    /// and `issue_new_token` funnel through here so a refresh is never
    /// raced by another caller.
    async fn issue_locked(
        &self,
        state: &mut Option<CachedToken>,
    ) -> Result<String, AuthError> {
        let issued = self.identity.issue_token().await?;

        info!("issued new token, expires at {}", issued.expires_at);
        let value = issued.value.clone();
        *state = Some(CachedToken {
            value: issued.value,
            expires_at: issued.expires_at,
        });

        Ok(value)
    }

    #[cfg(test)]
    pub(crate) async fn cached(&self) -> Option<CachedToken> {
        self.state.lock().await.clone()
    }
}

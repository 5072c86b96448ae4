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

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use strato_auth::{AuthError, IdentityApi, IssuedToken, TokenManager};
use strato_common::error::ApiError;

/// Identity service that issues sequentially numbered tokens and counts
/// calls. Validation always succeeds.
pub struct CountingIdentity {
    issue_calls: AtomicUsize,
}

impl CountingIdentity {
    pub fn new() -> Self {
        Self {
            issue_calls: AtomicUsize::new(0),
        }
    }

    pub fn issue_calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityApi for CountingIdentity {
    async fn issue_token(&self) -> Result<IssuedToken, AuthError> {
        let n = self.issue_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IssuedToken {
            value: format!("token-{}", n),
            expires_at: Utc::now() + TimeDelta::hours(1),
        })
    }

    async fn validate_token(&self, _token: &str) -> Result<bool, AuthError> {
        Ok(true)
    }
}

/// Identity service whose issuance always fails.
pub struct BrokenIdentity;

#[async_trait]
impl IdentityApi for BrokenIdentity {
    async fn issue_token(&self) -> Result<IssuedToken, AuthError> {
        Err(AuthError::endpoint(
            StatusCode::INTERNAL_SERVER_ERROR,
            "identity service unavailable",
        ))
    }

    async fn validate_token(&self, _token: &str) -> Result<bool, AuthError> {
        Ok(false)
    }
}

pub fn manager_with(identity: Arc<dyn IdentityApi>) -> TokenManager {
    TokenManager::builder().identity(identity).build()
}

/// Operation double: pops the next canned result per call, recording the
/// token each call was handed.
pub struct ScriptedOperation {
    script: Mutex<VecDeque<Result<String, ApiError>>>,
    tokens_seen: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedOperation {
    pub fn new(script: Vec<Result<String, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            tokens_seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn invoke(
        self: &Arc<Self>,
    ) -> impl Fn(String) -> std::future::Ready<Result<String, ApiError>> {
        let this = Arc::clone(self);
        move |token: String| {
            this.calls.fetch_add(1, Ordering::SeqCst);
            this.tokens_seen.lock().unwrap().push(token);
            let next = this
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("operation invoked more often than scripted");
            std::future::ready(next)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

pub fn rate_limited() -> ApiError {
    ApiError::status(StatusCode::TOO_MANY_REQUESTS, "request rate exceeded")
}

pub fn unauthorized(message: &str) -> ApiError {
    ApiError::status(StatusCode::UNAUTHORIZED, message)
}

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

pub mod client;
pub mod poll;
pub mod retry;

pub use client::{StratoClient, StratoClientConfig};
pub use poll::{poll_until_deletion, poll_until_result, poll_until_result_with_timeout};
pub use poll::{PollPolicy, PollTarget};
pub use retry::{execute_with_retry_and_auth, RetryPolicy};

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

#[cfg(test)]
mod tests;

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Registry of per-resource-ID locks used to serialize conflicting
/// mutations of one cloud object.
///
/// Concurrent operations that read-modify-write the same parent resource
/// (route tables under one VPC, rules on one security group) must hold the
/// lock for that resource's ID across their whole critical section. All
/// callers asking for the same ID observe the same lock instance.
///
/// Entries are created on first request and never evicted, so the registry
/// grows monotonically with the number of distinct IDs touched. That is
/// bounded for a provider process working one plan at a time; a long-lived
/// server reusing this type would need eviction.
///
/// Construct one registry at provider startup and share it by reference.
/// Keeping the registry an explicit object (rather than process-global
/// state) keeps its lifetime visible and test runs isolated.
pub struct ResourceLockRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ResourceLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock for `id`, creating it on first access.
    ///
    /// The internal map lock is held only for the create-if-absent lookup;
    /// the caller then holds the returned lock for as long as its critical
    /// section runs, which may be seconds for a full CRUD cycle.
    pub fn lock_for(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("registering lock for resource {}", id);
                Arc::new(AsyncMutex::new(()))
            })
            .clone()
    }

    /// Number of distinct IDs the registry has handed out locks for.
    pub fn tracked_ids(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

impl Default for ResourceLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Async module cache
//!
//! Async modules settle after their chunks load and the host materializes
//! them. Each one is tracked by a [`TrackedModule`] that records its status
//! alongside the handle the scheduler waits on.

use crate::error::SharedError;
use crate::handle::{HandleKind, PendingHandle};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

/// Status of an async module
#[derive(Debug, Clone)]
pub enum ModuleStatus {
    /// Chunks are loading or the module is being materialized
    Pending,
    /// The module's exports
    Fulfilled(Value),
    /// Why the module failed; replayed forever
    Rejected(SharedError),
}

/// Tracked completion of one async module
#[derive(Clone)]
pub struct TrackedModule {
    status: Arc<RwLock<ModuleStatus>>,
    handle: PendingHandle,
}

impl TrackedModule {
    /// Track `work`, recording its result once it settles
    pub(crate) fn new<F>(module_id: &str, work: F) -> Self
    where
        F: Future<Output = Result<Value, SharedError>> + Send + 'static,
    {
        let status = Arc::new(RwLock::new(ModuleStatus::Pending));
        let tracked = Arc::clone(&status);
        let id = module_id.to_string();

        let handle = PendingHandle::new(HandleKind::Module, module_id, async move {
            match work.await {
                Ok(exports) => {
                    trace!(module = %id, "async module fulfilled");
                    *tracked.write() = ModuleStatus::Fulfilled(exports);
                    Ok(())
                }
                Err(reason) => {
                    debug!(module = %id, error = %reason, "async module rejected");
                    *tracked.write() = ModuleStatus::Rejected(Arc::clone(&reason));
                    Err(reason)
                }
            }
        });

        Self { status, handle }
    }

    /// Snapshot of the current status
    pub fn status(&self) -> ModuleStatus {
        self.status.read().clone()
    }

    /// Inspect the status without cloning the exports
    pub fn with_status<R>(&self, f: impl FnOnce(&ModuleStatus) -> R) -> R {
        f(&self.status.read())
    }

    /// Handle that settles with the module
    pub fn handle(&self) -> &PendingHandle {
        &self.handle
    }

    /// Check if the module is still pending
    pub fn is_pending(&self) -> bool {
        self.with_status(|status| matches!(status, ModuleStatus::Pending))
    }

    /// Check if the module fulfilled
    pub fn is_fulfilled(&self) -> bool {
        self.with_status(|status| matches!(status, ModuleStatus::Fulfilled(_)))
    }

    /// Check if the module rejected
    pub fn is_rejected(&self) -> bool {
        self.with_status(|status| matches!(status, ModuleStatus::Rejected(_)))
    }
}

impl std::fmt::Debug for TrackedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedModule")
            .field("module", &self.handle.key())
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Thread-safe cache of async modules keyed by module id
#[derive(Clone, Default)]
pub struct AsyncModuleCache {
    modules: Arc<DashMap<String, TrackedModule>>,
}

impl AsyncModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a tracked module by id
    pub fn get(&self, module_id: &str) -> Option<TrackedModule> {
        self.modules.get(module_id).map(|entry| entry.value().clone())
    }

    /// Check if a module is tracked
    pub fn contains(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    /// Get the tracked module, creating it with `create` on first use.
    /// The flag is `true` when this call created it.
    pub fn get_or_insert_with(
        &self,
        module_id: &str,
        create: impl FnOnce() -> TrackedModule,
    ) -> (TrackedModule, bool) {
        match self.modules.entry(module_id.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => (entry.insert(create()).value().clone(), true),
        }
    }

    /// Number of tracked modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlightError;
    use serde_json::json;

    #[tokio::test]
    async fn test_status_follows_work() {
        let (tx, rx) = futures::channel::oneshot::channel::<Value>();
        let tracked = TrackedModule::new("m2", async move {
            rx.await
                .map_err(|_| Arc::new(FlightError::ModuleNotPreloaded("m2".to_string())))
        });

        assert!(tracked.is_pending());
        tx.send(json!({ "x": 1 })).unwrap();
        tracked.handle().clone().await.unwrap();

        assert!(tracked.is_fulfilled());
        assert!(matches!(tracked.status(), ModuleStatus::Fulfilled(ref v) if v == &json!({ "x": 1 })));
    }

    #[tokio::test]
    async fn test_rejection_is_recorded() {
        let reason = Arc::new(FlightError::ChunkNotPreloaded("c9".to_string()));
        let expected = Arc::clone(&reason);
        let tracked = TrackedModule::new("m3", async move { Err(reason) });

        assert!(tracked.handle().clone().await.is_err());
        assert!(tracked.is_rejected());
        tracked.with_status(|status| match status {
            ModuleStatus::Rejected(stored) => assert!(Arc::ptr_eq(stored, &expected)),
            other => panic!("expected rejection, got {other:?}"),
        });
    }

    #[test]
    fn test_get_or_insert_creates_once() {
        let cache = AsyncModuleCache::new();
        let (first, created) =
            cache.get_or_insert_with("m1", || TrackedModule::new("m1", async { Ok(json!({})) }));
        assert!(created);

        let (second, created) = cache.get_or_insert_with("m1", || {
            panic!("existing module must not be recreated")
        });
        assert!(!created);
        assert!(first.handle().same_as(second.handle()));
        assert!(cache.contains("m1"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("m2").is_none());
    }
}

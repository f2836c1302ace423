// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host primitives the loader is built on

use futures::future::BoxFuture;
use serde_json::Value;

/// Host loader that fetches chunks and materializes modules.
///
/// The loader caches call `load_chunk` at most once per chunk id, while
/// holding the cache entry for that chunk. Implementations must not call
/// back into the caches from `load_chunk`.
pub trait HostLoader: Send + Sync {
    /// Begin loading a chunk. The future settles once the chunk is evaluated.
    fn load_chunk(&self, chunk: &str) -> BoxFuture<'static, anyhow::Result<()>>;

    /// Produce a module's exports. Only called once every chunk the module
    /// depends on has loaded.
    fn materialize(&self, module_id: &str) -> anyhow::Result<Value>;
}

/// Executor that drives pending handles without anyone awaiting them
pub trait TaskSpawner: Send + Sync {
    /// Run a task to completion in the background
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawner backed by a Tokio runtime
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioSpawner {
    /// Spawn onto the given runtime
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawn onto the runtime of the current context, if any
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

#[cfg(feature = "tokio")]
impl TaskSpawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        // Detached; the handle observes the result
        drop(self.handle.spawn(task));
    }
}

#[cfg(all(test, feature = "tokio"))]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_tokio_spawner_runs_task() {
        let spawner = TokioSpawner::try_current().expect("inside a runtime");
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let (tx, rx) = futures::channel::oneshot::channel();

        spawner.spawn(
            async move {
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(());
            }
            .boxed(),
        );

        rx.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_no_runtime() {
        assert!(TokioSpawner::try_current().is_none());
    }
}

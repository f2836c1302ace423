// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Flight module loader
//!
//! `preload` starts every load a reference needs without ever suspending.
//! `require` is synchronous: it either returns the export, or hands back the
//! handle the scheduler should wait on before calling it again.

use crate::chunk_cache::{ChunkCache, ChunkRequest, ChunkState};
use crate::config::LoaderConfig;
use crate::error::{FlightError, Result, SharedError};
use crate::handle::{HandleKind, PendingHandle};
use crate::host::{HostLoader, TaskSpawner};
use crate::manifest::BundlerConfig;
use crate::module_cache::{AsyncModuleCache, ModuleStatus, TrackedModule};
use crate::reference::ModuleReference;
use crate::resolver;
use futures::future;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Result of a synchronous `require`
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    /// The value is available
    Ready(T),
    /// Not ready; retry once the handle settles
    Pending(PendingHandle),
    /// Terminal failure
    Failed(SharedError),
}

impl<T> Resolution<T> {
    /// Check if the value is available
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Check if the caller should suspend
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Check if the resolution failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The value, if ready
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The handle to wait on, if pending
    pub fn pending(&self) -> Option<&PendingHandle> {
        match self {
            Self::Pending(handle) => Some(handle),
            _ => None,
        }
    }

    /// The failure, if failed
    pub fn failure(&self) -> Option<&SharedError> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Map a ready value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Ready(value) => Resolution::Ready(f(value)),
            Self::Pending(handle) => Resolution::Pending(handle),
            Self::Failed(reason) => Resolution::Failed(reason),
        }
    }
}

impl<T> From<Result<T>> for Resolution<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(Arc::new(err)),
        }
    }
}

/// Lazy client module loader over injected caches
pub struct FlightModuleLoader {
    host: Arc<dyn HostLoader>,
    chunks: ChunkCache,
    modules: AsyncModuleCache,
    bundler_config: Option<Arc<BundlerConfig>>,
    spawner: Option<Arc<dyn TaskSpawner>>,
}

impl FlightModuleLoader {
    /// Create a loader with fresh caches
    pub fn new(host: Arc<dyn HostLoader>) -> Self {
        Self::with_caches(host, ChunkCache::new(), AsyncModuleCache::new())
    }

    /// Create a loader over existing caches
    pub fn with_caches(
        host: Arc<dyn HostLoader>,
        chunks: ChunkCache,
        modules: AsyncModuleCache,
    ) -> Self {
        Self {
            host,
            chunks,
            modules,
            bundler_config: None,
            spawner: None,
        }
    }

    /// Drive newly started loads on `spawner`
    pub fn with_spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Resolve client references against `config`
    pub fn with_bundler_config(mut self, config: BundlerConfig) -> Self {
        self.bundler_config = Some(Arc::new(config));
        self
    }

    /// Create a loader from configuration.
    ///
    /// Eager loading only takes effect when a Tokio runtime is current.
    pub fn from_config(host: Arc<dyn HostLoader>, config: &LoaderConfig) -> Result<Self> {
        let mut loader = Self::new(host);
        if let Some(manifest) = config.load_manifest()? {
            loader = loader.with_bundler_config(manifest);
        }

        #[cfg(feature = "tokio")]
        if config.eager {
            match crate::host::TokioSpawner::try_current() {
                Some(spawner) => loader = loader.with_spawner(Arc::new(spawner)),
                None => warn!("eager loading requested outside a Tokio runtime; loads stay lazy"),
            }
        }

        Ok(loader)
    }

    /// The chunk cache
    pub fn chunk_cache(&self) -> &ChunkCache {
        &self.chunks
    }

    /// The async module cache
    pub fn module_cache(&self) -> &AsyncModuleCache {
        &self.modules
    }

    /// Resolve client reference metadata with this loader's manifest
    pub fn resolve_client_reference(&self, metadata: &ModuleReference) -> Result<ModuleReference> {
        resolver::resolve_client_reference(self.bundler_config.as_deref(), metadata)
    }

    /// Start loading everything `reference` needs.
    ///
    /// Never suspends. Returns a handle that settles once the outstanding
    /// work for this reference has settled, or `None` if nothing is
    /// outstanding.
    pub fn preload(&self, reference: &ModuleReference) -> Option<PendingHandle> {
        let mut waiting = Vec::new();
        let mut prior_failure = None;

        for chunk in reference.chunks() {
            match self.chunks.request(chunk, self.host.as_ref()) {
                ChunkRequest::Started(handle) => {
                    self.drive(&handle);
                    waiting.push(handle);
                }
                ChunkRequest::InFlight(handle) => waiting.push(handle),
                ChunkRequest::Loaded => {}
                ChunkRequest::Failed(reason) => {
                    prior_failure.get_or_insert(reason);
                }
            }
        }

        if reference.is_async() {
            let (tracked, created) = self.modules.get_or_insert_with(reference.id(), || {
                self.track_async_module(reference.id(), waiting, prior_failure)
            });
            if created {
                debug!(module = reference.id(), "tracking async module");
                self.drive(tracked.handle());
            }
            return tracked.is_pending().then(|| tracked.handle().clone());
        }

        match waiting.len() {
            0 => None,
            1 => waiting.pop(),
            _ => {
                let batch = PendingHandle::new(HandleKind::Batch, reference.id(), async move {
                    future::try_join_all(waiting).await.map(|_| ())
                });
                Some(batch)
            }
        }
    }

    /// Synchronously dereference `reference` into its export value
    pub fn require(&self, reference: &ModuleReference) -> Resolution<Value> {
        if reference.is_async() {
            return self.require_async_module(reference);
        }

        for chunk in reference.chunks() {
            match self.chunks.state(chunk) {
                Some(ChunkState::Loaded) => {}
                Some(ChunkState::Pending(handle)) => {
                    trace!(module = reference.id(), chunk = chunk.as_str(), "suspending on chunk");
                    return Resolution::Pending(handle);
                }
                Some(ChunkState::Failed(reason)) => return Resolution::Failed(reason),
                None => {
                    warn!(module = reference.id(), chunk = chunk.as_str(), "chunk required before preload");
                    return Resolution::Failed(Arc::new(FlightError::ChunkNotPreloaded(
                        chunk.clone(),
                    )));
                }
            }
        }

        self.host
            .materialize(reference.id())
            .map_err(|err| FlightError::materialize(reference.id(), err))
            .and_then(|exports| reference.name().project(reference.id(), &exports))
            .into()
    }

    fn require_async_module(&self, reference: &ModuleReference) -> Resolution<Value> {
        let Some(tracked) = self.modules.get(reference.id()) else {
            warn!(module = reference.id(), "async module required before preload");
            return Resolution::Failed(Arc::new(FlightError::ModuleNotPreloaded(
                reference.id().to_string(),
            )));
        };

        tracked.with_status(|status| match status {
            ModuleStatus::Fulfilled(exports) => {
                reference.name().project(reference.id(), exports).into()
            }
            ModuleStatus::Rejected(reason) => Resolution::Failed(Arc::clone(reason)),
            ModuleStatus::Pending => {
                trace!(module = reference.id(), "suspending on async module");
                Resolution::Pending(tracked.handle().clone())
            }
        })
    }

    fn track_async_module(
        &self,
        module_id: &str,
        waiting: Vec<PendingHandle>,
        prior_failure: Option<SharedError>,
    ) -> TrackedModule {
        let host = Arc::clone(&self.host);
        let id = module_id.to_string();

        TrackedModule::new(module_id, async move {
            if let Some(reason) = prior_failure {
                return Err(reason);
            }
            future::try_join_all(waiting).await?;
            host.materialize(&id)
                .map_err(|err| Arc::new(FlightError::materialize(&id, err)))
        })
    }

    fn drive(&self, handle: &PendingHandle) {
        if let Some(spawner) = &self.spawner {
            spawner.spawn(handle.driver());
        }
    }
}

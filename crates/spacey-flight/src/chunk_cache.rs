// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Chunk load cache
//!
//! Tracks every chunk the host has been asked to load. A chunk that is not
//! in the map has never been requested; once requested it moves from
//! pending to loaded or failed and never changes again.

use crate::error::{FlightError, SharedError};
use crate::handle::{HandleKind, PendingHandle};
use crate::host::HostLoader;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Load state of a requested chunk
#[derive(Debug, Clone)]
pub enum ChunkState {
    /// The host is loading the chunk
    Pending(PendingHandle),
    /// The chunk loaded successfully
    Loaded,
    /// The chunk failed to load; the error is replayed forever
    Failed(SharedError),
}

/// Outcome of asking the cache for a chunk
#[derive(Debug, Clone)]
pub enum ChunkRequest {
    /// This call issued the load
    Started(PendingHandle),
    /// An earlier call issued the load and it has not settled
    InFlight(PendingHandle),
    /// Already loaded
    Loaded,
    /// Already failed
    Failed(SharedError),
}

/// Thread-safe, deduplicating chunk cache
#[derive(Clone, Default)]
pub struct ChunkCache {
    entries: Arc<DashMap<String, ChunkState>>,
}

impl ChunkCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a chunk, `None` if it was never requested
    pub fn state(&self, chunk: &str) -> Option<ChunkState> {
        self.entries.get(chunk).map(|entry| entry.value().clone())
    }

    /// Check if a chunk has loaded
    pub fn is_loaded(&self, chunk: &str) -> bool {
        matches!(self.state(chunk), Some(ChunkState::Loaded))
    }

    /// Request a chunk, issuing the host load only if it was never requested
    pub fn request(&self, chunk: &str, host: &dyn HostLoader) -> ChunkRequest {
        match self.entries.entry(chunk.to_string()) {
            Entry::Occupied(entry) => match entry.get() {
                ChunkState::Pending(handle) => ChunkRequest::InFlight(handle.clone()),
                ChunkState::Loaded => ChunkRequest::Loaded,
                ChunkState::Failed(reason) => ChunkRequest::Failed(Arc::clone(reason)),
            },
            Entry::Vacant(entry) => {
                debug!(chunk, "requesting chunk from host");
                let load = host.load_chunk(chunk);
                let entries = Arc::clone(&self.entries);
                let key = chunk.to_string();

                let handle = PendingHandle::new(HandleKind::Chunk, chunk, async move {
                    match load.await {
                        Ok(()) => {
                            trace!(chunk = %key, "chunk loaded");
                            entries.insert(key, ChunkState::Loaded);
                            Ok(())
                        }
                        Err(err) => {
                            let reason = Arc::new(FlightError::chunk_load(&key, err));
                            warn!(chunk = %key, error = %reason, "chunk failed to load");
                            entries.insert(key, ChunkState::Failed(Arc::clone(&reason)));
                            Err(reason)
                        }
                    }
                });

                entry.insert(ChunkState::Pending(handle.clone()));
                ChunkRequest::Started(handle)
            }
        }
    }

    /// Number of requested chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no chunk was ever requested
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use serde_json::Value;

    #[derive(Default)]
    struct ImmediateHost {
        requested: Mutex<Vec<String>>,
    }

    impl HostLoader for ImmediateHost {
        fn load_chunk(&self, chunk: &str) -> BoxFuture<'static, anyhow::Result<()>> {
            self.requested.lock().push(chunk.to_string());
            let failing = chunk.starts_with("bad");
            async move {
                if failing {
                    Err(anyhow!("404 Not Found"))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn materialize(&self, module_id: &str) -> anyhow::Result<Value> {
            Err(anyhow!("unexpected materialize of {module_id}"))
        }
    }

    #[test]
    fn test_absent_until_requested() {
        let cache = ChunkCache::new();
        assert!(cache.is_empty());
        assert!(cache.state("c1").is_none());
        assert!(!cache.is_loaded("c1"));
    }

    #[tokio::test]
    async fn test_request_dedups_and_settles() {
        let host = ImmediateHost::default();
        let cache = ChunkCache::new();

        let ChunkRequest::Started(handle) = cache.request("c1", &host) else {
            panic!("first request should start a load");
        };
        let ChunkRequest::InFlight(again) = cache.request("c1", &host) else {
            panic!("second request should join the load");
        };
        assert!(handle.same_as(&again));
        assert!(matches!(cache.state("c1"), Some(ChunkState::Pending(_))));

        handle.await.unwrap();
        assert!(cache.is_loaded("c1"));
        assert!(matches!(cache.request("c1", &host), ChunkRequest::Loaded));
        assert_eq!(*host.requested.lock(), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_is_permanent() {
        let host = ImmediateHost::default();
        let cache = ChunkCache::new();

        let ChunkRequest::Started(handle) = cache.request("bad-chunk", &host) else {
            panic!("first request should start a load");
        };
        let reason = handle.await.unwrap_err();
        assert!(reason.to_string().contains("404 Not Found"));

        let Some(ChunkState::Failed(stored)) = cache.state("bad-chunk") else {
            panic!("chunk should be failed");
        };
        assert!(Arc::ptr_eq(&reason, &stored));

        let ChunkRequest::Failed(replayed) = cache.request("bad-chunk", &host) else {
            panic!("failed chunk should not be retried");
        };
        assert!(Arc::ptr_eq(&reason, &replayed));
        assert_eq!(host.requested.lock().len(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let host = ImmediateHost::default();
        let cache = ChunkCache::new();
        let shared = cache.clone();

        cache.request("c1", &host);
        assert!(matches!(shared.request("c1", &host), ChunkRequest::InFlight(_)));
        assert_eq!(shared.len(), 1);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Pending handles
//!
//! A [`PendingHandle`] is the suspension signal handed to the scheduler: it
//! can be cloned freely, every clone observes the same settlement, and the
//! underlying work runs at most once no matter how many clones are awaited.

use crate::error::SharedError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Outcome a pending handle settles to
pub type Settlement = std::result::Result<(), SharedError>;

/// What a pending handle is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// A single chunk load
    Chunk,
    /// An async module's tracked completion
    Module,
    /// Every outstanding load of one preload call
    Batch,
}

/// Awaitable, cloneable handle to in-flight loading work
#[derive(Clone)]
pub struct PendingHandle {
    kind: HandleKind,
    key: Arc<str>,
    inner: Shared<BoxFuture<'static, Settlement>>,
}

impl PendingHandle {
    /// Wrap loading work in a shared handle
    pub(crate) fn new<F>(kind: HandleKind, key: &str, work: F) -> Self
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        Self {
            kind,
            key: Arc::from(key),
            inner: work.boxed().shared(),
        }
    }

    /// Chunk id or module id this handle waits on
    pub fn key(&self) -> &str {
        &self.key
    }

    /// What this handle waits on
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Whether the work has settled
    pub fn is_settled(&self) -> bool {
        self.inner.peek().is_some()
    }

    /// The settlement, once the work has settled
    pub fn outcome(&self) -> Option<Settlement> {
        self.inner.peek().cloned()
    }

    /// Whether two handles share the same underlying work
    pub fn same_as(&self, other: &PendingHandle) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// A unit future that drives this handle to settlement
    pub(crate) fn driver(&self) -> BoxFuture<'static, ()> {
        self.clone().map(|_| ()).boxed()
    }
}

impl Future for PendingHandle {
    type Output = Settlement;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

impl fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHandle")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("settled", &self.is_settled())
            .finish()
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-flight
//!
//! Lazy client module loading for Spacey's streaming UI runtime.
//!
//! The server never streams code. It streams [`ModuleReference`]s: a module
//! id, the chunks that module lives in, which export to use, and whether the
//! module is async. This crate turns those references into values:
//!
//! - [`resolve_client_reference`] maps stream metadata through the bundler's
//!   client manifest
//! - [`FlightModuleLoader::preload`] asks the host for each chunk at most once
//!   and never suspends
//! - [`FlightModuleLoader::require`] is synchronous and returns a
//!   [`Resolution`]: the export, a [`PendingHandle`] to wait on before
//!   retrying, or a terminal failure
//!
//! ## Example
//!
//! ```rust,ignore
//! use spacey_flight::{FlightModuleLoader, ModuleReference, Resolution};
//!
//! let loader = FlightModuleLoader::new(host);
//! let reference = ModuleReference::new("./Counter.js", ["client0"], "Counter");
//!
//! loader.preload(&reference);
//! let counter = loop {
//!     match loader.require(&reference) {
//!         Resolution::Ready(value) => break value,
//!         Resolution::Pending(handle) => { let _ = handle.await; }
//!         Resolution::Failed(reason) => return Err(reason),
//!     }
//! };
//! ```
//!
//! Loads are lazy by default: a pending handle makes progress when it is
//! awaited. Attach a [`TaskSpawner`] (or set `SPACEY_FLIGHT_EAGER`) to drive
//! them in the background.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk_cache;
pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod loader;
pub mod manifest;
pub mod module_cache;
pub mod reference;
pub mod resolver;

// Re-exports
pub use chunk_cache::{ChunkCache, ChunkRequest, ChunkState};
pub use config::LoaderConfig;
pub use error::{FlightError, Result, SharedError};
pub use handle::{HandleKind, PendingHandle, Settlement};
#[cfg(feature = "tokio")]
pub use host::TokioSpawner;
pub use host::{HostLoader, TaskSpawner};
pub use loader::{FlightModuleLoader, Resolution};
pub use manifest::{BundlerConfig, ServerManifest};
pub use module_cache::{AsyncModuleCache, ModuleStatus, TrackedModule};
pub use reference::{ExportName, ModuleReference};
pub use resolver::{resolve_client_reference, resolve_server_reference};

/// Version of the spacey-flight crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

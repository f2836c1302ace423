// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for Flight module loading

use std::sync::Arc;
use thiserror::Error;

/// Result type for Flight module loading operations
pub type Result<T> = std::result::Result<T, FlightError>;

/// A failure stored in a cache and replayed to every later caller
pub type SharedError = Arc<FlightError>;

/// Errors that can occur while resolving or loading client modules
#[derive(Debug, Error)]
pub enum FlightError {
    /// The client manifest has no entry for a reference
    #[error("Could not find the module \"{id}#{name}\" in the client manifest")]
    UnresolvedReference {
        /// Client module id
        id: String,
        /// Export name
        name: String,
    },

    /// The server manifest has no entry for a server reference id
    #[error("Could not find the module \"{0}\" in the server manifest")]
    UnresolvedServerReference(String),

    /// The host loader rejected a chunk
    #[error("Failed to load chunk '{chunk}': {reason}")]
    ChunkLoad {
        /// Chunk id
        chunk: String,
        /// Reason reported by the host
        reason: String,
    },

    /// The host could not produce a module's exports
    #[error("Failed to materialize module '{module}': {reason}")]
    Materialize {
        /// Module id
        module: String,
        /// Reason reported by the host
        reason: String,
    },

    /// `require` reached a chunk that was never preloaded
    #[error("Chunk '{0}' was required before it was preloaded")]
    ChunkNotPreloaded(String),

    /// `require` reached an async module that was never preloaded
    #[error("Async module '{0}' was required before it was preloaded")]
    ModuleNotPreloaded(String),

    /// The module has no binding with the requested name
    #[error("Module '{module}' has no export named '{name}'")]
    MissingExport {
        /// Module id
        module: String,
        /// Export name
        name: String,
    },

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlightError {
    /// Create a chunk load error from a host failure
    pub fn chunk_load(chunk: impl Into<String>, err: anyhow::Error) -> Self {
        Self::ChunkLoad {
            chunk: chunk.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create a materialization error from a host failure
    pub fn materialize(module: impl Into<String>, err: anyhow::Error) -> Self {
        Self::Materialize {
            module: module.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create a missing export error
    pub fn missing_export(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingExport {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Whether this error comes from the host rather than from resolution
    pub fn is_host_failure(&self) -> bool {
        matches!(self, Self::ChunkLoad { .. } | Self::Materialize { .. })
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundler manifests
//!
//! The client manifest maps a client id and export name to the concrete
//! module reference produced by the bundler. The server manifest maps server
//! reference ids to module references.

use crate::error::Result;
use crate::reference::{ExportName, ModuleReference};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Client manifest: `client id -> export name -> resolved reference`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundlerConfig {
    modules: HashMap<String, HashMap<String, ModuleReference>>,
}

impl BundlerConfig {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a manifest from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            modules = config.len(),
            "loaded client manifest"
        );
        Ok(config)
    }

    /// Add or replace the entry for `client_id#name`
    pub fn insert(
        &mut self,
        client_id: impl Into<String>,
        name: impl Into<ExportName>,
        entry: ModuleReference,
    ) {
        let name: ExportName = name.into();
        self.modules
            .entry(client_id.into())
            .or_default()
            .insert(String::from(name), entry);
    }

    /// Look up the resolved reference for `client_id#name`
    pub fn lookup(&self, client_id: &str, name: &ExportName) -> Option<&ModuleReference> {
        self.modules.get(client_id)?.get(name.as_str())
    }

    /// Number of client ids in the manifest
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Server manifest: `server reference id -> resolved reference`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerManifest {
    references: HashMap<String, ModuleReference>,
}

impl ServerManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a manifest from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            references = manifest.len(),
            "loaded server manifest"
        );
        Ok(manifest)
    }

    /// Add or replace the entry for a server reference id
    pub fn insert(&mut self, id: impl Into<String>, entry: ModuleReference) {
        self.references.insert(id.into(), entry);
    }

    /// Look up a server reference id
    pub fn lookup(&self, id: &str) -> Option<&ModuleReference> {
        self.references.get(id)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Check if the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

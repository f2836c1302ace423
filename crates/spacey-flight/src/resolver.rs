// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Reference resolution against the bundler manifests

use crate::error::{FlightError, Result};
use crate::manifest::{BundlerConfig, ServerManifest};
use crate::reference::{ExportName, ModuleReference};

/// Resolve client reference metadata into a concrete module reference.
///
/// Without a manifest the metadata is already concrete and is returned as-is.
/// With one, `id#name` is looked up; for async metadata the resolved entry is
/// copied with the async flag forced on, since the classification from the
/// stream wins over whatever the manifest says.
pub fn resolve_client_reference(
    config: Option<&BundlerConfig>,
    metadata: &ModuleReference,
) -> Result<ModuleReference> {
    let Some(config) = config else {
        return Ok(metadata.clone());
    };

    let resolved = config
        .lookup(metadata.id(), metadata.name())
        .ok_or_else(|| FlightError::UnresolvedReference {
            id: metadata.id().to_string(),
            name: metadata.name().to_string(),
        })?;

    if metadata.is_async() {
        Ok(ModuleReference::new(
            resolved.id(),
            resolved.chunks().iter().cloned(),
            resolved.name().clone(),
        )
        .with_async(true))
    } else {
        Ok(resolved.clone())
    }
}

/// Resolve a server reference id.
///
/// An exact match takes its export name from the entry. Otherwise the id is
/// split at the last `#` into a module id and an export name.
pub fn resolve_server_reference(manifest: &ServerManifest, id: &str) -> Result<ModuleReference> {
    if let Some(entry) = manifest.lookup(id) {
        return Ok(entry.clone());
    }

    let (module_id, name) = id
        .rsplit_once('#')
        .ok_or_else(|| FlightError::UnresolvedServerReference(id.to_string()))?;
    let entry = manifest
        .lookup(module_id)
        .ok_or_else(|| FlightError::UnresolvedServerReference(id.to_string()))?;

    Ok(ModuleReference::new(
        entry.id(),
        entry.chunks().iter().cloned(),
        ExportName::from(name),
    )
    .with_async(entry.is_async()))
}

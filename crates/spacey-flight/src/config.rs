// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration

use crate::error::Result;
use crate::manifest::{BundlerConfig, ServerManifest};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the client manifest file
pub const MANIFEST_ENV: &str = "SPACEY_FLIGHT_MANIFEST";

/// Environment variable naming the server manifest file
pub const SERVER_MANIFEST_ENV: &str = "SPACEY_FLIGHT_SERVER_MANIFEST";

/// Environment variable enabling eager loads
pub const EAGER_ENV: &str = "SPACEY_FLIGHT_EAGER";

/// Configuration for a [`FlightModuleLoader`](crate::FlightModuleLoader)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Client manifest path; references are used as-is when unset
    pub manifest: Option<PathBuf>,

    /// Server manifest path
    pub server_manifest: Option<PathBuf>,

    /// Drive loads in the background instead of waiting for the scheduler
    pub eager: bool,
}

impl LoaderConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| var(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        Self {
            manifest: path(MANIFEST_ENV),
            server_manifest: path(SERVER_MANIFEST_ENV),
            eager: var(EAGER_ENV).is_some_and(|v| parse_flag(&v)),
        }
    }

    /// Load the client manifest, if one is configured
    pub fn load_manifest(&self) -> Result<Option<BundlerConfig>> {
        self.manifest
            .as_deref()
            .map(BundlerConfig::from_path)
            .transpose()
    }

    /// Load the server manifest, if one is configured
    pub fn load_server_manifest(&self) -> Result<Option<ServerManifest>> {
        self.server_manifest
            .as_deref()
            .map(ServerManifest::from_path)
            .transpose()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::from_vars(vars(&[]));
        assert_eq!(config, LoaderConfig::default());
        assert!(config.load_manifest().unwrap().is_none());
        assert!(config.load_server_manifest().unwrap().is_none());
    }

    #[test]
    fn test_from_vars() {
        let config = LoaderConfig::from_vars(vars(&[
            (MANIFEST_ENV, "/app/client-manifest.json"),
            (SERVER_MANIFEST_ENV, ""),
            (EAGER_ENV, "TRUE"),
        ]));

        assert_eq!(config.manifest, Some(PathBuf::from("/app/client-manifest.json")));
        assert_eq!(config.server_manifest, None);
        assert!(config.eager);

        let lazy = LoaderConfig::from_vars(vars(&[(EAGER_ENV, "0")]));
        assert!(!lazy.eager);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LoaderConfig = serde_json::from_str(r#"{ "eager": true }"#).unwrap();
        assert!(config.eager);
        assert!(config.manifest.is_none());
    }

    #[test]
    fn test_load_manifest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "./a.js": {{ "*": {{ "id": "1", "chunks": ["c1"], "name": "*" }} }} }}"#
        )
        .unwrap();

        let config = LoaderConfig {
            manifest: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let manifest = config.load_manifest().unwrap().unwrap();
        assert_eq!(manifest.len(), 1);
    }
}

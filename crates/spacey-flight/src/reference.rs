// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Client module references and export projection
//!
//! A reference names a module (`id`), the chunks that must be loaded before
//! the module can be materialized, and which binding to project out of its
//! exports.

use crate::error::{FlightError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Export name selecting the whole module namespace
pub const NAMESPACE_EXPORT: &str = "*";

/// Export name selecting the interop default export
pub const DEFAULT_INTEROP_EXPORT: &str = "";

/// Binding that marks an exports object as an ES module
pub const ES_MODULE_MARKER: &str = "__esModule";

/// Which binding of a module a reference points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExportName {
    /// The exports object itself (`import * as ns`)
    Namespace,
    /// The `default` binding of an ES module, or the whole CommonJS exports
    DefaultInterop,
    /// A named binding
    Named(String),
}

impl ExportName {
    /// The wire form of this export name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Namespace => NAMESPACE_EXPORT,
            Self::DefaultInterop => DEFAULT_INTEROP_EXPORT,
            Self::Named(name) => name,
        }
    }

    /// Project this binding out of a module's exports
    pub fn project(&self, module_id: &str, exports: &Value) -> Result<Value> {
        match self {
            Self::Namespace => Ok(exports.clone()),
            Self::DefaultInterop => {
                if is_es_module(exports) {
                    exports
                        .get("default")
                        .cloned()
                        .ok_or_else(|| FlightError::missing_export(module_id, "default"))
                } else {
                    // CommonJS: the exports object is the default
                    Ok(exports.clone())
                }
            }
            Self::Named(name) => exports
                .get(name)
                .cloned()
                .ok_or_else(|| FlightError::missing_export(module_id, name.as_str())),
        }
    }
}

impl From<&str> for ExportName {
    fn from(name: &str) -> Self {
        match name {
            NAMESPACE_EXPORT => Self::Namespace,
            DEFAULT_INTEROP_EXPORT => Self::DefaultInterop,
            other => Self::Named(other.to_string()),
        }
    }
}

impl From<String> for ExportName {
    fn from(name: String) -> Self {
        match name.as_str() {
            NAMESPACE_EXPORT => Self::Namespace,
            DEFAULT_INTEROP_EXPORT => Self::DefaultInterop,
            _ => Self::Named(name),
        }
    }
}

impl From<ExportName> for String {
    fn from(name: ExportName) -> Self {
        match name {
            ExportName::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ExportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an exports object carries a truthy `__esModule` marker
pub fn is_es_module(exports: &Value) -> bool {
    exports.get(ES_MODULE_MARKER).is_some_and(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reference to one export of a code-split client module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReference {
    id: String,
    #[serde(default)]
    chunks: Vec<String>,
    name: ExportName,
    #[serde(default, rename = "async")]
    is_async: bool,
}

impl ModuleReference {
    /// Create a synchronous module reference
    pub fn new<I, S>(id: impl Into<String>, chunks: I, name: impl Into<ExportName>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            chunks: chunks.into_iter().map(Into::into).collect(),
            name: name.into(),
            is_async: false,
        }
    }

    /// Copy of this reference with the async flag set
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Module id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Chunks in load order
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Export to project out of the module
    pub fn name(&self) -> &ExportName {
        &self.name
    }

    /// Whether the module is an async module that settles after evaluation
    pub fn is_async(&self) -> bool {
        self.is_async
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_name_sentinels() {
        assert_eq!(ExportName::from("*"), ExportName::Namespace);
        assert_eq!(ExportName::from(""), ExportName::DefaultInterop);
        assert_eq!(ExportName::from("foo"), ExportName::Named("foo".to_string()));
        assert_eq!(String::from(ExportName::Namespace), "*");
        assert_eq!(ExportName::DefaultInterop.as_str(), "");
    }

    #[test]
    fn test_project_es_module() {
        let exports = json!({ "default": 42, "foo": "bar", "__esModule": true });

        assert_eq!(ExportName::DefaultInterop.project("m", &exports).unwrap(), json!(42));
        assert_eq!(ExportName::from("foo").project("m", &exports).unwrap(), json!("bar"));
        assert_eq!(ExportName::Namespace.project("m", &exports).unwrap(), exports);
    }

    #[test]
    fn test_project_commonjs_default() {
        let exports = json!({ "default": 42, "foo": "bar" });
        assert_eq!(ExportName::DefaultInterop.project("m", &exports).unwrap(), exports);

        let falsy_marker = json!({ "default": 1, "__esModule": 0 });
        assert_eq!(
            ExportName::DefaultInterop.project("m", &falsy_marker).unwrap(),
            falsy_marker
        );
    }

    #[test]
    fn test_project_missing_binding() {
        let exports = json!({ "__esModule": true });

        let err = ExportName::from("nope").project("m1", &exports).unwrap_err();
        assert!(matches!(err, FlightError::MissingExport { ref name, .. } if name == "nope"));

        let err = ExportName::DefaultInterop.project("m1", &exports).unwrap_err();
        assert!(matches!(err, FlightError::MissingExport { ref name, .. } if name == "default"));
    }

    #[test]
    fn test_reference_deserialize() {
        let reference: ModuleReference = serde_json::from_value(json!({
            "id": "./src/Counter.js",
            "chunks": ["client0", "client1"],
            "name": "",
            "async": true
        }))
        .unwrap();

        assert_eq!(reference.id(), "./src/Counter.js");
        assert_eq!(reference.chunks(), ["client0", "client1"]);
        assert_eq!(reference.name(), &ExportName::DefaultInterop);
        assert!(reference.is_async());

        let sync: ModuleReference =
            serde_json::from_value(json!({ "id": "m", "name": "*" })).unwrap();
        assert!(sync.chunks().is_empty());
        assert!(!sync.is_async());
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Permission configuration loading
//!
//! Permissions are a list of `{ role, predicate }` records, either at the top
//! level of the document or under a `permissions` key:
//!
//! ```yaml
//! permissions:
//!   - role: admin
//!     predicate: "path-prefix('/')"
//!   - role: $unauthenticated
//!     predicate: "method(GET) and path-prefix('/public/')"
//! ```
//!
//! Loading is all-or-nothing: the first malformed record aborts it.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::acl::AccessControlList;
use crate::errors::ConfigError;
use crate::predicate::Predicate;
use crate::tracing_utils::{debug, info};

/// Key holding the permission list in a configuration document.
pub const PERMISSIONS_KEY: &str = "permissions";

/// A raw permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub role: String,
    pub predicate: String,
}

impl PermissionEntry {
    pub fn new(role: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            predicate: predicate.into(),
        }
    }
}

/// Builds an [`AccessControlList`] from permission records.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Validate and compile typed entries.
    pub fn load<I>(entries: I) -> Result<AccessControlList, ConfigError>
    where
        I: IntoIterator<Item = PermissionEntry>,
    {
        let mut acl = AccessControlList::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let predicate = Self::compile_entry(index, &entry)?;
            acl.add(entry.role, predicate);
        }

        info!(
            "loaded {} permission rules for {} roles",
            acl.rule_count(),
            acl.len()
        );
        Ok(acl)
    }

    /// Validate the structure of untyped records, then compile them.
    pub fn load_values(entries: &[Value]) -> Result<AccessControlList, ConfigError> {
        let typed = entries
            .iter()
            .enumerate()
            .map(|(index, value)| Self::entry_from_value(index, value))
            .collect::<Result<Vec<_>, _>>()?;
        Self::load(typed)
    }

    pub fn from_json_str(input: &str) -> Result<AccessControlList, ConfigError> {
        let document: Value =
            serde_json::from_str(input).map_err(|e| ConfigError::Format(e.to_string()))?;
        Self::from_document(&document)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(input: &str) -> Result<AccessControlList, ConfigError> {
        let document: Value =
            serde_yaml::from_str(input).map_err(|e| ConfigError::Format(e.to_string()))?;
        Self::from_document(&document)
    }

    /// Load a `.json`, `.yml` or `.yaml` configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<AccessControlList, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        debug!("read permissions from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            #[cfg(feature = "yaml")]
            Some("yml" | "yaml") => Self::from_yaml_str(&contents),
            #[cfg(not(feature = "yaml"))]
            Some("yml" | "yaml") => Err(ConfigError::Format(
                "aclgate has not been built with yaml support".to_string(),
            )),
            _ => Err(ConfigError::Format(format!(
                "unsupported configuration file {}, must be json or yaml",
                path.display()
            ))),
        }
    }

    fn from_document(document: &Value) -> Result<AccessControlList, ConfigError> {
        let entries = match document {
            Value::Array(entries) => entries,
            Value::Object(map) => match map.get(PERMISSIONS_KEY) {
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(ConfigError::Format(format!(
                        "'{PERMISSIONS_KEY}' must be a list"
                    )))
                }
                None => {
                    return Err(ConfigError::Format(format!(
                        "missing '{PERMISSIONS_KEY}' list"
                    )))
                }
            },
            _ => {
                return Err(ConfigError::Format(
                    "expected a list of permissions".to_string(),
                ))
            }
        };

        Self::load_values(entries)
    }

    fn entry_from_value(index: usize, value: &Value) -> Result<PermissionEntry, ConfigError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigError::Format(format!("permission entry #{index} is not a map")))?;

        let field = |name: &'static str| -> Result<String, ConfigError> {
            match obj.get(name) {
                None | Some(Value::Null) => Err(ConfigError::MissingField { index, field: name }),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(ConfigError::InvalidFieldType { index, field: name }),
            }
        };

        Ok(PermissionEntry {
            role: field("role")?,
            predicate: field("predicate")?,
        })
    }

    fn compile_entry(index: usize, entry: &PermissionEntry) -> Result<Predicate, ConfigError> {
        if entry.role.is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "role",
            });
        }
        if entry.predicate.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "predicate",
            });
        }

        Predicate::compile(&entry.predicate).map_err(|source| ConfigError::InvalidPredicate {
            index,
            role: entry.role.clone(),
            expression: entry.predicate.clone(),
            source,
        })
    }
}

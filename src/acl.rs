// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Role to rule index.

use std::collections::HashMap;

use crate::predicate::Predicate;

/// Mapping from role to the predicates granted to it.
///
/// Built once by [`crate::ConfigLoader`] and read-only afterwards. Lookups for
/// roles that were never configured return an empty slice without touching
/// the index.
#[derive(Debug, Clone, Default)]
pub struct AccessControlList {
    rules: HashMap<String, Vec<Predicate>>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, role: impl Into<String>, predicate: Predicate) {
        self.rules.entry(role.into()).or_default().push(predicate);
    }

    pub fn rules_for(&self, role: &str) -> &[Predicate] {
        self.rules.get(role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of configured roles.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

impl FromIterator<(String, Predicate)> for AccessControlList {
    fn from_iter<T: IntoIterator<Item = (String, Predicate)>>(iter: T) -> Self {
        let mut acl = Self::new();
        for (role, predicate) in iter {
            acl.add(role, predicate);
        }
        acl
    }
}

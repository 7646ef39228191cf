// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Access decision engine
//!
//! Answers whether a principal may perform a request:
//!
//! 1. an engine with no configured roles denies everything;
//! 2. the principal's effective roles are resolved (`$unauthenticated` for
//!    anonymous requests);
//! 3. access is granted as soon as any predicate of any of those roles
//!    matches the request, and denied otherwise.
//!
//! There are no deny rules and no rule priorities.

use std::path::Path;

use crate::acl::AccessControlList;
use crate::config::{ConfigLoader, PermissionEntry};
use crate::errors::ConfigError;
use crate::principal::Principal;
use crate::request::RequestContext;
use crate::tracing_utils::debug;

/// Authorization hook used by request-handling middleware.
pub trait Authorizer: Send + Sync {
    fn is_allowed(&self, principal: &Principal, request: &RequestContext) -> bool;
}

/// Fail-closed role-based access decision engine.
///
/// The engine only exists once its access control list has been fully
/// loaded. It is immutable afterwards and may be shared across threads
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AccessDecisionEngine {
    acl: AccessControlList,
}

impl AccessDecisionEngine {
    pub fn new(acl: AccessControlList) -> Self {
        Self { acl }
    }

    pub fn from_entries<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = PermissionEntry>,
    {
        ConfigLoader::load(entries).map(Self::new)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::from_file(path).map(Self::new)
    }

    pub fn acl(&self) -> &AccessControlList {
        &self.acl
    }

    pub fn is_allowed(&self, principal: &Principal, request: &RequestContext) -> bool {
        if self.acl.is_empty() {
            debug!("no permissions configured, denying {} {}", request.method(), request.path());
            return false;
        }

        let granted_by = principal.effective_roles().find(|role| {
            self.acl
                .rules_for(role)
                .iter()
                .any(|predicate| predicate.matches(request))
        });

        let allowed = granted_by.is_some();
        debug!(
            role = granted_by.unwrap_or_default(),
            authenticated = principal.is_authenticated(),
            "{} {} {}",
            if allowed { "allowed" } else { "denied" },
            request.method(),
            request.path()
        );
        allowed
    }
}

impl Authorizer for AccessDecisionEngine {
    fn is_allowed(&self, principal: &Principal, request: &RequestContext) -> bool {
        AccessDecisionEngine::is_allowed(self, principal, request)
    }
}

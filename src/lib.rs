// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Role-based access control for HTTP-style requests.
//!
//! Permissions are `(role, rule)` pairs loaded once at startup. Each rule is
//! compiled into a [`Predicate`] over a [`RequestContext`]; the
//! [`AccessDecisionEngine`] grants a request when any rule of any of the
//! principal's roles matches it, and denies it otherwise.
//!
//! ```ignore
//! use aclgate::{AccessDecisionEngine, PermissionEntry, Principal, RequestContext};
//!
//! let engine = AccessDecisionEngine::from_entries([
//!     PermissionEntry::new("admin", "method(GET) and path-prefix('/api/')"),
//!     PermissionEntry::new("$unauthenticated", "path-prefix('/public/')"),
//! ])?;
//!
//! let request = RequestContext::new("GET", "/api/users");
//! assert!(engine.is_allowed(&Principal::authenticated(["admin"]), &request));
//! assert!(!engine.is_allowed(&Principal::Anonymous, &request));
//! ```

pub mod acl;
pub mod config;
pub mod engine;
pub mod errors;
pub mod lexer;
pub mod predicate;
pub mod principal;
pub mod request;
pub mod storage;
mod tracing_utils;

pub use acl::AccessControlList;
pub use config::{ConfigLoader, PermissionEntry, PERMISSIONS_KEY};
pub use engine::{AccessDecisionEngine, Authorizer};
pub use errors::{CompileError, ConfigError, RequestError};
pub use predicate::{compile, Predicate};
pub use principal::{Principal, UNAUTHENTICATED_ROLE};
pub use request::RequestContext;
pub use tracing_utils::init_tracing;

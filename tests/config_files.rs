// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Loading permissions from files on disk.

use std::path::PathBuf;

use aclgate::{AccessDecisionEngine, CompileError, ConfigError, Principal, RequestContext};
use anyhow::Result;

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_permissions() -> Result<()> {
    let engine = AccessDecisionEngine::from_file(data_file("permissions.yml"))?;
    assert_eq!(engine.acl().len(), 3);
    assert_eq!(engine.acl().rules_for("editor").len(), 2);

    let editor = Principal::authenticated(["editor"]);
    assert!(engine.is_allowed(&editor, &RequestContext::new("PUT", "/docs/guide/intro.md")));
    assert!(!engine.is_allowed(&editor, &RequestContext::new("DELETE", "/docs/guide/intro.md")));
    assert!(engine.is_allowed(
        &editor,
        &RequestContext::new("POST", "/docs").with_header("content-type", "application/json")
    ));
    assert!(!engine.is_allowed(&editor, &RequestContext::new("POST", "/docs")));

    let anonymous = Principal::Anonymous;
    assert!(engine.is_allowed(&anonymous, &RequestContext::new("GET", "/public/index.html")));
    assert!(engine.is_allowed(&anonymous, &RequestContext::from_uri("GET", "/reports?token=public")?));
    assert!(!engine.is_allowed(&anonymous, &RequestContext::from_uri("GET", "/reports?token=secret")?));

    let admin = Principal::authenticated(["admin"]);
    assert!(engine.is_allowed(&admin, &RequestContext::new("DELETE", "/anything")));
    Ok(())
}

#[test]
fn json_permissions() -> Result<()> {
    let engine = AccessDecisionEngine::from_file(data_file("permissions.json"))?;

    let viewer = Principal::authenticated(["viewer"]);
    assert!(engine.is_allowed(&viewer, &RequestContext::new("GET", "/reports")));
    assert!(!engine.is_allowed(&viewer, &RequestContext::new("GET", "/admin/users")));
    assert!(engine.is_allowed(&Principal::authenticated(["admin"]), &RequestContext::new("GET", "/admin/users")));
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn bad_predicate_aborts_startup() {
    let err = AccessDecisionEngine::from_file(data_file("bad_predicate.yml")).unwrap_err();
    match err {
        ConfigError::InvalidPredicate {
            index,
            role,
            expression,
            source,
        } => {
            assert_eq!(index, 1);
            assert_eq!(role, "viewer");
            assert_eq!(expression, "method(GET) and");
            assert!(matches!(source, CompileError::UnexpectedEnd { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_predicate_in_file() {
    let err = AccessDecisionEngine::from_file(data_file("missing_predicate.json")).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingField {
            index: 0,
            field: "predicate"
        }
    ));
}

#[test]
fn missing_file_and_unknown_extension() {
    assert!(matches!(
        AccessDecisionEngine::from_file(data_file("nope.yml")),
        Err(ConfigError::NotFound(_))
    ));
    assert!(matches!(
        AccessDecisionEngine::from_file(data_file("../scenarios.rs")),
        Err(ConfigError::Format(_))
    ));
}

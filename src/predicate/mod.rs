// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Permission rule predicates
//!
//! A rule is a small boolean expression over the request snapshot:
//!
//! ```text
//! method(GET, HEAD) and path-prefix('/api/') and not header(X-Readonly)
//! path-glob[path='/docs/**/*.md'] || query(name=token, value=public)
//! ```
//!
//! - **Logical operators**: `and`/`&&`, `or`/`||`, `not`/`!`, parentheses
//! - **Literals**: `true`, `false`
//! - **Matchers**: `method`, `path`, `path-prefix`, `path-suffix`, `path-glob`,
//!   `path-regex` (alias `regex`), `header`, `query`, `attribute`
//!
//! Matcher arguments are barewords or quoted strings and may be named
//! (`name=`, `value=`, and `path=` for the path family). Arguments may be
//! enclosed in `(...)` or `[...]`. `header`, `query` and `attribute` take the
//! name first. Globs follow `globset` syntax with `/` as a literal separator.
//!
//! Compilation validates everything up front; a compiled [`Predicate`] is
//! immutable, never fails, and never performs I/O when evaluated.

pub mod ast;
pub mod compiler;
pub mod parser;

pub use ast::*;
pub use compiler::RuleCompiler;
pub use parser::{RuleParser, MAX_NESTING};

use std::fmt;
use std::sync::Arc;

use crate::errors::CompileError;
use crate::request::RequestContext;

use compiler::Node;

/// A compiled permission rule.
///
/// Cloning is cheap; clones share the compiled matcher tree.
#[derive(Clone)]
pub struct Predicate {
    expression: Arc<str>,
    root: Arc<Node>,
}

impl Predicate {
    /// Compile a rule expression.
    pub fn compile(expression: &str) -> Result<Self, CompileError> {
        let ast = RuleParser::parse(expression)?;
        let root = RuleCompiler::compile(&ast)?;
        Ok(Self {
            expression: expression.into(),
            root: Arc::new(root),
        })
    }

    /// The source text this predicate was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn matches(&self, request: &RequestContext) -> bool {
        self.root.evaluate(request)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expression).finish()
    }
}

/// Compile a rule expression into a [`Predicate`].
pub fn compile(expression: &str) -> Result<Predicate, CompileError> {
    Predicate::compile(expression)
}

/// Parse a rule expression without compiling it.
pub fn parse(expression: &str) -> Result<RuleExpr, CompileError> {
    RuleParser::parse(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_predicate_matches_request() {
        let predicate =
            compile("method(GET) and path-prefix('/api/') and not header(X-Readonly)")
                .expect("compile");
        assert_eq!(
            predicate.expression(),
            "method(GET) and path-prefix('/api/') and not header(X-Readonly)"
        );

        let request = RequestContext::new("GET", "/api/users");
        assert!(predicate.matches(&request));
        assert!(!predicate.matches(&request.clone().with_header("x-readonly", "1")));
        assert!(!predicate.matches(&RequestContext::new("POST", "/api/users")));
    }

    #[test]
    fn identical_sources_behave_identically() {
        let a = compile("path-glob(/a/*) or query(debug)").expect("compile");
        let b = compile("path-glob(/a/*) or query(debug)").expect("compile");
        for request in [
            RequestContext::new("GET", "/a/b"),
            RequestContext::new("GET", "/a/b/c"),
            RequestContext::new("GET", "/z").with_query("debug", ""),
        ] {
            assert_eq!(a.matches(&request), b.matches(&request));
        }
    }

    #[test]
    fn absent_request_data_does_not_match() {
        let predicate = compile("header(Authorization, 'Bearer x') or query(id, 7)").expect("compile");
        assert!(!predicate.matches(&RequestContext::default()));
    }

    #[test]
    fn ast_serializes() {
        let ast = parse("not method(DELETE)").expect("parse");
        let json = serde_json::to_value(&ast).expect("serialize");
        assert_eq!(json["type"], "NotExpression");
        assert_eq!(json["operand"]["name"], "method");
    }

    #[test]
    fn predicates_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predicate>();
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rule expression compiler
//!
//! Lowers a parsed [`RuleExpr`] into a tree of [`Node`]s whose leaves are
//! pre-validated matchers. Patterns are compiled once here so that evaluation
//! never fails and never backtracks.

use crate::errors::CompileError;
use crate::predicate::ast::*;
use crate::request::RequestContext;

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;

#[derive(Debug)]
pub(crate) enum Node {
    Const(bool),
    All(Vec<Node>),
    Any(Vec<Node>),
    Not(Box<Node>),
    Match(Matcher),
}

#[derive(Debug)]
pub(crate) enum Matcher {
    Method(Vec<String>),
    Path(Vec<String>),
    /// Prefixes with trailing slashes removed.
    PathPrefix(Vec<String>),
    PathSuffix(Vec<String>),
    /// `*`, `?` and classes stay within one segment; `**` spans segments.
    PathGlob(Vec<GlobMatcher>),
    PathRegex(Vec<Regex>),
    Header { name: String, values: Vec<String> },
    Query { name: String, values: Vec<String> },
    Attribute { name: String, values: Vec<String> },
}

impl Node {
    pub(crate) fn evaluate(&self, request: &RequestContext) -> bool {
        match self {
            Node::Const(value) => *value,
            Node::All(nodes) => nodes.iter().all(|n| n.evaluate(request)),
            Node::Any(nodes) => nodes.iter().any(|n| n.evaluate(request)),
            Node::Not(node) => !node.evaluate(request),
            Node::Match(matcher) => matcher.matches(request),
        }
    }
}

impl Matcher {
    fn matches(&self, request: &RequestContext) -> bool {
        let path = request.path();
        match self {
            Matcher::Method(methods) => methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(request.method())),
            Matcher::Path(paths) => paths.iter().any(|p| p == path),
            Matcher::PathPrefix(prefixes) => prefixes.iter().any(|p| prefix_covers(p, path)),
            Matcher::PathSuffix(suffixes) => suffixes.iter().any(|s| path.ends_with(s.as_str())),
            Matcher::PathGlob(globs) => globs.iter().any(|g| g.is_match(path)),
            Matcher::PathRegex(patterns) => patterns.iter().any(|r| r.is_match(path)),
            Matcher::Header { name, values } => {
                matches_values(request.header_values(name).unwrap_or_default(), values)
            }
            Matcher::Query { name, values } => {
                matches_values(request.query_values(name).unwrap_or_default(), values)
            }
            Matcher::Attribute { name, values } => match request.attribute(name) {
                Some(actual) => values.is_empty() || values.iter().any(|v| v == actual),
                None => false,
            },
        }
    }
}

/// An empty expected list means "present with any value".
fn matches_values(actual: &[String], expected: &[String]) -> bool {
    if actual.is_empty() {
        return false;
    }
    expected.is_empty() || actual.iter().any(|a| expected.contains(a))
}

fn prefix_covers(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path == prefix || (path.starts_with(prefix) && path[prefix.len()..].starts_with('/'))
}

/// Rule expression compiler
pub struct RuleCompiler;

impl RuleCompiler {
    pub(crate) fn compile(expr: &RuleExpr) -> Result<Node, CompileError> {
        match expr {
            RuleExpr::BooleanLiteral(literal) => Ok(Node::Const(literal.value)),
            RuleExpr::Not(not) => Ok(Node::Not(Box::new(Self::compile(&not.operand)?))),
            RuleExpr::Logical(logical) => {
                let nodes = logical
                    .operands
                    .iter()
                    .map(Self::compile)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match logical.operator {
                    LogicalOperator::And => Node::All(nodes),
                    LogicalOperator::Or => Node::Any(nodes),
                })
            }
            RuleExpr::Matcher(call) => Ok(Node::Match(Self::compile_matcher(call)?)),
        }
    }

    fn compile_matcher(call: &MatcherCall) -> Result<Matcher, CompileError> {
        let matcher = match call.name.as_str() {
            "method" => Matcher::Method(values_only(call, &[])?),
            "path" => Matcher::Path(values_only(call, &["path"])?),
            "path-prefix" => Matcher::PathPrefix(
                values_only(call, &["path"])?
                    .into_iter()
                    .map(|p| p.trim_end_matches('/').to_string())
                    .collect(),
            ),
            "path-suffix" => Matcher::PathSuffix(values_only(call, &["path"])?),
            "path-glob" => Matcher::PathGlob(
                values_only(call, &["path"])?
                    .iter()
                    .map(|g| build_glob(g))
                    .collect::<Result<_, _>>()?,
            ),
            "path-regex" | "regex" => Matcher::PathRegex(
                values_only(call, &["pattern"])?
                    .iter()
                    .map(|r| build_regex(r))
                    .collect::<Result<_, _>>()?,
            ),
            "header" => {
                let (name, values) = keyed(call)?;
                Matcher::Header {
                    name: name.to_ascii_lowercase(),
                    values,
                }
            }
            "query" => {
                let (name, values) = keyed(call)?;
                Matcher::Query { name, values }
            }
            "attribute" => {
                let (name, values) = keyed(call)?;
                Matcher::Attribute { name, values }
            }
            other => return Err(CompileError::UnknownMatcher(other.to_string())),
        };

        Ok(matcher)
    }
}

fn invalid(call: &MatcherCall, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidArguments {
        matcher: call.name.clone(),
        reason: reason.into(),
    }
}

fn build_regex(pattern: &str) -> Result<Regex, CompileError> {
    Regex::new(pattern).map_err(|e| CompileError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn build_glob(pattern: &str) -> Result<GlobMatcher, CompileError> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| CompileError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })?;
    Ok(glob.compile_matcher())
}

/// Collect one or more values, accepting `value=` and the given aliases.
fn values_only(call: &MatcherCall, aliases: &[&str]) -> Result<Vec<String>, CompileError> {
    let mut values = Vec::with_capacity(call.arguments.len());
    for arg in &call.arguments {
        match arg.name.as_deref() {
            None => {}
            Some(name) if name == "value" || aliases.contains(&name) => {}
            Some(name) => return Err(invalid(call, format!("unknown argument '{name}'"))),
        }
        if arg.value.is_empty() {
            return Err(invalid(call, "values must not be empty"));
        }
        values.push(arg.value.clone());
    }

    if values.is_empty() {
        return Err(invalid(call, "expected at least one value"));
    }
    Ok(values)
}

/// Collect a required key followed by optional values.
///
/// The key is always the first argument, given positionally or as `name=`.
fn keyed(call: &MatcherCall) -> Result<(String, Vec<String>), CompileError> {
    let mut arguments = call.arguments.iter();
    let key = match arguments.next() {
        Some(arg) if matches!(arg.name.as_deref(), None | Some("name")) => arg.value.clone(),
        _ => return Err(invalid(call, "expected a name as the first argument")),
    };
    if key.is_empty() {
        return Err(invalid(call, "expected a name"));
    }

    let mut values = Vec::new();
    for arg in arguments {
        match arg.name.as_deref() {
            Some("value") | None => values.push(arg.value.clone()),
            Some("name") => return Err(invalid(call, "'name' given more than once")),
            Some(name) => return Err(invalid(call, format!("unknown argument '{name}'"))),
        }
    }
    Ok((key, values))
}

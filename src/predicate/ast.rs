// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rule expression AST definitions
//!
//! The parser produces these nodes; the compiler turns them into matchers.

use serde::{Deserialize, Serialize};

/// Rule expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleExpr {
    #[serde(rename = "LogicalExpression")]
    Logical(LogicalExpression),
    #[serde(rename = "NotExpression")]
    Not(NotExpression),
    #[serde(rename = "MatcherCall")]
    Matcher(MatcherCall),
    #[serde(rename = "BooleanLiteral")]
    BooleanLiteral(BooleanLiteral),
}

/// Logical (AND/OR) expression over two or more operands.
///
/// Chains such as `a and b and c` are kept flat rather than nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub operands: Vec<RuleExpr>,
}

/// Logical operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    And,
    Or,
}

/// Negation of an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotExpression {
    pub operand: Box<RuleExpr>,
}

/// Matcher invocation, e.g. `path-prefix('/api/')` or `header[name=X, value=y]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherCall {
    pub name: String,
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
}

/// A positional or named matcher argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: String,
}

/// Boolean literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanLiteral {
    pub value: bool,
}

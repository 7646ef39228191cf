// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling a rule expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("empty rule expression")]
    Empty,

    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("unknown matcher '{0}'")]
    UnknownMatcher(String),

    #[error("invalid arguments for '{matcher}': {reason}")]
    InvalidArguments { matcher: String, reason: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised while building an access control list from configuration.
///
/// Every variant is fatal: no engine is produced when loading fails.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wrong configuration file format: {0}")]
    Format(String),

    #[error("permission entry #{index} is missing the {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("permission entry #{index} has a non-string {field}")]
    InvalidFieldType { index: usize, field: &'static str },

    #[error("permission entry #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("permission entry #{index} for role '{role}' has a wrong predicate '{expression}': {source}")]
    InvalidPredicate {
        index: usize,
        role: String,
        expression: String,
        #[source]
        source: CompileError,
    },
}

/// Errors raised while turning a request target into a [`RequestContext`].
///
/// [`RequestContext`]: crate::RequestContext
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request target '{0}' is not an absolute path")]
    NotOriginForm(String),

    #[error("request target '{0}' does not decode to UTF-8")]
    InvalidEncoding(String),
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rule expression parser
//!
//! Parses the textual rule language into [`RuleExpr`] trees. Precedence from
//! lowest to highest is `or`, `and`, `not`, then matchers and parentheses.

use crate::errors::CompileError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::predicate::ast::*;

/// Maximum nesting of parentheses and negations.
pub const MAX_NESTING: usize = 64;

/// Rule expression parser
pub struct RuleParser<'source> {
    lexer: Lexer<'source>,
    current: Token,
    depth: usize,
}

impl<'source> RuleParser<'source> {
    /// Parse a complete rule expression.
    pub fn parse(source: &'source str) -> Result<RuleExpr, CompileError> {
        if source.trim().is_empty() {
            return Err(CompileError::Empty);
        }

        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let mut parser = Self {
            lexer,
            current,
            depth: 0,
        };

        let expr = parser.parse_or_expression()?;
        if parser.current.0 != TokenKind::Eof {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    fn current_text(&self) -> &str {
        self.current.1.text()
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn is_symbol(&self, symbol: &str) -> bool {
        self.current.0 == TokenKind::Symbol && self.current_text() == symbol
    }

    fn is_word(&self, words: &[&str]) -> bool {
        self.current.0 == TokenKind::Word && words.contains(&self.current_text())
    }

    fn unexpected(&self) -> CompileError {
        CompileError::UnexpectedToken {
            found: self.current_text().to_string(),
            offset: self.current.1.offset,
        }
    }

    fn error_at_current(&self, expected: &str) -> CompileError {
        if self.current.0 == TokenKind::Eof {
            CompileError::UnexpectedEnd {
                expected: expected.to_string(),
            }
        } else {
            self.unexpected()
        }
    }

    fn expect_symbol(&mut self, expected: &str) -> Result<(), CompileError> {
        if !self.is_symbol(expected) {
            return Err(self.error_at_current(&format!("'{expected}'")));
        }
        self.advance()
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(CompileError::TooDeep { limit: MAX_NESTING });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse OR expression (lowest precedence)
    fn parse_or_expression(&mut self) -> Result<RuleExpr, CompileError> {
        let first = self.parse_and_expression()?;
        let mut operands = vec![first];

        while self.is_symbol("||") || self.is_word(&["or", "OR"]) {
            self.advance()?;
            operands.push(self.parse_and_expression()?);
        }

        Ok(Self::logical(LogicalOperator::Or, operands))
    }

    /// Parse AND expression (higher precedence than OR)
    fn parse_and_expression(&mut self) -> Result<RuleExpr, CompileError> {
        let first = self.parse_unary_expression()?;
        let mut operands = vec![first];

        while self.is_symbol("&&") || self.is_word(&["and", "AND"]) {
            self.advance()?;
            operands.push(self.parse_unary_expression()?);
        }

        Ok(Self::logical(LogicalOperator::And, operands))
    }

    fn logical(operator: LogicalOperator, mut operands: Vec<RuleExpr>) -> RuleExpr {
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            RuleExpr::Logical(LogicalExpression { operator, operands })
        }
    }

    /// Parse unary expression (NOT)
    fn parse_unary_expression(&mut self) -> Result<RuleExpr, CompileError> {
        if self.is_symbol("!") || self.is_word(&["not", "NOT"]) {
            self.advance()?;
            self.enter()?;
            let operand = self.parse_unary_expression()?;
            self.leave();
            return Ok(RuleExpr::Not(NotExpression {
                operand: Box::new(operand),
            }));
        }

        self.parse_primary_expression()
    }

    /// Parse primary expression (parentheses, literals, matchers)
    fn parse_primary_expression(&mut self) -> Result<RuleExpr, CompileError> {
        match self.current.0 {
            TokenKind::Symbol if self.current_text() == "(" => {
                self.advance()?;
                self.enter()?;
                let expr = self.parse_or_expression()?;
                self.leave();
                self.expect_symbol(")")?;
                Ok(expr)
            }

            TokenKind::Word => match self.current_text() {
                "true" | "false" => {
                    let value = self.current_text() == "true";
                    self.advance()?;
                    Ok(RuleExpr::BooleanLiteral(BooleanLiteral { value }))
                }
                "and" | "AND" | "or" | "OR" => Err(self.unexpected()),
                _ => self.parse_matcher(),
            },

            _ => Err(self.error_at_current("a matcher")),
        }
    }

    /// Parse `name(args)` or `name[args]`
    fn parse_matcher(&mut self) -> Result<RuleExpr, CompileError> {
        let name = self.current_text().to_string();
        let offset = self.current.1.offset;
        self.advance()?;

        let close = if self.is_symbol("(") {
            ")"
        } else if self.is_symbol("[") {
            "]"
        } else {
            return Err(self.error_at_current(&format!("'(' after '{name}'")));
        };
        self.advance()?;

        let mut arguments = Vec::new();
        if !self.is_symbol(close) {
            loop {
                arguments.push(self.parse_argument()?);

                if self.is_symbol(",") {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        self.expect_symbol(close)?;

        Ok(RuleExpr::Matcher(MatcherCall {
            name,
            offset,
            arguments,
        }))
    }

    /// Parse `value` or `name=value`
    fn parse_argument(&mut self) -> Result<Argument, CompileError> {
        let first = self.parse_value()?;

        if self.is_symbol("=") {
            let (kind, name) = first;
            if kind != TokenKind::Word {
                return Err(self.unexpected());
            }
            self.advance()?;
            let (_, value) = self.parse_value()?;
            return Ok(Argument {
                name: Some(name),
                value,
            });
        }

        Ok(Argument {
            name: None,
            value: first.1,
        })
    }

    fn parse_value(&mut self) -> Result<(TokenKind, String), CompileError> {
        match self.current.0 {
            TokenKind::Word | TokenKind::String => {
                let value = (self.current.0, self.current_text().to_string());
                self.advance()?;
                Ok(value)
            }
            _ => Err(self.error_at_current("an argument value")),
        }
    }
}

//! Expression parsing for Krypton.

use super::Parser;
use crate::ast::{BinaryOp, Expr, Literal, LiteralKind, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance(); // consume operator

            let right = self.parse_binary_expr(prec + 1)?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.parse_primary_expr(),
        };
        self.advance();
        let operand = self.parse_unary_expr()?;
        Ok(Expr::unary(op, operand))
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(text) => {
                self.advance();
                Ok(literal(LiteralKind::Int, text))
            }
            Token::FloatLiteral(text) => {
                self.advance();
                Ok(literal(LiteralKind::Float, text))
            }
            Token::StringLiteral(text) => {
                self.advance();
                Ok(literal(LiteralKind::String, text))
            }
            Token::True => {
                self.advance();
                Ok(Expr::bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::bool(false))
            }
            Token::Prepare => {
                self.advance();
                let line = self.line();
                let kind = self.parse_identifier()?;
                if kind != "qbit" {
                    return Err(ParseError::UnexpectedToken {
                        line,
                        expected: "'qbit' after 'prepare'".into(),
                        found: kind,
                    });
                }
                Ok(Expr::Prepare)
            }
            Token::Measure => {
                self.advance();
                Ok(Expr::Measure(self.parse_identifier()?))
            }
            Token::Identifier(name) => {
                self.advance();
                // Check for function call
                if self.consume(&Token::LParen) {
                    let args = self.parse_expression_list()?;
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinaryOp> {
        match self.peek()? {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            Token::And => Some(BinaryOp::And),
            Token::Or => Some(BinaryOp::Or),
            _ => None,
        }
    }

    /// Parse a comma-separated argument list (without parentheses).
    fn parse_expression_list(&mut self) -> ParseResult<Vec<Expr>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}

fn literal(kind: LiteralKind, text: String) -> Expr {
    Expr::Literal(Literal { kind, text })
}

/// Get operator precedence.
fn op_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Eq | BinaryOp::NotEq => 3,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 4,
        BinaryOp::Add | BinaryOp::Sub => 5,
        BinaryOp::Mul | BinaryOp::Div => 6,
    }
}

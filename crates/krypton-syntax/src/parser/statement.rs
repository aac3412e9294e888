//! Statement parsing for Krypton.

use super::Parser;
use crate::ast::Statement;
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        match token {
            Token::Let => self.parse_let(),
            Token::Return => self.parse_return(),
            Token::If => self.parse_if(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(Token::Semicolon)?;
                Ok(Statement::Expr(expr))
            }
        }
    }

    /// Parse `let name = value;`.
    fn parse_let(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Let)?;
        let name = self.parse_identifier()?;
        self.expect(Token::Eq)?;
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Let { name, value })
    }

    /// Parse `return value;`.
    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Return)?;
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Return(value))
    }

    /// Parse `if (cond) { ... } else { ... }`.
    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;

        let then_block = self.parse_block()?;
        let else_block = if self.consume(&Token::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_block,
            else_block,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Statement};
    use crate::parse;

    fn main_statements(source: &str) -> Vec<Statement> {
        let module = parse(source).unwrap();
        module.process("main").unwrap().body.statements.clone()
    }

    #[test]
    fn test_if_without_else() {
        let stmts = main_statements("process main { if (false) { kp(1); } kp(2); }");
        assert_eq!(stmts.len(), 2);
        match &stmts[0] {
            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                assert_eq!(*condition, Expr::bool(false));
                assert_eq!(then_block.statements.len(), 1);
                assert!(else_block.is_none());
            }
            other => panic!("Expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_if_with_else() {
        let stmts = main_statements("process main { if (true) { kp(1); } else { kp(2); kp(3); } }");
        match &stmts[0] {
            Statement::If { else_block, .. } => {
                assert_eq!(else_block.as_ref().unwrap().statements.len(), 2);
            }
            other => panic!("Expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_prepare_and_measure() {
        let stmts = main_statements("process main { let q = prepare qbit; measure q; }");
        assert!(matches!(&stmts[0], Statement::Let { value: Expr::Prepare, .. }));
        assert!(matches!(&stmts[1], Statement::Expr(Expr::Measure(n)) if n == "q"));
    }
}

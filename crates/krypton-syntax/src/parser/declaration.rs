//! Declaration parsing for Krypton.

use super::Parser;
use crate::ast::{
    Block, Declaration, FunctionDecl, ImportDecl, Param, ProcessDecl, QuantumProcedureDecl, Type,
};
use crate::error::ParseResult;
use crate::lexer::Token;

impl Parser {
    /// Parse a top-level declaration.
    pub(super) fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        match self.peek() {
            Some(Token::Import) => self.parse_import(),
            Some(Token::Fn) => self.parse_function(),
            Some(Token::Quantum | Token::Qpute) => self.parse_quantum_procedure(),
            Some(Token::Process) => self.parse_process(),
            _ => Err(self.unexpected("declaration")),
        }
    }

    /// Parse `import a.b.c;`.
    fn parse_import(&mut self) -> ParseResult<Declaration> {
        self.expect(Token::Import)?;
        let mut path = vec![self.parse_identifier()?];
        while self.consume(&Token::Dot) {
            path.push(self.parse_identifier()?);
        }
        self.expect(Token::Semicolon)?;
        Ok(Declaration::Import(ImportDecl { path }))
    }

    /// Parse `fn name(params) -> type { ... }`.
    fn parse_function(&mut self) -> ParseResult<Declaration> {
        self.expect(Token::Fn)?;
        let name = self.parse_identifier()?;
        let params = self.parse_params()?;
        self.expect(Token::Arrow)?;
        let return_type = self.parse_type()?;
        let body = self.parse_block()?;

        Ok(Declaration::Function(FunctionDecl {
            name,
            params,
            return_type,
            body,
        }))
    }

    /// Parse `quantum qpute name(params) { ... }`; the `quantum` prefix is optional.
    fn parse_quantum_procedure(&mut self) -> ParseResult<Declaration> {
        self.consume(&Token::Quantum);
        self.expect(Token::Qpute)?;
        let name = self.parse_identifier()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;

        Ok(Declaration::QuantumProcedure(QuantumProcedureDecl {
            name,
            params,
            body,
        }))
    }

    /// Parse `process name { ... }`.
    fn parse_process(&mut self) -> ParseResult<Declaration> {
        self.expect(Token::Process)?;
        let name = self.parse_identifier()?;
        let body = self.parse_block()?;
        Ok(Declaration::Process(ProcessDecl { name, body }))
    }

    /// Parse a parenthesized parameter list.
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();

        if !self.check(&Token::RParen) {
            loop {
                let name = self.parse_identifier()?;
                self.expect(Token::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param { name, ty });

                if !self.consume(&Token::Comma) {
                    break;
                }
            }
        }

        self.expect(Token::RParen)?;
        Ok(params)
    }

    /// Parse a type name.
    fn parse_type(&mut self) -> ParseResult<Type> {
        match self.peek() {
            Some(Token::Identifier(_)) => Ok(Type::from_name(&self.parse_identifier()?)),
            _ => Err(self.unexpected("type")),
        }
    }

    /// Parse a braced block.
    pub(super) fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(Token::LBrace)?;

        let mut statements = Vec::new();
        while !self.is_eof() && !self.check(&Token::RBrace) {
            statements.push(self.parse_statement()?);
        }

        self.expect(Token::RBrace)?;
        Ok(Block { statements })
    }
}

//! Recursive descent parser for P

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, Token, TokenKind};
use crate::types::{PType, PrimitiveType};

/// Recursive descent parser for P
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    ids: NodeIdGen,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            ids: NodeIdGen::new(),
        })
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> CompileResult<Program> {
        let id = self.ids.next_id();
        let mut name = String::from("main");

        if self.match_token(&TokenKind::Program)? {
            name = self.expect_identifier()?.0;
            self.expect(TokenKind::Semi)?;
        }

        let mut items = Vec::new();
        while !self.at_end() {
            let item = match self.current.kind {
                TokenKind::Var => Item::Decl(self.parse_declaration()?),
                TokenKind::Function => Item::Function(self.parse_function()?),
                _ => Item::Stmt(self.parse_statement()?),
            };
            items.push(item);
        }

        let span = Span::new(0, self.lexer.source().len());
        Ok(Program::new(id, name, items, span))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.span)),
            other => Err(CompileError::parser(
                format!("expected identifier, found {}", other),
                token.span,
            )),
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::parser(
            format!("expected {}, found {}", expected, self.current.kind),
            self.current.span,
        )
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_declaration(&mut self) -> CompileResult<Decl> {
        let start = self.expect(TokenKind::Var)?.span;

        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&TokenKind::Comma)? {
            names.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::Colon)?;

        let constant = if self.current.kind.is_scalar_type() || self.check(&TokenKind::Array) {
            None
        } else {
            Some(self.parse_literal()?)
        };
        let ty = match &constant {
            Some(value) => value.ty(),
            None => self.parse_type()?,
        };
        let end = self.expect(TokenKind::Semi)?.span;

        let vars = names
            .into_iter()
            .map(|(name, span)| {
                let var = VarDecl::new(self.ids.next_id(), name, ty.clone(), span);
                match &constant {
                    Some(value) => var.with_constant(value.clone()),
                    None => var,
                }
            })
            .collect();

        Ok(Decl::new(self.ids.next_id(), vars, start.merge(end)))
    }

    fn parse_literal(&mut self) -> CompileResult<Literal> {
        let negate = self.match_token(&TokenKind::Minus)?;
        let token = self.advance()?;
        let literal = match token.kind {
            TokenKind::IntLiteral(value) if negate => Literal::Integer(-value),
            TokenKind::IntLiteral(value) => Literal::Integer(value),
            TokenKind::RealLiteral(value) if negate => Literal::Real(-value),
            TokenKind::RealLiteral(value) => Literal::Real(value),
            TokenKind::StringLiteral(value) if !negate => Literal::Str(value),
            TokenKind::True if !negate => Literal::Boolean(true),
            TokenKind::False if !negate => Literal::Boolean(false),
            other => {
                return Err(CompileError::parser(
                    format!("expected type or constant literal, found {}", other),
                    token.span,
                ));
            }
        };
        Ok(literal)
    }

    fn parse_scalar_type(&mut self) -> CompileResult<PrimitiveType> {
        let primitive = match self.current.kind {
            TokenKind::Integer => PrimitiveType::Integer,
            TokenKind::Real => PrimitiveType::Real,
            TokenKind::Boolean => PrimitiveType::Boolean,
            TokenKind::String => PrimitiveType::String,
            _ => return Err(self.unexpected("type")),
        };
        self.advance()?;
        Ok(primitive)
    }

    fn parse_type(&mut self) -> CompileResult<PType> {
        if !self.match_token(&TokenKind::Array)? {
            return Ok(PType::scalar(self.parse_scalar_type()?));
        }

        let mut dims = Vec::new();
        if self.check(&TokenKind::LBracket) {
            while self.match_token(&TokenKind::LBracket)? {
                dims.push(self.parse_dimension()?);
                self.expect(TokenKind::RBracket)?;
            }
        } else {
            dims.push(self.parse_dimension()?);
        }
        self.expect(TokenKind::Of)?;

        let element = self.parse_type()?;
        dims.extend_from_slice(element.dimensions());
        Ok(PType::array(element.primitive(), dims))
    }

    /// Array bound, sign kept so that the analyzer can reject it
    fn parse_dimension(&mut self) -> CompileResult<i64> {
        let negate = self.match_token(&TokenKind::Minus)?;
        let token = self.advance()?;
        match token.kind {
            TokenKind::IntLiteral(value) => Ok(if negate { -value } else { value }),
            other => Err(CompileError::parser(
                format!("expected array bound, found {}", other),
                token.span,
            )),
        }
    }

    fn parse_function(&mut self) -> CompileResult<FunctionDecl> {
        let start = self.expect(TokenKind::Function)?.span;
        let (name, name_span) = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let mut group = vec![self.expect_identifier()?];
                while self.match_token(&TokenKind::Comma)? {
                    group.push(self.expect_identifier()?);
                }
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                for (param_name, span) in group {
                    params.push(Param {
                        id: self.ids.next_id(),
                        name: param_name,
                        ty: ty.clone(),
                        span,
                    });
                }
                if !self.match_token(&TokenKind::Semi)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let return_type = if self.match_token(&TokenKind::Colon)? {
            PType::scalar(self.parse_scalar_type()?)
        } else {
            PType::void()
        };

        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(FunctionDecl {
            id: self.ids.next_id(),
            name,
            name_span,
            params,
            return_type,
            body,
            span,
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> CompileResult<Block> {
        let start = self.expect(TokenKind::Begin)?.span;

        let mut decls = Vec::new();
        while self.check(&TokenKind::Var) {
            decls.push(self.parse_declaration()?);
        }

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::End) {
            if self.at_end() {
                return Err(self.unexpected("'end'"));
            }
            stmts.push(self.parse_statement()?);
        }
        let end = self.expect(TokenKind::End)?.span;
        self.match_token(&TokenKind::Semi)?;

        Ok(Block::new(self.ids.next_id(), decls, stmts, start.merge(end)))
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        match self.current.kind {
            TokenKind::Begin => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt::new(self.ids.next_id(), StmtKind::Block(block), span))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Print => {
                let span = self.advance()?.span;
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::new(self.ids.next_id(), StmtKind::Print(value), span))
            }
            TokenKind::Read => {
                let span = self.advance()?.span;
                let (name, name_span) = self.expect_identifier()?;
                let target = self.parse_variable_reference(name, name_span)?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::new(self.ids.next_id(), StmtKind::Read(target), span))
            }
            TokenKind::Return => {
                let span = self.advance()?.span;
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::new(self.ids.next_id(), StmtKind::Return(value), span))
            }
            TokenKind::Identifier(_) => self.parse_simple_statement(),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Assignment or procedure call, both start with an identifier
    fn parse_simple_statement(&mut self) -> CompileResult<Stmt> {
        let (name, name_span) = self.expect_identifier()?;

        if self.check(&TokenKind::LParen) {
            let call = self.parse_call(name, name_span)?;
            self.expect(TokenKind::Semi)?;
            return Ok(Stmt::new(self.ids.next_id(), StmtKind::Call(call), name_span));
        }

        let target = self.parse_variable_reference(name, name_span)?;
        let span = self.expect(TokenKind::Assign)?.span;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::new(
            self.ids.next_id(),
            StmtKind::Assign { target, value },
            span,
        ))
    }

    fn parse_if_statement(&mut self) -> CompileResult<Stmt> {
        let span = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(&TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::new(
            self.ids.next_id(),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while_statement(&mut self) -> CompileResult<Stmt> {
        let span = self.expect(TokenKind::While)?.span;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::new(
            self.ids.next_id(),
            StmtKind::While { condition, body },
            span,
        ))
    }

    fn parse_for_statement(&mut self) -> CompileResult<Stmt> {
        let span = self.expect(TokenKind::For)?.span;
        let (name, var_span) = self.expect_identifier()?;
        let var = LoopVar {
            id: self.ids.next_id(),
            name,
            span: var_span,
        };
        self.expect(TokenKind::Assign)?;
        let lower = self.parse_expression()?;
        self.expect(TokenKind::To)?;
        let upper = self.parse_expression()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::new(
            self.ids.next_id(),
            StmtKind::For {
                var,
                lower,
                upper,
                body,
            },
            span,
        ))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_or_expression()
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr, span: Span) -> Expr {
        Expr::new(
            self.ids.next_id(),
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    fn parse_or_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_and_expression()?;
        while self.check(&TokenKind::Or) {
            let span = self.advance()?.span;
            let right = self.parse_and_expression()?;
            left = self.binary(BinaryOp::Or, left, right, span);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_not_expression()?;
        while self.check(&TokenKind::And) {
            let span = self.advance()?.span;
            let right = self.parse_not_expression()?;
            left = self.binary(BinaryOp::And, left, right, span);
        }
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> CompileResult<Expr> {
        if self.check(&TokenKind::Not) {
            let span = self.advance()?.span;
            let operand = self.parse_not_expression()?;
            return Ok(Expr::new(
                self.ids.next_id(),
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_relational_expression()
    }

    fn parse_relational_expression(&mut self) -> CompileResult<Expr> {
        let left = self.parse_additive_expression()?;
        let op = match self.current.kind {
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            _ => return Ok(left),
        };
        let span = self.advance()?.span;
        let right = self.parse_additive_expression()?;
        Ok(self.binary(op, left, right, span))
    }

    fn parse_additive_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_multiplicative_expression()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let span = self.advance()?.span;
            let right = self.parse_multiplicative_expression()?;
            left = self.binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expression()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Mod | TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let span = self.advance()?.span;
            let right = self.parse_unary_expression()?;
            left = self.binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expr> {
        if self.check(&TokenKind::Minus) {
            let span = self.advance()?.span;
            let operand = self.parse_unary_expression()?;
            return Ok(Expr::new(
                self.ids.next_id(),
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> CompileResult<Expr> {
        let span = self.current.span;
        let literal = match self.current.kind {
            TokenKind::IntLiteral(value) => Literal::Integer(value),
            TokenKind::RealLiteral(value) => Literal::Real(value),
            TokenKind::True => Literal::Boolean(true),
            TokenKind::False => Literal::Boolean(false),
            TokenKind::StringLiteral(ref value) => Literal::Str(value.clone()),
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                return Ok(expr);
            }
            TokenKind::Identifier(_) => {
                let (name, name_span) = self.expect_identifier()?;
                if self.check(&TokenKind::LParen) {
                    return self.parse_call(name, name_span);
                }
                return self.parse_variable_reference(name, name_span);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance()?;
        Ok(Expr::new(self.ids.next_id(), ExprKind::Literal(literal), span))
    }

    fn parse_variable_reference(&mut self, name: String, span: Span) -> CompileResult<Expr> {
        let mut indices = Vec::new();
        while self.match_token(&TokenKind::LBracket)? {
            indices.push(self.parse_expression()?);
            self.expect(TokenKind::RBracket)?;
        }
        Ok(Expr::new(
            self.ids.next_id(),
            ExprKind::VarRef { name, indices },
            span,
        ))
    }

    fn parse_call(&mut self, name: String, span: Span) -> CompileResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.match_token(&TokenKind::Comma)? {
                args.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::new(self.ids.next_id(), ExprKind::Call { name, args }, span))
    }
}

//! Statement AST nodes

use super::{Decl, Expr, NodeId};
use crate::common::Span;

/// `begin decl* stmt* end`
#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(id: NodeId, decls: Vec<Decl>, stmts: Vec<Stmt>, span: Span) -> Self {
        Self {
            id,
            decls,
            stmts,
            span,
        }
    }
}

/// Statement node
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}

/// Induction variable of a `for` loop
#[derive(Debug, Clone)]
pub struct LoopVar {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Compound statement, opens a scope
    Block(Block),

    /// `ref := expr;`, target is always a `VarRef`
    Assign { target: Expr, value: Expr },

    Print(Expr),

    /// `read ref;`
    Read(Expr),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While { condition: Expr, body: Box<Stmt> },

    /// `for i := lower to upper do body`, upper bound exclusive
    For {
        var: LoopVar,
        lower: Expr,
        upper: Expr,
        body: Box<Stmt>,
    },

    Return(Expr),

    /// Call used as a statement, the expression is always a `Call`
    Call(Expr),
}

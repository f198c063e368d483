//! Expression AST nodes

use super::{Literal, NodeId};
use crate::common::Span;
use crate::types::PType;

/// Expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
    /// Resolved type, filled in once during semantic analysis
    pub ty: Option<PType>,
    /// Set when a semantic error was found in this expression
    pub error: bool,
    /// Integer value widened to real by the analyzer
    pub promoted: bool,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Self {
            id,
            kind,
            span,
            ty: None,
            error: false,
            promoted: false,
        }
    }

    pub fn set_type(&mut self, ty: PType) {
        debug_assert!(self.ty.is_none(), "expression type assigned twice");
        self.ty = Some(ty);
    }

    /// Widen an integer expression to real in place
    pub fn promote_to_real(&mut self) {
        self.ty = Some(PType::real());
        self.promoted = true;
    }

    pub fn mark_error(&mut self) {
        self.error = true;
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Type the expression held before any promotion
    pub fn original_type(&self) -> Option<PType> {
        if self.promoted {
            Some(PType::integer())
        } else {
            self.ty.clone()
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),

    /// Variable reference with optional subscripts: `a`, `m[i][j]`
    VarRef { name: String, indices: Vec<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Function invocation: `f(a, b)`
    Call { name: String, args: Vec<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Logical
    And,
    Or,

    // Relational
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
        }
    }

    /// `+ - * /`
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
        }
    }
}

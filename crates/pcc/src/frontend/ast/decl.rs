//! Declaration AST nodes

use super::{Block, NodeId};
use crate::common::Span;
use crate::types::PType;
use std::fmt;

/// `var a, b : integer;` or `var c : 10;`
#[derive(Debug, Clone)]
pub struct Decl {
    pub id: NodeId,
    pub vars: Vec<VarDecl>,
    pub span: Span,
}

impl Decl {
    pub fn new(id: NodeId, vars: Vec<VarDecl>, span: Span) -> Self {
        Self { id, vars, span }
    }
}

/// One declared name
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: PType,
    /// Present for constant declarations
    pub constant: Option<Literal>,
    pub span: Span,
}

impl VarDecl {
    pub fn new(id: NodeId, name: String, ty: PType, span: Span) -> Self {
        Self {
            id,
            name,
            ty,
            constant: None,
            span,
        }
    }

    pub fn with_constant(mut self, value: Literal) -> Self {
        self.constant = Some(value);
        self
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Str(String),
}

impl Literal {
    pub fn ty(&self) -> PType {
        match self {
            Literal::Integer(_) => PType::integer(),
            Literal::Real(_) => PType::real(),
            Literal::Boolean(_) => PType::boolean(),
            Literal::Str(_) => PType::string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{}", value),
            Literal::Real(value) => write!(f, "{:.6}", value),
            Literal::Boolean(value) => write!(f, "{}", value),
            Literal::Str(value) => write!(f, "\"{}\"", value),
        }
    }
}

/// Function definition
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    pub return_type: PType,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    pub fn param_types(&self) -> Vec<PType> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub id: NodeId,
    pub name: String,
    pub ty: PType,
    pub span: Span,
}

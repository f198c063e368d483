//! Abstract Syntax Tree definitions
//!
//! Every node that the analyzer or code generator needs to refer back to
//! carries a [`NodeId`]. Symbol tables store these ids instead of
//! references, so the tree and the tables have independent lifetimes.

mod decl;
mod expr;
mod stmt;

pub use decl::*;
pub use expr::*;
pub use stmt::*;

use crate::common::Span;

/// Unique identity of a node within one parsed program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Hands out fresh node ids in creation order
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// A complete P program
#[derive(Debug, Clone)]
pub struct Program {
    pub id: NodeId,
    pub name: String,
    pub items: Vec<Item>,
    pub span: Span,
}

impl Program {
    pub fn new(id: NodeId, name: String, items: Vec<Item>, span: Span) -> Self {
        Self {
            id,
            name,
            items,
            span,
        }
    }

    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.items.iter().filter_map(|item| match item {
            Item::Decl(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(func) => Some(func),
            _ => None,
        })
    }

    /// Top-level statements, which make up the program body
    pub fn body(&self) -> impl Iterator<Item = &Stmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Stmt(stmt) => Some(stmt),
            _ => None,
        })
    }
}

/// Top-level item, kept in source order
#[derive(Debug, Clone)]
pub enum Item {
    Decl(Decl),
    Function(FunctionDecl),
    Stmt(Stmt),
}

//! Semantic analyzer - scope resolution and type checking
//!
//! The analyzer walks the tree once. Errors are recorded and traversal
//! continues, so every problem in the file is reported in one pass. An
//! expression whose operand already failed is marked erroneous without a
//! second diagnostic.

use super::scope::{
    Attribute, DeclareError, ScopeManager, SymbolEntry, SymbolKind, SymbolTables,
};
use crate::common::Span;
use crate::frontend::ast::*;
use crate::types::PType;
use std::fmt;

/// Category of a semantic error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Redeclaration,
    UndeclaredUse,
    KindMismatch,
    TypeMismatch,
    ArityMismatch,
    InvalidArrayBound,
    OverIndexing,
    ConstantAssignment,
    LoopVarAssignment,
    ArrayAssignment,
    InvalidCondition,
    InvalidLoopBounds,
    InvalidReturn,
    NonScalarIo,
    OversizedStorage,
    OutOfRange,
}

/// A recorded semantic error
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticDiagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl fmt::Display for SemanticDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of analyzing a program
#[derive(Debug)]
pub struct Analysis {
    pub tables: SymbolTables,
    pub diagnostics: Vec<SemanticDiagnostic>,
    /// Symbol tables rendered as each scope was closed, when requested
    pub symbol_dumps: Vec<String>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Evaluate an integer expression known at compile time
///
/// Accepts integer literals, their negation and unindexed references to
/// integer constants.
pub fn constant_int(expr: &Expr, scopes: &ScopeManager) -> Option<i64> {
    match &expr.kind {
        ExprKind::Literal(Literal::Integer(value)) => Some(*value),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => constant_int(operand, scopes).map(|v| -v),
        ExprKind::VarRef { name, indices } if indices.is_empty() => {
            match scopes.get_symbol(name)?.constant()? {
                Literal::Integer(value) => Some(*value),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Semantic analyzer for P programs
pub struct SemanticAnalyzer {
    scopes: ScopeManager,
    tables: SymbolTables,
    diagnostics: Vec<SemanticDiagnostic>,
    dump_symbols: bool,
    dumps: Vec<String>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeManager::new(),
            tables: SymbolTables::new(),
            diagnostics: Vec::new(),
            dump_symbols: false,
            dumps: Vec::new(),
        }
    }

    /// Render every scope's table when it is closed
    pub fn with_symbol_dump(mut self, enabled: bool) -> Self {
        self.dump_symbols = enabled;
        self
    }

    /// Analyze a program, annotating its expressions in place
    pub fn analyze(mut self, program: &mut Program) -> Analysis {
        self.scopes.push_scope(program.id);
        let entry = SymbolEntry::new(&program.name, SymbolKind::Program, PType::void(), program.id);
        self.declare(entry.clone(), program.span);
        self.scopes.push_context(entry);

        for item in &mut program.items {
            match item {
                Item::Decl(decl) => self.visit_decl(decl),
                Item::Function(func) => self.visit_function(func),
                Item::Stmt(stmt) => self.visit_stmt(stmt),
            }
        }

        self.leave_context(program.id);
        self.leave_scope();
        debug_assert_eq!(self.scopes.depth(), 0);

        Analysis {
            tables: self.tables,
            diagnostics: self.diagnostics,
            symbol_dumps: self.dumps,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn error(&mut self, kind: ErrorKind, message: String, span: Span) {
        log::trace!("semantic error at {:?}: {}", span, message);
        self.diagnostics.push(SemanticDiagnostic {
            kind,
            message,
            span,
        });
    }

    fn declare(&mut self, entry: SymbolEntry, span: Span) {
        let name = entry.name.clone();
        match self.scopes.add_symbol(entry) {
            Ok(()) => {}
            Err(DeclareError::Redeclared | DeclareError::ShadowsLoopVariable) => {
                self.error(
                    ErrorKind::Redeclaration,
                    format!("symbol '{}' is redeclared", name),
                    span,
                );
            }
            Err(DeclareError::FrameOverflow) => {
                self.error(
                    ErrorKind::OversizedStorage,
                    format!("'{}' does not fit in the stack frame", name),
                    span,
                );
            }
        }
    }

    /// Pop the innermost scope and archive it for code generation
    fn leave_scope(&mut self) {
        if let Some(scope) = self.scopes.pop_scope() {
            if self.dump_symbols {
                self.dumps.push(scope.dump());
            }
            self.tables.record_scope(scope);
        }
    }

    fn leave_context(&mut self, owner: NodeId) {
        if let Some(frame) = self.scopes.pop_context() {
            self.tables.record_frame(owner, frame.frame_size());
        }
    }

    /// Reports a non-positive or unaddressable array bound, returning whether
    /// the declaration is erroneous
    fn check_dimensions(&mut self, name: &str, ty: &PType, span: Span) -> bool {
        if !ty.has_valid_dimensions() {
            self.error(
                ErrorKind::InvalidArrayBound,
                format!(
                    "'{}' declared as an array with an index that is not greater than 0",
                    name
                ),
                span,
            );
            return true;
        }
        if ty.byte_size().is_none() {
            self.error(
                ErrorKind::OversizedStorage,
                format!("'{}' declared as an array too large to be stored", name),
                span,
            );
            return true;
        }
        false
    }

    /// Integers are one machine word
    fn check_literal(&mut self, literal: &Literal, span: Span) -> bool {
        let Literal::Integer(value) = literal else {
            return true;
        };
        if i32::try_from(*value).is_ok() {
            return true;
        }
        self.error(
            ErrorKind::OutOfRange,
            format!("integer literal {} is out of range", value),
            span,
        );
        false
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn visit_decl(&mut self, decl: &Decl) {
        for var in &decl.vars {
            let mut invalid = self.check_dimensions(&var.name, &var.ty, var.span);
            if let Some(value) = &var.constant {
                invalid |= !self.check_literal(value, var.span);
            }
            let entry = match &var.constant {
                Some(value) => SymbolEntry::new(&var.name, SymbolKind::Constant, var.ty.clone(), var.id)
                    .with_attribute(Attribute::Constant(value.clone())),
                None => SymbolEntry::new(&var.name, SymbolKind::Variable, var.ty.clone(), var.id),
            };
            self.declare(entry.with_error(invalid), var.span);
        }
    }

    fn visit_function(&mut self, func: &mut FunctionDecl) {
        log::debug!("analyzing function '{}'", func.name);
        let entry = SymbolEntry::new(&func.name, SymbolKind::Function, func.return_type.clone(), func.id)
            .with_attribute(Attribute::Parameters(func.param_types()));
        self.declare(entry.clone(), func.name_span);

        self.scopes.push_scope(func.id);
        self.scopes.push_context(entry);

        for param in &func.params {
            let invalid = self.check_dimensions(&param.name, &param.ty, param.span);
            let entry = SymbolEntry::new(&param.name, SymbolKind::Parameter, param.ty.clone(), param.id)
                .with_error(invalid);
            self.declare(entry, param.span);
        }
        self.visit_block_contents(&mut func.body);

        self.leave_context(func.id);
        self.leave_scope();
    }

    fn visit_block_contents(&mut self, block: &mut Block) {
        for decl in &block.decls {
            self.visit_decl(decl);
        }
        for stmt in &mut block.stmts {
            self.visit_stmt(stmt);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Block(block) => {
                self.scopes.push_scope(block.id);
                self.visit_block_contents(block);
                self.leave_scope();
            }
            StmtKind::Assign { target, value } => {
                self.visit_expr(target);
                self.visit_expr(value);
                self.check_assignment(target, value, span);
            }
            StmtKind::Print(value) => {
                self.visit_expr(value);
                if !value.is_error() && !value.ty.as_ref().is_some_and(PType::is_scalar) {
                    self.error(
                        ErrorKind::NonScalarIo,
                        "expression of print statement must be scalar type".to_string(),
                        value.span,
                    );
                }
            }
            StmtKind::Read(target) => {
                self.visit_expr(target);
                self.check_read(target);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit_condition(condition);
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.visit_condition(condition);
                self.visit_stmt(body);
            }
            StmtKind::For {
                var,
                lower,
                upper,
                body,
            } => {
                self.scopes.push_scope(var.id);
                let entry = SymbolEntry::new(&var.name, SymbolKind::LoopVar, PType::integer(), var.id);
                self.declare(entry, var.span);

                self.visit_expr(lower);
                self.visit_expr(upper);
                self.check_loop_bounds(lower, upper, span);

                self.visit_loop_body(body);
                self.leave_scope();
            }
            StmtKind::Return(value) => {
                self.visit_expr(value);
                self.check_return(value, span);
            }
            StmtKind::Call(call) => self.visit_expr(call),
        }
    }

    /// The loop body always gets a scope of its own inside the loop variable's
    fn visit_loop_body(&mut self, body: &mut Stmt) {
        if let StmtKind::Block(block) = &mut body.kind {
            self.scopes.push_scope(block.id);
            self.visit_block_contents(block);
        } else {
            self.scopes.push_scope(body.id);
            self.visit_stmt(body);
        }
        self.leave_scope();
    }

    fn visit_condition(&mut self, condition: &mut Expr) {
        self.visit_expr(condition);
        if !condition.is_error() && !condition.ty.as_ref().is_some_and(PType::is_boolean) {
            self.error(
                ErrorKind::InvalidCondition,
                "the expression of condition must be boolean type".to_string(),
                condition.span,
            );
        }
    }

    fn check_assignment(&mut self, target: &Expr, value: &mut Expr, span: Span) {
        if target.is_error() {
            return;
        }
        let ExprKind::VarRef { name, .. } = &target.kind else {
            return;
        };
        let kind = self.scopes.get_symbol(name).map(|s| s.kind);
        let Some(target_ty) = target.ty.clone() else {
            return;
        };

        if target_ty.is_array() {
            self.error(
                ErrorKind::ArrayAssignment,
                "array assignment is not allowed".to_string(),
                target.span,
            );
            return;
        }
        match kind {
            Some(SymbolKind::Constant) => {
                self.error(
                    ErrorKind::ConstantAssignment,
                    format!("cannot assign to variable '{}' which is a constant", name),
                    target.span,
                );
                return;
            }
            Some(SymbolKind::LoopVar) => {
                self.error(
                    ErrorKind::LoopVarAssignment,
                    "the value of loop variable cannot be modified inside the loop body".to_string(),
                    target.span,
                );
                return;
            }
            _ => {}
        }

        if value.is_error() {
            return;
        }
        let Some(value_ty) = value.ty.clone() else {
            return;
        };
        if value_ty.is_array() {
            self.error(
                ErrorKind::ArrayAssignment,
                "array assignment is not allowed".to_string(),
                value.span,
            );
            return;
        }

        if target_ty.is_real() && value_ty.is_integer() {
            value.promote_to_real();
        } else if target_ty != value_ty {
            self.error(
                ErrorKind::TypeMismatch,
                format!(
                    "assigning to '{}' from incompatible type '{}'",
                    target_ty, value_ty
                ),
                span,
            );
        }
    }

    fn check_read(&mut self, target: &Expr) {
        if target.is_error() {
            return;
        }
        if !target.ty.as_ref().is_some_and(PType::is_scalar) {
            self.error(
                ErrorKind::NonScalarIo,
                "variable reference of read statement must be scalar type".to_string(),
                target.span,
            );
            return;
        }
        let ExprKind::VarRef { name, .. } = &target.kind else {
            return;
        };
        let kind = self.scopes.get_symbol(name).map(|s| s.kind);
        if matches!(kind, Some(SymbolKind::Constant | SymbolKind::LoopVar)) {
            self.error(
                ErrorKind::NonScalarIo,
                "variable reference of read statement cannot be a constant or loop variable"
                    .to_string(),
                target.span,
            );
        }
    }

    fn check_loop_bounds(&mut self, lower: &Expr, upper: &Expr, span: Span) {
        if lower.is_error() || upper.is_error() {
            return;
        }
        for bound in [lower, upper] {
            if !bound.ty.as_ref().is_some_and(PType::is_integer) {
                self.error(
                    ErrorKind::InvalidLoopBounds,
                    "the bounds of iteration count must be integer type".to_string(),
                    bound.span,
                );
                return;
            }
        }
        let bounds = (
            constant_int(lower, &self.scopes),
            constant_int(upper, &self.scopes),
        );
        if let (Some(lo), Some(hi)) = bounds {
            if lo >= hi {
                self.error(
                    ErrorKind::InvalidLoopBounds,
                    "the lower bound and upper bound of iteration count must be in the incremental order"
                        .to_string(),
                    span,
                );
            }
        }
    }

    fn check_return(&mut self, value: &mut Expr, span: Span) {
        let expected = match self.scopes.get_context() {
            Some(context) if context.kind == SymbolKind::Function && !context.ty.is_void() => {
                context.ty.clone()
            }
            _ => {
                self.error(
                    ErrorKind::InvalidReturn,
                    "program/procedure should not return a value".to_string(),
                    span,
                );
                return;
            }
        };
        if value.is_error() {
            return;
        }
        let Some(actual) = value.ty.clone() else {
            return;
        };
        if expected.is_real() && actual.is_integer() {
            value.promote_to_real();
        } else if actual != expected {
            self.error(
                ErrorKind::InvalidReturn,
                format!(
                    "return '{}' from a function with return type '{}'",
                    actual, expected
                ),
                value.span,
            );
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Resolve the type of `expr`, or mark it erroneous
    fn visit_expr(&mut self, expr: &mut Expr) {
        let span = expr.span;
        let resolved = match &mut expr.kind {
            ExprKind::Literal(literal) => self.check_literal(literal, span).then(|| literal.ty()),
            ExprKind::VarRef { name, indices } => {
                for index in indices.iter_mut() {
                    self.visit_expr(index);
                }
                self.check_variable_reference(name, indices, span)
            }
            ExprKind::Binary { op, left, right } => {
                self.visit_expr(left);
                self.visit_expr(right);
                self.check_binary(*op, left, right, span)
            }
            ExprKind::Unary { op, operand } => {
                self.visit_expr(operand);
                self.check_unary(*op, operand, span)
            }
            ExprKind::Call { name, args } => {
                for arg in args.iter_mut() {
                    self.visit_expr(arg);
                }
                self.check_call(name, args, span)
            }
        };

        match resolved {
            Some(ty) => expr.set_type(ty),
            None => expr.mark_error(),
        }
    }

    fn check_variable_reference(&mut self, name: &str, indices: &[Expr], span: Span) -> Option<PType> {
        let symbol = self
            .scopes
            .get_symbol(name)
            .map(|s| (s.kind, s.ty.clone(), s.error));
        let Some((kind, ty, symbol_error)) = symbol else {
            self.error(
                ErrorKind::UndeclaredUse,
                format!("use of undeclared symbol '{}'", name),
                span,
            );
            return None;
        };
        if !kind.is_value() {
            self.error(
                ErrorKind::KindMismatch,
                format!("use of non-variable symbol '{}'", name),
                span,
            );
            return None;
        }

        for index in indices {
            if index.is_error() {
                return None;
            }
            if !index.ty.as_ref().is_some_and(PType::is_integer) {
                self.error(
                    ErrorKind::TypeMismatch,
                    "index of array reference must be an integer".to_string(),
                    index.span,
                );
                return None;
            }
        }

        let Some(element) = ty.strip_dimensions(indices.len()) else {
            self.error(
                ErrorKind::OverIndexing,
                format!("there is an over array subscript on '{}'", name),
                span,
            );
            return None;
        };
        if symbol_error {
            return None;
        }
        Some(element)
    }

    fn check_binary(&mut self, op: BinaryOp, left: &mut Expr, right: &mut Expr, span: Span) -> Option<PType> {
        if left.is_error() || right.is_error() {
            return None;
        }
        let (Some(lt), Some(rt)) = (left.ty.clone(), right.ty.clone()) else {
            return None;
        };

        let result = if op.is_arithmetic() {
            if lt.is_numeric() && rt.is_numeric() {
                if lt.is_integer() && rt.is_real() {
                    left.promote_to_real();
                    Some(PType::real())
                } else if lt.is_real() && rt.is_integer() {
                    right.promote_to_real();
                    Some(PType::real())
                } else {
                    Some(lt.clone())
                }
            } else if op == BinaryOp::Add && lt.is_string() && rt.is_string() {
                Some(PType::string())
            } else {
                None
            }
        } else if op == BinaryOp::Mod {
            (lt.is_integer() && rt.is_integer()).then(PType::integer)
        } else if op.is_logical() {
            (lt.is_boolean() && rt.is_boolean()).then(PType::boolean)
        } else {
            (lt == rt && lt.is_numeric()).then(PType::boolean)
        };

        if result.is_none() {
            self.error(
                ErrorKind::TypeMismatch,
                format!(
                    "invalid operands to binary operator '{}' ('{}' and '{}')",
                    op.as_str(),
                    lt,
                    rt
                ),
                span,
            );
        }
        result
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Option<PType> {
        if operand.is_error() {
            return None;
        }
        let ty = operand.ty.clone()?;
        let valid = match op {
            UnaryOp::Neg => ty.is_numeric(),
            UnaryOp::Not => ty.is_boolean(),
        };
        if valid {
            return Some(ty);
        }
        self.error(
            ErrorKind::TypeMismatch,
            format!("invalid operand to unary operator '{}' ('{}')", op.as_str(), ty),
            span,
        );
        None
    }

    fn check_call(&mut self, name: &str, args: &[Expr], span: Span) -> Option<PType> {
        let symbol = self
            .scopes
            .get_symbol(name)
            .map(|s| (s.kind, s.ty.clone(), s.parameters().to_vec()));
        let Some((kind, return_type, params)) = symbol else {
            self.error(
                ErrorKind::UndeclaredUse,
                format!("use of undeclared symbol '{}'", name),
                span,
            );
            return None;
        };
        if kind != SymbolKind::Function {
            self.error(
                ErrorKind::KindMismatch,
                format!("call of non-function symbol '{}'", name),
                span,
            );
            return None;
        }
        if args.len() != params.len() {
            self.error(
                ErrorKind::ArityMismatch,
                format!("too few/much arguments provided for function '{}'", name),
                span,
            );
            return None;
        }

        for (arg, param) in args.iter().zip(&params) {
            if arg.is_error() {
                return None;
            }
            let Some(arg_ty) = &arg.ty else {
                return None;
            };
            if arg_ty != param {
                self.error(
                    ErrorKind::TypeMismatch,
                    format!(
                        "incompatible type passing '{}' to parameter of type '{}'",
                        arg_ty, param
                    ),
                    arg.span,
                );
                return None;
            }
        }
        Some(return_type)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

//! RISC-V code emitter
//!
//! Expressions are evaluated on an operand stack held in memory below the
//! frame: every expression pushes exactly one word, and operators pop their
//! operands (right first) before pushing the result. Real values travel as
//! their single precision bit patterns.

use super::riscv::{FReg, Reg, RvInst};
use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::*;
use crate::sema::{constant_int, Location, ScopeManager, SymbolEntry, SymbolKind, SymbolTables};
use crate::types::{PType, PrimitiveType, WORD_SIZE};

const WORD: i32 = WORD_SIZE as i32;

/// Largest frame addressable with a 12-bit immediate
const MAX_FRAME_SIZE: u32 = 2032;

/// Code generator that lowers an analyzed program to RV32IF assembly
pub struct CodeGenerator<'a> {
    tables: &'a SymbolTables,
    scopes: ScopeManager,
    output: Vec<RvInst>,
    next_label: usize,
    strings: Vec<String>,
    file_name: String,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(tables: &'a SymbolTables) -> Self {
        Self {
            tables,
            scopes: ScopeManager::new(),
            output: Vec::new(),
            next_label: 0,
            strings: Vec::new(),
            file_name: String::from("main.p"),
        }
    }

    /// Source file name recorded in the `.file` directive
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Generate assembly text for the program
    pub fn generate(&mut self, program: &Program) -> CompileResult<String> {
        let instructions = self.generate_instructions(program)?;

        let mut result = String::new();
        for inst in &instructions {
            result.push_str(&inst.format());
            result.push('\n');
        }
        Ok(result)
    }

    /// Generate the instruction list for the program
    pub fn generate_instructions(&mut self, program: &Program) -> CompileResult<Vec<RvInst>> {
        self.output.clear();
        self.strings.clear();
        self.next_label = 0;

        self.directive(format!(".file \"{}\"", self.file_name));
        self.directive(".option nopic");

        self.in_scope(program.id, |cg| {
            cg.emit_globals(program)?;
            cg.directive(".section .text");
            for func in program.functions() {
                cg.emit_function(func)?;
            }
            cg.emit_main(program)
        })?;

        self.emit_strings();
        self.directive(".section .note.GNU-stack,\"\",@progbits");

        Ok(std::mem::take(&mut self.output))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn emit(&mut self, inst: RvInst) {
        self.output.push(inst);
    }

    fn directive(&mut self, text: impl Into<String>) {
        self.emit(RvInst::Directive(text.into()));
    }

    fn comment(&mut self, text: impl Into<String>) {
        self.emit(RvInst::Comment(text.into()));
    }

    fn new_label(&mut self) -> String {
        let label = format!(".L{}", self.next_label);
        self.next_label += 1;
        label
    }

    fn push(&mut self, reg: Reg) {
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, -WORD));
        self.emit(RvInst::Sw(reg, 0, Reg::Sp));
    }

    fn pop(&mut self, reg: Reg) {
        self.emit(RvInst::Lw(reg, 0, Reg::Sp));
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, WORD));
    }

    fn push_float(&mut self, reg: FReg) {
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, -WORD));
        self.emit(RvInst::Fsw(reg, 0, Reg::Sp));
    }

    fn pop_float(&mut self, reg: FReg) {
        self.emit(RvInst::Flw(reg, 0, Reg::Sp));
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, WORD));
    }

    /// Run `body` inside the scope the analyzer recorded for `owner`
    fn in_scope<F>(&mut self, owner: NodeId, body: F) -> CompileResult<()>
    where
        F: FnOnce(&mut Self) -> CompileResult<()>,
    {
        let scope = self
            .tables
            .scope(owner)
            .cloned()
            .ok_or_else(|| CompileError::codegen(format!("no symbol table recorded for node {:?}", owner)))?;
        self.scopes.push_recorded(scope);
        let result = body(self);
        self.scopes.pop_scope();
        result
    }

    fn symbol(&self, name: &str) -> CompileResult<SymbolEntry> {
        self.scopes
            .get_symbol(name)
            .cloned()
            .ok_or_else(|| CompileError::codegen(format!("unresolved symbol '{}'", name)))
    }

    fn frame_size(&self, owner: NodeId) -> CompileResult<i32> {
        let size = self
            .tables
            .frame_size(owner)
            .ok_or_else(|| CompileError::codegen(format!("no frame recorded for node {:?}", owner)))?;
        if size > MAX_FRAME_SIZE {
            return Err(CompileError::backend(format!(
                "frame of {} bytes exceeds the supported maximum of {}",
                size, MAX_FRAME_SIZE
            )));
        }
        Ok(size as i32)
    }

    fn intern_string(&mut self, value: &str) -> String {
        let label = format!(".LS{}", self.strings.len());
        self.strings.push(value.to_string());
        label
    }

    /// Word holding a scalar literal, strings become a pointer
    fn literal_word(&mut self, literal: &Literal) -> String {
        match literal {
            Literal::Integer(value) => value.to_string(),
            Literal::Real(value) => real_bits(*value).to_string(),
            Literal::Boolean(value) => i64::from(*value).to_string(),
            Literal::Str(value) => self.intern_string(value),
        }
    }

    /// Load a literal into `reg`
    fn load_literal(&mut self, reg: Reg, literal: &Literal) {
        match literal {
            Literal::Integer(value) => self.emit(RvInst::Li(reg, *value)),
            Literal::Real(value) => self.emit(RvInst::Li(reg, real_bits(*value))),
            Literal::Boolean(value) => self.emit(RvInst::Li(reg, i64::from(*value))),
            Literal::Str(value) => {
                let label = self.intern_string(value);
                self.emit(RvInst::La(reg, label));
            }
        }
    }

    // =========================================================================
    // Program layout
    // =========================================================================

    fn emit_globals(&mut self, program: &Program) -> CompileResult<()> {
        let tables = self.tables;
        let scope = tables
            .scope(program.id)
            .ok_or_else(|| CompileError::codegen("no global symbol table recorded"))?;

        for entry in scope.entries() {
            match entry.kind {
                SymbolKind::Variable => {
                    let size = entry.ty.byte_size().ok_or_else(|| {
                        CompileError::codegen(format!("'{}' has no addressable size", entry.name))
                    })?;
                    self.comment(format!("global variable {}", entry.name));
                    self.directive(format!(".comm {}, {}, 4", entry.name, size));
                }
                SymbolKind::Constant => {
                    let Some(value) = entry.constant() else {
                        return Err(CompileError::codegen(format!(
                            "constant '{}' has no value",
                            entry.name
                        )));
                    };
                    let word = self.literal_word(value);
                    self.comment(format!("global constant {}", entry.name));
                    self.directive(".section .rodata");
                    self.directive("    .align 2");
                    self.directive(format!("    .globl {}", entry.name));
                    self.directive(format!("    .type {}, @object", entry.name));
                    self.emit(RvInst::Label(entry.name.clone()));
                    self.directive(format!("    .word {}", word));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn emit_strings(&mut self) {
        if self.strings.is_empty() {
            return;
        }
        self.directive(".section .rodata");
        self.directive("    .align 2");
        let strings = std::mem::take(&mut self.strings);
        for (i, value) in strings.iter().enumerate() {
            self.emit(RvInst::Label(format!(".LS{}", i)));
            self.directive(format!("    .string \"{}\"", escape(value)));
        }
    }

    fn emit_prologue(&mut self, name: &str, frame: i32) {
        self.directive("    .align 2");
        self.directive(format!("    .globl {}", name));
        self.directive(format!("    .type {}, @function", name));
        self.emit(RvInst::Label(name.to_string()));
        self.comment("prologue");
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, -frame));
        self.emit(RvInst::Sw(Reg::Ra, frame - WORD, Reg::Sp));
        self.emit(RvInst::Sw(Reg::S0, frame - 2 * WORD, Reg::Sp));
        self.emit(RvInst::Addi(Reg::S0, Reg::Sp, frame));
    }

    fn emit_epilogue(&mut self, name: &str, frame: i32, label: String) {
        self.emit(RvInst::Label(label));
        self.comment("epilogue");
        self.emit(RvInst::Lw(Reg::Ra, frame - WORD, Reg::Sp));
        self.emit(RvInst::Lw(Reg::S0, frame - 2 * WORD, Reg::Sp));
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, frame));
        self.emit(RvInst::Jr(Reg::Ra));
        self.directive(format!("    .size {}, .-{}", name, name));
    }

    fn emit_function(&mut self, func: &FunctionDecl) -> CompileResult<()> {
        log::debug!("generating function '{}'", func.name);
        let frame = self.frame_size(func.id)?;
        let epilogue = self.new_label();

        self.emit_prologue(&func.name, frame);
        self.in_scope(func.id, |cg| {
            let count = func.params.len();
            for (i, param) in func.params.iter().enumerate() {
                let symbol = cg.symbol(&param.name)?;
                let offset = frame_offset(&symbol)?;
                let incoming = WORD * (count - 1 - i) as i32;
                cg.comment(format!("parameter {}", param.name));
                cg.emit(RvInst::Lw(Reg::T0, incoming, Reg::S0));
                cg.emit(RvInst::Sw(Reg::T0, -offset, Reg::S0));
            }
            cg.emit_block_contents(&func.body, &epilogue)
        })?;
        self.emit_epilogue(&func.name, frame, epilogue);
        Ok(())
    }

    fn emit_main(&mut self, program: &Program) -> CompileResult<()> {
        log::debug!("generating entry point for program '{}'", program.name);
        let frame = self.frame_size(program.id)?;
        let epilogue = self.new_label();

        self.emit_prologue("main", frame);
        for stmt in program.body() {
            self.emit_stmt(stmt, &epilogue)?;
        }
        self.emit(RvInst::Li(Reg::A0, 0));
        self.emit_epilogue("main", frame, epilogue);
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn emit_block_contents(&mut self, block: &Block, epilogue: &str) -> CompileResult<()> {
        for decl in &block.decls {
            self.emit_local_decl(decl)?;
        }
        for stmt in &block.stmts {
            self.emit_stmt(stmt, epilogue)?;
        }
        Ok(())
    }

    /// Local constants are materialized in their frame slot
    fn emit_local_decl(&mut self, decl: &Decl) -> CompileResult<()> {
        for var in &decl.vars {
            let Some(value) = &var.constant else {
                continue;
            };
            let symbol = self.symbol(&var.name)?;
            let offset = frame_offset(&symbol)?;
            self.comment(format!("local constant {}", var.name));
            self.load_literal(Reg::T0, value);
            self.emit(RvInst::Sw(Reg::T0, -offset, Reg::S0));
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt, epilogue: &str) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Block(block) => {
                self.in_scope(block.id, |cg| cg.emit_block_contents(block, epilogue))
            }
            StmtKind::Assign { target, value } => {
                self.comment("assignment");
                self.emit_address(target)?;
                self.emit_expr(value)?;
                self.pop(Reg::T1);
                self.pop(Reg::T0);
                self.emit(RvInst::Sw(Reg::T1, 0, Reg::T0));
                Ok(())
            }
            StmtKind::Print(value) => {
                self.comment("print");
                self.emit_expr(value)?;
                self.emit_print(value)
            }
            StmtKind::Read(target) => {
                self.comment("read");
                self.emit_address(target)?;
                let real = target.ty.as_ref().is_some_and(PType::is_real);
                self.emit_runtime_call(if real { "readReal" } else { "readInt" });
                self.pop(Reg::T0);
                if real {
                    self.emit(RvInst::Fsw(FReg::Fa0, 0, Reg::T0));
                } else {
                    self.emit(RvInst::Sw(Reg::A0, 0, Reg::T0));
                }
                Ok(())
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let else_label = self.new_label();
                let end_label = self.new_label();
                self.comment("if");
                self.emit_expr(condition)?;
                self.pop(Reg::T0);
                self.emit(RvInst::Beqz(Reg::T0, else_label.clone()));
                self.emit_stmt(then_branch, epilogue)?;
                self.emit(RvInst::J(end_label.clone()));
                self.emit(RvInst::Label(else_label));
                if let Some(else_branch) = else_branch {
                    self.emit_stmt(else_branch, epilogue)?;
                }
                self.emit(RvInst::Label(end_label));
                Ok(())
            }
            StmtKind::While { condition, body } => {
                let begin_label = self.new_label();
                let end_label = self.new_label();
                self.comment("while");
                self.emit(RvInst::Label(begin_label.clone()));
                self.emit_expr(condition)?;
                self.pop(Reg::T0);
                self.emit(RvInst::Beqz(Reg::T0, end_label.clone()));
                self.emit_stmt(body, epilogue)?;
                self.emit(RvInst::J(begin_label));
                self.emit(RvInst::Label(end_label));
                Ok(())
            }
            StmtKind::For {
                var,
                lower,
                upper,
                body,
            } => self.in_scope(var.id, |cg| cg.emit_for(var, lower, upper, body, epilogue)),
            StmtKind::Return(value) => {
                self.comment("return");
                self.emit_expr(value)?;
                self.pop(Reg::A0);
                self.emit(RvInst::J(epilogue.to_string()));
                Ok(())
            }
            StmtKind::Call(call) => {
                self.emit_expr(call)?;
                if call.ty.as_ref().is_some_and(|ty| !ty.is_void()) {
                    self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, WORD));
                }
                Ok(())
            }
        }
    }

    /// Unrolled loop: one copy of the body per value in `[lower, upper)`
    fn emit_for(
        &mut self,
        var: &LoopVar,
        lower: &Expr,
        upper: &Expr,
        body: &Stmt,
        epilogue: &str,
    ) -> CompileResult<()> {
        let bounds = (constant_int(lower, &self.scopes), constant_int(upper, &self.scopes));
        let (Some(lo), Some(hi)) = bounds else {
            return Err(CompileError::codegen(format!(
                "bounds of the loop over '{}' must be compile-time constants",
                var.name
            )));
        };
        let symbol = self.symbol(&var.name)?;
        let offset = frame_offset(&symbol)?;

        for value in lo..hi {
            self.comment(format!("for {} = {}", var.name, value));
            self.emit(RvInst::Li(Reg::T0, value));
            self.emit(RvInst::Sw(Reg::T0, -offset, Reg::S0));
            match &body.kind {
                StmtKind::Block(block) => {
                    self.in_scope(block.id, |cg| cg.emit_block_contents(block, epilogue))?
                }
                _ => self.in_scope(body.id, |cg| cg.emit_stmt(body, epilogue))?,
            }
        }
        Ok(())
    }

    /// Calls into the runtime with `sp` realigned to 16 bytes. The operand
    /// stack keeps only word alignment, so the old `sp` is saved in the
    /// padded slot and restored after the call.
    fn emit_runtime_call(&mut self, routine: &str) {
        self.emit(RvInst::Mv(Reg::T2, Reg::Sp));
        self.emit(RvInst::Andi(Reg::Sp, Reg::Sp, -16));
        self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, -16));
        self.emit(RvInst::Sw(Reg::T2, 0, Reg::Sp));
        self.emit(RvInst::Call(routine.to_string()));
        self.emit(RvInst::Lw(Reg::Sp, 0, Reg::Sp));
    }

    fn emit_print(&mut self, value: &Expr) -> CompileResult<()> {
        let primitive = value
            .ty
            .as_ref()
            .map(PType::primitive)
            .ok_or_else(|| CompileError::codegen("print of an untyped expression"))?;
        match primitive {
            PrimitiveType::Integer | PrimitiveType::Boolean => {
                self.pop(Reg::A0);
                self.emit_runtime_call("printInt");
            }
            PrimitiveType::Real => {
                self.pop_float(FReg::Fa0);
                self.emit_runtime_call("printReal");
            }
            PrimitiveType::String => {
                self.pop(Reg::A0);
                self.emit_runtime_call("printString");
            }
            PrimitiveType::Void => {
                return Err(CompileError::codegen("print of a void expression"));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Push the value of `expr`, converting it when the analyzer promoted it
    fn emit_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        self.emit_value(expr)?;
        if expr.promoted {
            self.pop(Reg::T0);
            self.emit(RvInst::FcvtSW(FReg::Ft0, Reg::T0));
            self.push_float(FReg::Ft0);
        }
        Ok(())
    }

    fn emit_value(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Literal(literal) => {
                self.load_literal(Reg::T0, literal);
                self.push(Reg::T0);
                Ok(())
            }
            ExprKind::VarRef { .. } => {
                self.emit_address(expr)?;
                // Arrays are passed around by address
                if !expr.ty.as_ref().is_some_and(PType::is_array) {
                    self.pop(Reg::T0);
                    self.emit(RvInst::Lw(Reg::T0, 0, Reg::T0));
                    self.push(Reg::T0);
                }
                Ok(())
            }
            ExprKind::Binary { op, left, right } => {
                self.emit_expr(left)?;
                self.emit_expr(right)?;
                self.emit_binary(*op, left)
            }
            ExprKind::Unary { op, operand } => {
                self.emit_expr(operand)?;
                self.emit_unary(*op, operand)
            }
            ExprKind::Call { name, args } => {
                for arg in args {
                    self.emit_expr(arg)?;
                }
                self.emit(RvInst::Call(name.clone()));
                if !args.is_empty() {
                    self.emit(RvInst::Addi(Reg::Sp, Reg::Sp, WORD * args.len() as i32));
                }
                if expr.ty.as_ref().is_some_and(|ty| !ty.is_void()) {
                    self.push(Reg::A0);
                }
                Ok(())
            }
        }
    }

    /// Push the address of a variable reference, applying its subscripts
    fn emit_address(&mut self, expr: &Expr) -> CompileResult<()> {
        let ExprKind::VarRef { name, indices } = &expr.kind else {
            return Err(CompileError::codegen("address of a non-variable expression"));
        };
        let symbol = self.symbol(name)?;

        match &symbol.location {
            Location::Global(label) => self.emit(RvInst::La(Reg::T0, label.clone())),
            Location::Param { offset, .. } if symbol.ty.is_array() => {
                self.emit(RvInst::Lw(Reg::T0, -(*offset as i32), Reg::S0));
            }
            Location::Frame { offset } | Location::Param { offset, .. } => {
                self.emit(RvInst::Addi(Reg::T0, Reg::S0, -(*offset as i32)));
            }
            Location::None => {
                return Err(CompileError::codegen(format!("'{}' has no storage", name)));
            }
        }
        self.push(Reg::T0);

        for (k, index) in indices.iter().enumerate() {
            let stride = symbol.ty.stride(k).ok_or_else(|| {
                CompileError::codegen(format!("'{}' has no addressable stride", name))
            })?;
            self.emit_expr(index)?;
            self.pop(Reg::T1);
            self.pop(Reg::T0);
            self.emit(RvInst::Li(Reg::T2, i64::from(stride)));
            self.emit(RvInst::Mul(Reg::T1, Reg::T1, Reg::T2));
            self.emit(RvInst::Add(Reg::T0, Reg::T0, Reg::T1));
            self.push(Reg::T0);
        }
        Ok(())
    }

    fn emit_binary(&mut self, op: BinaryOp, left: &Expr) -> CompileResult<()> {
        let operand = left
            .ty
            .clone()
            .ok_or_else(|| CompileError::codegen("binary operand without a type"))?;

        if operand.is_real() {
            self.pop_float(FReg::Ft1);
            self.pop_float(FReg::Ft0);
            let (a, b) = (FReg::Ft0, FReg::Ft1);
            match op {
                BinaryOp::Add => self.emit(RvInst::FaddS(a, a, b)),
                BinaryOp::Sub => self.emit(RvInst::FsubS(a, a, b)),
                BinaryOp::Mul => self.emit(RvInst::FmulS(a, a, b)),
                BinaryOp::Div => self.emit(RvInst::FdivS(a, a, b)),
                _ => {
                    match op {
                        BinaryOp::Lt => self.emit(RvInst::FltS(Reg::T0, a, b)),
                        BinaryOp::Le => self.emit(RvInst::FleS(Reg::T0, a, b)),
                        BinaryOp::Gt => self.emit(RvInst::FltS(Reg::T0, b, a)),
                        BinaryOp::Ge => self.emit(RvInst::FleS(Reg::T0, b, a)),
                        BinaryOp::Eq => self.emit(RvInst::FeqS(Reg::T0, a, b)),
                        BinaryOp::Ne => {
                            self.emit(RvInst::FeqS(Reg::T0, a, b));
                            self.emit(RvInst::Xori(Reg::T0, Reg::T0, 1));
                        }
                        _ => return Err(unsupported_binary(op, &operand)),
                    }
                    self.push(Reg::T0);
                    return Ok(());
                }
            }
            self.push_float(a);
            return Ok(());
        }

        if operand.is_string() {
            return Err(unsupported_binary(op, &operand));
        }

        self.pop(Reg::T1);
        self.pop(Reg::T0);
        let (a, b) = (Reg::T0, Reg::T1);
        match op {
            BinaryOp::Add => self.emit(RvInst::Add(a, a, b)),
            BinaryOp::Sub => self.emit(RvInst::Sub(a, a, b)),
            BinaryOp::Mul => self.emit(RvInst::Mul(a, a, b)),
            BinaryOp::Div => self.emit(RvInst::Div(a, a, b)),
            BinaryOp::Mod => self.emit(RvInst::Rem(a, a, b)),
            BinaryOp::And => self.emit(RvInst::And(a, a, b)),
            BinaryOp::Or => self.emit(RvInst::Or(a, a, b)),
            BinaryOp::Lt => self.emit(RvInst::Slt(a, a, b)),
            BinaryOp::Gt => self.emit(RvInst::Slt(a, b, a)),
            BinaryOp::Le => {
                self.emit(RvInst::Slt(a, b, a));
                self.emit(RvInst::Xori(a, a, 1));
            }
            BinaryOp::Ge => {
                self.emit(RvInst::Slt(a, a, b));
                self.emit(RvInst::Xori(a, a, 1));
            }
            BinaryOp::Eq => {
                self.emit(RvInst::Sub(a, a, b));
                self.emit(RvInst::Seqz(a, a));
            }
            BinaryOp::Ne => {
                self.emit(RvInst::Sub(a, a, b));
                self.emit(RvInst::Snez(a, a));
            }
        }
        self.push(a);
        Ok(())
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: &Expr) -> CompileResult<()> {
        match op {
            UnaryOp::Neg if operand.ty.as_ref().is_some_and(PType::is_real) => {
                self.pop_float(FReg::Ft0);
                self.emit(RvInst::FnegS(FReg::Ft0, FReg::Ft0));
                self.push_float(FReg::Ft0);
            }
            UnaryOp::Neg => {
                self.pop(Reg::T0);
                self.emit(RvInst::Sub(Reg::T0, Reg::Zero, Reg::T0));
                self.push(Reg::T0);
            }
            UnaryOp::Not => {
                self.pop(Reg::T0);
                self.emit(RvInst::Xori(Reg::T0, Reg::T0, 1));
                self.push(Reg::T0);
            }
        }
        Ok(())
    }
}

fn frame_offset(symbol: &SymbolEntry) -> CompileResult<i32> {
    symbol
        .location
        .frame_offset()
        .map(|offset| offset as i32)
        .ok_or_else(|| CompileError::codegen(format!("'{}' is not stored in a frame", symbol.name)))
}

fn unsupported_binary(op: BinaryOp, operand: &PType) -> CompileError {
    CompileError::codegen(format!(
        "cannot lower operator '{}' on '{}' operands",
        op.as_str(),
        operand
    ))
}

/// Bit pattern of a real literal as a signed word
fn real_bits(value: f64) -> i64 {
    i64::from((value as f32).to_bits() as i32)
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse;
    use crate::sema::SemanticAnalyzer;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> CompileResult<String> {
        let mut program = parse(source).unwrap();
        let analysis = SemanticAnalyzer::new().analyze(&mut program);
        assert!(!analysis.has_errors(), "{:?}", analysis.diagnostics);
        CodeGenerator::new(&analysis.tables)
            .with_file_name("test.p")
            .generate(&program)
    }

    fn lines(asm: &str) -> Vec<&str> {
        asm.lines().collect()
    }

    #[test]
    fn test_file_layout() {
        let asm = compile("var a : integer; a := 1;").unwrap();
        let lines = lines(&asm);
        assert_eq!(lines[0], ".file \"test.p\"");
        assert_eq!(lines[1], ".option nopic");
        assert!(lines.contains(&".comm a, 4, 4"));
        assert_eq!(lines.last(), Some(&".section .note.GNU-stack,\"\",@progbits"));
    }

    #[test]
    fn test_main_frame() {
        let asm = compile("print 1;").unwrap();
        let start = asm.find("main:\n").unwrap();
        let expected = "main:
    # prologue
    addi sp, sp, -128
    sw ra, 124(sp)
    sw s0, 120(sp)
    addi s0, sp, 128
";
        assert_eq!(&asm[start..start + expected.len()], expected);
        assert!(asm.contains(
            "    # epilogue
    lw ra, 124(sp)
    lw s0, 120(sp)
    addi sp, sp, 128
    jr ra
"
        ));
    }

    #[test]
    fn test_globals_and_constants() {
        let asm = compile("var m : array[2][3] of integer; var k : 7; var s : \"hi\"; print k;").unwrap();
        assert!(asm.contains(".comm m, 24, 4"));
        assert!(asm.contains("    .globl k\n    .type k, @object\nk:\n    .word 7"));
        assert!(asm.contains("s:\n    .word .LS0"));
        assert!(asm.contains(".LS0:\n    .string \"hi\""));
    }

    #[test]
    fn test_for_loop_is_unrolled() {
        let asm = compile("for i := 0 to 3 do print(i);").unwrap();
        assert_eq!(asm.matches("jal ra, printInt").count(), 3);
        for value in 0..3 {
            assert!(asm.contains(&format!("# for i = {}\n    li t0, {}\n    sw t0, -12(s0)", value, value)));
        }
    }

    #[test]
    fn test_constant_symbol_bounds() {
        let asm = compile("var n : 2; for i := 0 to n do print(i);").unwrap();
        assert_eq!(asm.matches("jal ra, printInt").count(), 2);
    }

    #[test]
    fn test_labels_are_unique() {
        let asm = compile(
            "var a : integer;
             if a < 1 then print 1; else print 2;
             while a < 3 do a := a + 1;
             if true then print 3;",
        )
        .unwrap();
        let mut labels: Vec<_> = asm.lines().filter(|l| l.starts_with(".L")).collect();
        let count = labels.len();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), count);
        assert!(count >= 6);
    }

    #[test]
    fn test_function_parameters_copied_into_frame() {
        let asm = compile(
            "function add(a, b : integer) : integer begin return a + b; end
             print add(1, 2);",
        )
        .unwrap();
        assert!(asm.contains("add:\n"));
        assert!(asm.contains("    lw t0, 4(s0)\n    sw t0, -12(s0)"));
        assert!(asm.contains("    lw t0, 0(s0)\n    sw t0, -16(s0)"));
        assert!(asm.contains("    jal ra, add\n    addi sp, sp, 8\n    addi sp, sp, -4\n    sw a0, 0(sp)"));
    }

    #[test]
    fn test_promotion_converts_operand() {
        let asm = compile("var x : real; var y : integer; print x + y;").unwrap();
        assert!(asm.contains("fcvt.s.w ft0, t0"));
        assert!(asm.contains("fadd.s ft0, ft0, ft1"));
        assert!(asm.contains("jal ra, printReal"));
    }

    #[test]
    fn test_non_constant_bounds_are_fatal() {
        let err = compile("var n : integer; for i := 0 to n do print i;").unwrap_err();
        assert!(matches!(err, CompileError::Codegen { .. }));
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let err = compile("function f() begin var big : array[600] of integer; end").unwrap_err();
        assert!(matches!(err, CompileError::Backend { .. }));
    }

    #[test]
    fn test_runtime_calls_realign_stack() {
        let asm = compile("var r : real; read r; print r;").unwrap();
        for routine in ["readReal", "printReal"] {
            let call = format!(
                "    mv t2, sp
    andi sp, sp, -16
    addi sp, sp, -16
    sw t2, 0(sp)
    jal ra, {}
    lw sp, 0(sp)
",
                routine
            );
            assert!(asm.contains(&call), "{}", asm);
        }
    }

    #[test]
    fn test_string_concatenation_is_fatal() {
        let err = compile("print \"a\" + \"b\";").unwrap_err();
        assert!(matches!(err, CompileError::Codegen { .. }));
    }
}

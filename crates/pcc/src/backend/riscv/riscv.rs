//! RV32IF instruction definitions

use std::fmt;

/// Integer registers used by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Zero,
    Ra,
    Sp,
    S0, // Frame pointer
    T0,
    T1,
    T2,
    A0,
    A1,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::Zero => "zero",
            Reg::Ra => "ra",
            Reg::Sp => "sp",
            Reg::S0 => "s0",
            Reg::T0 => "t0",
            Reg::T1 => "t1",
            Reg::T2 => "t2",
            Reg::A0 => "a0",
            Reg::A1 => "a1",
        };
        f.write_str(name)
    }
}

/// Single precision float registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FReg {
    Ft0,
    Ft1,
    Fa0,
}

impl fmt::Display for FReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FReg::Ft0 => "ft0",
            FReg::Ft1 => "ft1",
            FReg::Fa0 => "fa0",
        };
        f.write_str(name)
    }
}

/// RISC-V instruction
#[derive(Debug, Clone, PartialEq)]
pub enum RvInst {
    // Data movement
    Li(Reg, i64),
    La(Reg, String),
    Lw(Reg, i32, Reg),
    Sw(Reg, i32, Reg),
    Flw(FReg, i32, Reg),
    Fsw(FReg, i32, Reg),
    Mv(Reg, Reg),

    // Integer arithmetic and logic
    Addi(Reg, Reg, i32),
    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    Div(Reg, Reg, Reg),
    Rem(Reg, Reg, Reg),
    And(Reg, Reg, Reg),
    Or(Reg, Reg, Reg),
    Andi(Reg, Reg, i32),
    Xori(Reg, Reg, i32),
    Slt(Reg, Reg, Reg),
    Seqz(Reg, Reg),
    Snez(Reg, Reg),

    // Single precision
    FaddS(FReg, FReg, FReg),
    FsubS(FReg, FReg, FReg),
    FmulS(FReg, FReg, FReg),
    FdivS(FReg, FReg, FReg),
    FnegS(FReg, FReg),
    FeqS(Reg, FReg, FReg),
    FltS(Reg, FReg, FReg),
    FleS(Reg, FReg, FReg),
    FcvtSW(FReg, Reg),

    // Control flow
    Beqz(Reg, String),
    J(String),
    /// `jal ra, target`
    Call(String),
    Jr(Reg),

    // Pseudo-instructions
    Label(String),
    Comment(String),
    Directive(String),
}

impl RvInst {
    pub fn format(&self) -> String {
        match self {
            RvInst::Li(rd, imm) => format!("    li {}, {}", rd, imm),
            RvInst::La(rd, label) => format!("    la {}, {}", rd, label),
            RvInst::Lw(rd, off, base) => format!("    lw {}, {}({})", rd, off, base),
            RvInst::Sw(rs, off, base) => format!("    sw {}, {}({})", rs, off, base),
            RvInst::Flw(rd, off, base) => format!("    flw {}, {}({})", rd, off, base),
            RvInst::Fsw(rs, off, base) => format!("    fsw {}, {}({})", rs, off, base),
            RvInst::Mv(rd, rs) => format!("    mv {}, {}", rd, rs),

            RvInst::Addi(rd, rs, imm) => format!("    addi {}, {}, {}", rd, rs, imm),
            RvInst::Add(rd, a, b) => format!("    add {}, {}, {}", rd, a, b),
            RvInst::Sub(rd, a, b) => format!("    sub {}, {}, {}", rd, a, b),
            RvInst::Mul(rd, a, b) => format!("    mul {}, {}, {}", rd, a, b),
            RvInst::Div(rd, a, b) => format!("    div {}, {}, {}", rd, a, b),
            RvInst::Rem(rd, a, b) => format!("    rem {}, {}, {}", rd, a, b),
            RvInst::And(rd, a, b) => format!("    and {}, {}, {}", rd, a, b),
            RvInst::Or(rd, a, b) => format!("    or {}, {}, {}", rd, a, b),
            RvInst::Andi(rd, rs, imm) => format!("    andi {}, {}, {}", rd, rs, imm),
            RvInst::Xori(rd, rs, imm) => format!("    xori {}, {}, {}", rd, rs, imm),
            RvInst::Slt(rd, a, b) => format!("    slt {}, {}, {}", rd, a, b),
            RvInst::Seqz(rd, rs) => format!("    seqz {}, {}", rd, rs),
            RvInst::Snez(rd, rs) => format!("    snez {}, {}", rd, rs),

            RvInst::FaddS(rd, a, b) => format!("    fadd.s {}, {}, {}", rd, a, b),
            RvInst::FsubS(rd, a, b) => format!("    fsub.s {}, {}, {}", rd, a, b),
            RvInst::FmulS(rd, a, b) => format!("    fmul.s {}, {}, {}", rd, a, b),
            RvInst::FdivS(rd, a, b) => format!("    fdiv.s {}, {}, {}", rd, a, b),
            RvInst::FnegS(rd, rs) => format!("    fneg.s {}, {}", rd, rs),
            RvInst::FeqS(rd, a, b) => format!("    feq.s {}, {}, {}", rd, a, b),
            RvInst::FltS(rd, a, b) => format!("    flt.s {}, {}, {}", rd, a, b),
            RvInst::FleS(rd, a, b) => format!("    fle.s {}, {}, {}", rd, a, b),
            RvInst::FcvtSW(rd, rs) => format!("    fcvt.s.w {}, {}", rd, rs),

            RvInst::Beqz(rs, label) => format!("    beqz {}, {}", rs, label),
            RvInst::J(label) => format!("    j {}", label),
            RvInst::Call(target) => format!("    jal ra, {}", target),
            RvInst::Jr(rs) => format!("    jr {}", rs),

            RvInst::Label(label) => format!("{}:", label),
            RvInst::Comment(text) => format!("    # {}", text),
            RvInst::Directive(text) => text.clone(),
        }
    }
}

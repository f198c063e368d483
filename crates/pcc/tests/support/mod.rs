//! Test harness: compile P source and run the result on a tiny RV32IF machine
//!
//! The machine executes the generator's instruction list directly. Data
//! directives (`.comm`, `.word`, `.string`) are laid out in a flat memory
//! image and calls to the runtime's I/O routines are serviced with the
//! runtime's own formatting helpers.

#![allow(dead_code)]

use p_compiler::backend::riscv::{CodeGenerator, FReg, Reg, RvInst};
use p_compiler::frontend::parse;
use p_compiler::sema::{Analysis, SemanticAnalyzer, SemanticDiagnostic};
use p_compiler::{CompileError, CompileResult};
use std::collections::{HashMap, VecDeque};

const MEMORY_SIZE: usize = 1 << 20;
const DATA_BASE: u32 = 0x1000;
/// Return address that halts the machine when `main` returns
const HALT: i32 = -1;
const STEP_LIMIT: usize = 5_000_000;

/// Parse and analyze, returning the annotated program's analysis
pub fn analyze(source: &str) -> Analysis {
    let mut program = parse(source).expect("source should parse");
    SemanticAnalyzer::new().analyze(&mut program)
}

/// Semantic diagnostics of `source`, in recording order
pub fn diagnostics(source: &str) -> Vec<SemanticDiagnostic> {
    analyze(source).diagnostics
}

/// Compile `source` to an instruction list, panicking on semantic errors
pub fn compile(source: &str) -> CompileResult<Vec<RvInst>> {
    let mut program = parse(source)?;
    let analysis = SemanticAnalyzer::new().analyze(&mut program);
    if analysis.has_errors() {
        let messages: Vec<_> = analysis.diagnostics.iter().map(|d| d.message.clone()).collect();
        panic!("unexpected semantic errors: {:?}", messages);
    }
    CodeGenerator::new(&analysis.tables)
        .with_file_name("test.p")
        .generate_instructions(&program)
}

/// Compile and run `source`, returning the printed lines
pub fn run(source: &str) -> Vec<String> {
    run_with_input(source, &[])
}

/// Compile and run `source` feeding `input` lines to `read`
pub fn run_with_input(source: &str, input: &[&str]) -> Vec<String> {
    let program = match compile(source) {
        Ok(program) => program,
        Err(CompileError::Codegen { message }) => panic!("code generation failed: {}", message),
        Err(e) => panic!("compilation failed: {}", e),
    };
    let mut machine = Machine::load(&program);
    machine.input = input.iter().map(|s| s.to_string()).collect();
    machine.run();
    machine.output
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Text,
    Data,
    Other,
}

/// A minimal RV32IF machine
pub struct Machine {
    program: Vec<RvInst>,
    code_labels: HashMap<String, usize>,
    data_labels: HashMap<String, u32>,
    regs: [i32; 9],
    fregs: [u32; 3],
    memory: Vec<u8>,
    pub input: VecDeque<String>,
    pub output: Vec<String>,
}

impl Machine {
    pub fn load(program: &[RvInst]) -> Self {
        let mut machine = Self {
            program: program.to_vec(),
            code_labels: HashMap::new(),
            data_labels: HashMap::new(),
            regs: [0; 9],
            fregs: [0; 3],
            memory: vec![0; MEMORY_SIZE],
            input: VecDeque::new(),
            output: Vec::new(),
        };
        machine.layout();
        machine
    }

    /// Assign addresses to every label, then fill in the data image
    fn layout(&mut self) {
        let mut section = Section::Text;
        let mut cursor = DATA_BASE;
        let mut words = Vec::new();
        let mut strings = Vec::new();

        for (index, inst) in self.program.iter().enumerate() {
            match inst {
                RvInst::Label(label) if section == Section::Text => {
                    self.code_labels.insert(label.clone(), index);
                }
                RvInst::Label(label) => {
                    self.data_labels.insert(label.clone(), cursor);
                }
                RvInst::Directive(text) => {
                    let text = text.trim();
                    let (name, args) = text.split_once(' ').unwrap_or((text, ""));
                    match name {
                        ".section" if args.starts_with(".text") => section = Section::Text,
                        ".section" if args.starts_with(".rodata") => section = Section::Data,
                        ".section" => section = Section::Other,
                        ".comm" => {
                            let parts: Vec<_> = args.split(',').map(str::trim).collect();
                            let size: u32 = parts[1].parse().expect(".comm size");
                            cursor = align(cursor);
                            self.data_labels.insert(parts[0].to_string(), cursor);
                            cursor += size;
                        }
                        ".align" if section == Section::Data => cursor = align(cursor),
                        ".word" => {
                            words.push((cursor, args.trim().to_string()));
                            cursor += 4;
                        }
                        ".string" => {
                            let value = unescape(args.trim());
                            strings.push((cursor, value.clone()));
                            cursor += value.len() as u32 + 1;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        for (address, value) in words {
            let word = match value.parse::<i64>() {
                Ok(number) => number as i32,
                Err(_) => self.data_address(&value) as i32,
            };
            self.store(address, word);
        }
        for (address, value) in strings {
            let start = address as usize;
            self.memory[start..start + value.len()].copy_from_slice(value.as_bytes());
            self.memory[start + value.len()] = 0;
        }
    }

    fn data_address(&self, label: &str) -> u32 {
        *self
            .data_labels
            .get(label)
            .unwrap_or_else(|| panic!("undefined data label '{}'", label))
    }

    fn code_address(&self, label: &str) -> usize {
        *self
            .code_labels
            .get(label)
            .unwrap_or_else(|| panic!("undefined code label '{}'", label))
    }

    fn reg(&self, reg: Reg) -> i32 {
        self.regs[reg_index(reg)]
    }

    fn set_reg(&mut self, reg: Reg, value: i32) {
        if reg != Reg::Zero {
            self.regs[reg_index(reg)] = value;
        }
    }

    fn freg(&self, reg: FReg) -> f32 {
        f32::from_bits(self.fregs[freg_index(reg)])
    }

    fn set_freg(&mut self, reg: FReg, value: f32) {
        self.fregs[freg_index(reg)] = value.to_bits();
    }

    fn load_word(&self, address: u32) -> i32 {
        let start = address as usize;
        assert!(start % 4 == 0, "misaligned load at {:#x}", address);
        let bytes: [u8; 4] = self.memory[start..start + 4].try_into().expect("word");
        i32::from_le_bytes(bytes)
    }

    fn store(&mut self, address: u32, value: i32) {
        let start = address as usize;
        assert!(start % 4 == 0, "misaligned store at {:#x}", address);
        self.memory[start..start + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn effective(&self, base: Reg, offset: i32) -> u32 {
        self.reg(base).wrapping_add(offset) as u32
    }

    fn c_string(&self, address: u32) -> String {
        let start = address as usize;
        let end = self.memory[start..]
            .iter()
            .position(|&b| b == 0)
            .map(|n| start + n)
            .expect("unterminated string");
        String::from_utf8_lossy(&self.memory[start..end]).into_owned()
    }

    /// Service a call to a runtime routine, returning false for user code
    fn runtime_call(&mut self, target: &str) -> bool {
        let aligned = self.reg(Reg::Sp) % 16 == 0;
        match target {
            "printInt" => {
                let text = prt::format_int(self.reg(Reg::A0));
                self.output.push(text);
            }
            "printReal" => {
                let text = prt::format_real(self.freg(FReg::Fa0));
                self.output.push(text);
            }
            "printString" => {
                let text = self.c_string(self.reg(Reg::A0) as u32);
                self.output.push(text);
            }
            "readInt" => {
                let line = self.input.pop_front().unwrap_or_default();
                self.set_reg(Reg::A0, prt::parse_int(&line).unwrap_or(0));
            }
            "readReal" => {
                let line = self.input.pop_front().unwrap_or_default();
                self.set_freg(FReg::Fa0, prt::parse_real(&line).unwrap_or(0.0));
            }
            _ => return false,
        }
        assert!(aligned, "{} called with misaligned sp {:#x}", target, self.reg(Reg::Sp));
        true
    }

    /// Run from `main` until it returns
    pub fn run(&mut self) {
        self.set_reg(Reg::Sp, MEMORY_SIZE as i32);
        self.set_reg(Reg::Ra, HALT);
        let mut pc = self.code_address("main");

        for _ in 0..STEP_LIMIT {
            let inst = self.program[pc].clone();
            pc += 1;
            match inst {
                RvInst::Li(rd, imm) => self.set_reg(rd, imm as i32),
                RvInst::La(rd, label) => {
                    let address = self.data_address(&label);
                    self.set_reg(rd, address as i32);
                }
                RvInst::Lw(rd, offset, base) => {
                    let value = self.load_word(self.effective(base, offset));
                    self.set_reg(rd, value);
                }
                RvInst::Sw(rs, offset, base) => {
                    self.store(self.effective(base, offset), self.reg(rs));
                }
                RvInst::Flw(rd, offset, base) => {
                    let bits = self.load_word(self.effective(base, offset)) as u32;
                    self.fregs[freg_index(rd)] = bits;
                }
                RvInst::Fsw(rs, offset, base) => {
                    let bits = self.fregs[freg_index(rs)] as i32;
                    self.store(self.effective(base, offset), bits);
                }
                RvInst::Mv(rd, rs) => self.set_reg(rd, self.reg(rs)),

                RvInst::Addi(rd, rs, imm) => self.set_reg(rd, self.reg(rs).wrapping_add(imm)),
                RvInst::Add(rd, a, b) => self.set_reg(rd, self.reg(a).wrapping_add(self.reg(b))),
                RvInst::Sub(rd, a, b) => self.set_reg(rd, self.reg(a).wrapping_sub(self.reg(b))),
                RvInst::Mul(rd, a, b) => self.set_reg(rd, self.reg(a).wrapping_mul(self.reg(b))),
                RvInst::Div(rd, a, b) => {
                    let (x, y) = (self.reg(a), self.reg(b));
                    self.set_reg(rd, if y == 0 { -1 } else { x.wrapping_div(y) });
                }
                RvInst::Rem(rd, a, b) => {
                    let (x, y) = (self.reg(a), self.reg(b));
                    self.set_reg(rd, if y == 0 { x } else { x.wrapping_rem(y) });
                }
                RvInst::And(rd, a, b) => self.set_reg(rd, self.reg(a) & self.reg(b)),
                RvInst::Or(rd, a, b) => self.set_reg(rd, self.reg(a) | self.reg(b)),
                RvInst::Andi(rd, rs, imm) => self.set_reg(rd, self.reg(rs) & imm),
                RvInst::Xori(rd, rs, imm) => self.set_reg(rd, self.reg(rs) ^ imm),
                RvInst::Slt(rd, a, b) => self.set_reg(rd, i32::from(self.reg(a) < self.reg(b))),
                RvInst::Seqz(rd, rs) => self.set_reg(rd, i32::from(self.reg(rs) == 0)),
                RvInst::Snez(rd, rs) => self.set_reg(rd, i32::from(self.reg(rs) != 0)),

                RvInst::FaddS(rd, a, b) => self.set_freg(rd, self.freg(a) + self.freg(b)),
                RvInst::FsubS(rd, a, b) => self.set_freg(rd, self.freg(a) - self.freg(b)),
                RvInst::FmulS(rd, a, b) => self.set_freg(rd, self.freg(a) * self.freg(b)),
                RvInst::FdivS(rd, a, b) => self.set_freg(rd, self.freg(a) / self.freg(b)),
                RvInst::FnegS(rd, rs) => self.set_freg(rd, -self.freg(rs)),
                RvInst::FeqS(rd, a, b) => self.set_reg(rd, i32::from(self.freg(a) == self.freg(b))),
                RvInst::FltS(rd, a, b) => self.set_reg(rd, i32::from(self.freg(a) < self.freg(b))),
                RvInst::FleS(rd, a, b) => self.set_reg(rd, i32::from(self.freg(a) <= self.freg(b))),
                RvInst::FcvtSW(rd, rs) => self.set_freg(rd, self.reg(rs) as f32),

                RvInst::Beqz(rs, label) => {
                    if self.reg(rs) == 0 {
                        pc = self.code_address(&label);
                    }
                }
                RvInst::J(label) => pc = self.code_address(&label),
                RvInst::Call(target) => {
                    if !self.runtime_call(&target) {
                        self.set_reg(Reg::Ra, pc as i32);
                        pc = self.code_address(&target);
                    }
                }
                RvInst::Jr(rs) => {
                    let target = self.reg(rs);
                    if target == HALT {
                        assert_eq!(self.reg(Reg::Sp), MEMORY_SIZE as i32, "unbalanced stack at exit");
                        return;
                    }
                    pc = target as usize;
                }

                RvInst::Label(_) | RvInst::Comment(_) | RvInst::Directive(_) => {}
            }
        }
        panic!("step limit exceeded");
    }
}

fn reg_index(reg: Reg) -> usize {
    match reg {
        Reg::Zero => 0,
        Reg::Ra => 1,
        Reg::Sp => 2,
        Reg::S0 => 3,
        Reg::T0 => 4,
        Reg::T1 => 5,
        Reg::T2 => 6,
        Reg::A0 => 7,
        Reg::A1 => 8,
    }
}

fn freg_index(reg: FReg) -> usize {
    match reg {
        FReg::Ft0 => 0,
        FReg::Ft1 => 1,
        FReg::Fa0 => 2,
    }
}

fn align(address: u32) -> u32 {
    (address + 3) & !3
}

/// Undo the assembler string escaping, dropping the surrounding quotes
fn unescape(quoted: &str) -> String {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted);
    let mut result = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}

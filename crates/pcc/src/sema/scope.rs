//! Symbol table and scope management
//!
//! [`ScopeManager`] keeps a stack of [`Scope`]s, the side table of active
//! loop induction variables and the stack of function contexts used for
//! frame layout. Both the analyzer and the code generator drive it, so the
//! same nesting is observed in both passes.

use crate::frontend::ast::{Literal, NodeId};
use crate::types::{PType, WORD_SIZE};
use std::collections::HashMap;
use std::fmt::{self, Write as _};

/// Bytes of every frame reserved for the saved `ra` and `s0`
pub const SAVED_REGISTER_BYTES: u32 = 8;

/// Smallest frame the prologue allocates
pub const MIN_FRAME_SIZE: u32 = 128;

/// Largest offset below the frame pointer, kept 16-byte aligned
const MAX_FRAME_OFFSET: u32 = i32::MAX as u32 & !15;

const TABLE_WIDTH: usize = 110;

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Program,
    Function,
    Parameter,
    Variable,
    LoopVar,
    Constant,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Program => "program",
            SymbolKind::Function => "function",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Variable => "variable",
            SymbolKind::LoopVar => "loop_var",
            SymbolKind::Constant => "constant",
        }
    }

    /// Whether a reference to this symbol denotes a value
    pub fn is_value(&self) -> bool {
        !matches!(self, SymbolKind::Program | SymbolKind::Function)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra information attached to a symbol
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    None,
    /// Value of a constant
    Constant(Literal),
    /// Parameter types of a function, in order
    Parameters(Vec<PType>),
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::None => Ok(()),
            Attribute::Constant(value) => write!(f, "{}", value),
            Attribute::Parameters(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                Ok(())
            }
        }
    }
}

/// Where the value of a symbol lives at run time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Programs, functions and symbols that could not be given storage
    None,
    /// Global storage addressed by label
    Global(String),
    /// Local storage at `-offset(s0)`
    Frame { offset: u32 },
    /// Parameter copied to `-offset(s0)` from incoming argument `index`
    Param { offset: u32, index: usize },
}

impl Location {
    pub fn frame_offset(&self) -> Option<u32> {
        match self {
            Location::Frame { offset } | Location::Param { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A symbol in the symbol table
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub level: usize,
    pub ty: PType,
    pub attribute: Attribute,
    /// Declaring node
    pub node: NodeId,
    pub error: bool,
    pub location: Location,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: PType, node: NodeId) -> Self {
        Self {
            name: name.into(),
            kind,
            level: 0,
            ty,
            attribute: Attribute::None,
            node,
            error: false,
            location: Location::None,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Parameter types, for function symbols
    pub fn parameters(&self) -> &[PType] {
        match &self.attribute {
            Attribute::Parameters(types) => types,
            _ => &[],
        }
    }

    pub fn constant(&self) -> Option<&Literal> {
        match &self.attribute {
            Attribute::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Bytes of frame storage the symbol needs; array parameters are references
    ///
    /// Erroneous symbols keep a single word so later lookups still resolve.
    fn storage_size(&self) -> Option<u32> {
        if self.error || (self.kind == SymbolKind::Parameter && self.ty.is_array()) {
            Some(WORD_SIZE)
        } else {
            self.ty.byte_size().map(|size| size.max(WORD_SIZE))
        }
    }
}

/// An ordered collection of symbols declared at one nesting level
#[derive(Debug, Clone)]
pub struct Scope {
    pub level: usize,
    /// Node that opened the scope
    pub owner: NodeId,
    entries: Vec<SymbolEntry>,
}

impl Scope {
    pub fn new(level: usize, owner: NodeId) -> Self {
        Self {
            level,
            owner,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn lookup_local(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Render the scope as a fixed-width table
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(TABLE_WIDTH));
        let _ = writeln!(
            out,
            "{:<33}{:<11}{:<11}{:<17}{:<11}",
            "Name", "Kind", "Level", "Type", "Attribute"
        );
        let _ = writeln!(out, "{}", "-".repeat(TABLE_WIDTH));
        for entry in &self.entries {
            let scope = if entry.level == 0 { "(global)" } else { "(local)" };
            let _ = writeln!(
                out,
                "{:<33}{:<11}{}{:<10}{:<17}{:<11}",
                entry.name,
                entry.kind.as_str(),
                entry.level,
                scope,
                entry.ty.to_string(),
                entry.attribute.to_string()
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(TABLE_WIDTH));
        out
    }
}

/// Why a declaration was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareError {
    /// Name already present in the current scope
    Redeclared,
    /// Name belongs to an active loop induction variable
    ShadowsLoopVariable,
    /// Storage does not fit the enclosing frame; the symbol is still
    /// recorded, marked erroneous
    FrameOverflow,
}

/// Running frame allocation of one function or of the program body
#[derive(Debug, Clone)]
pub struct FrameLayout {
    next_offset: u32,
    params: usize,
}

impl FrameLayout {
    pub fn new() -> Self {
        Self {
            next_offset: SAVED_REGISTER_BYTES,
            params: 0,
        }
    }

    /// Reserve `size` bytes, returning the slot's offset below the frame pointer
    fn allocate(&mut self, size: u32) -> Option<u32> {
        let offset = self.next_offset.checked_add(size).filter(|&o| o <= MAX_FRAME_OFFSET)?;
        self.next_offset = offset;
        Some(offset)
    }

    /// Frame size, rounded up to 16 bytes
    pub fn frame_size(&self) -> u32 {
        let aligned = self.next_offset.div_ceil(16) * 16;
        aligned.max(MIN_FRAME_SIZE)
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Context {
    entry: SymbolEntry,
    frame: FrameLayout,
}

/// Stack of scopes with loop variable and function context tracking
#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
    loop_vars: Vec<(String, usize)>,
    contexts: Vec<Context>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level the next declaration will receive
    pub fn current_level(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    pub fn push_scope(&mut self, owner: NodeId) {
        let level = self.scopes.len();
        log::debug!("push scope {} (owner {:?})", level, owner);
        self.scopes.push(Scope::new(level, owner));
    }

    /// Re-enter a scope recorded by an earlier pass
    pub fn push_recorded(&mut self, scope: Scope) {
        debug_assert_eq!(scope.level, self.scopes.len());
        self.scopes.push(scope);
    }

    /// Pop the innermost scope, releasing loop variables declared in it
    pub fn pop_scope(&mut self) -> Option<Scope> {
        let scope = self.scopes.pop()?;
        self.loop_vars.retain(|(_, level)| *level != scope.level);
        log::debug!("pop scope {}", scope.level);
        Some(scope)
    }

    /// Declare a symbol in the innermost scope
    ///
    /// The level and storage location of `entry` are assigned here.
    pub fn add_symbol(&mut self, mut entry: SymbolEntry) -> Result<(), DeclareError> {
        if self.loop_vars.iter().any(|(name, _)| *name == entry.name) {
            return Err(DeclareError::ShadowsLoopVariable);
        }

        let level = self.current_level();
        let Some(scope) = self.scopes.last_mut() else {
            return Err(DeclareError::Redeclared);
        };
        if scope.lookup_local(&entry.name).is_some() {
            return Err(DeclareError::Redeclared);
        }

        let mut overflow = false;
        entry.level = level;
        entry.location = match entry.kind {
            SymbolKind::Program | SymbolKind::Function => Location::None,
            _ if level == 0 => Location::Global(entry.name.clone()),
            kind => match self.contexts.last_mut() {
                Some(context) => {
                    let slot = entry.storage_size().and_then(|size| context.frame.allocate(size));
                    match slot {
                        Some(offset) if kind == SymbolKind::Parameter => {
                            let index = context.frame.params;
                            context.frame.params += 1;
                            Location::Param { offset, index }
                        }
                        Some(offset) => Location::Frame { offset },
                        None => {
                            overflow = true;
                            Location::None
                        }
                    }
                }
                None => Location::None,
            },
        };
        entry.error |= overflow;

        if entry.kind == SymbolKind::LoopVar {
            self.loop_vars.push((entry.name.clone(), level));
        }
        scope.entries.push(entry);
        if overflow {
            return Err(DeclareError::FrameOverflow);
        }
        Ok(())
    }

    /// Find the innermost visible declaration of `name`
    pub fn get_symbol(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup_local(name))
    }

    pub fn is_active_loop_var(&self, name: &str) -> bool {
        self.loop_vars.iter().any(|(n, _)| n == name)
    }

    /// Nearest enclosing function or program symbol
    pub fn get_context(&self) -> Option<&SymbolEntry> {
        self.contexts.last().map(|c| &c.entry)
    }

    pub fn push_context(&mut self, entry: SymbolEntry) {
        self.contexts.push(Context {
            entry,
            frame: FrameLayout::new(),
        });
    }

    /// Leave the current function, returning its final frame layout
    pub fn pop_context(&mut self) -> Option<FrameLayout> {
        self.contexts.pop().map(|c| c.frame)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

/// Scopes and frame sizes recorded by the analyzer, keyed by owning node
#[derive(Debug, Default)]
pub struct SymbolTables {
    scopes: HashMap<NodeId, Scope>,
    frames: HashMap<NodeId, u32>,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scope(&mut self, scope: Scope) {
        self.scopes.insert(scope.owner, scope);
    }

    pub fn record_frame(&mut self, owner: NodeId, frame_size: u32) {
        self.frames.insert(owner, frame_size);
    }

    pub fn scope(&self, owner: NodeId) -> Option<&Scope> {
        self.scopes.get(&owner)
    }

    pub fn frame_size(&self, owner: NodeId) -> Option<u32> {
        self.frames.get(&owner).copied()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;

    fn var(name: &str) -> SymbolEntry {
        SymbolEntry::new(name, SymbolKind::Variable, PType::integer(), NodeId(0))
    }

    fn manager() -> ScopeManager {
        let mut scopes = ScopeManager::new();
        scopes.push_scope(NodeId(0));
        scopes
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut scopes = manager();
        assert_eq!(scopes.add_symbol(var("a")), Ok(()));
        assert_eq!(scopes.add_symbol(var("a")), Err(DeclareError::Redeclared));
    }

    #[test]
    fn test_shadowing_in_inner_scope_succeeds() {
        let mut scopes = manager();
        scopes.add_symbol(var("a")).unwrap();
        scopes.push_scope(NodeId(1));
        let real = SymbolEntry::new("a", SymbolKind::Variable, PType::real(), NodeId(2));
        assert_eq!(scopes.add_symbol(real), Ok(()));

        let found = scopes.get_symbol("a").unwrap();
        assert_eq!(found.level, 1);
        assert_eq!(found.ty, PType::real());

        scopes.pop_scope();
        let found = scopes.get_symbol("a").unwrap();
        assert_eq!(found.level, 0);
        assert_eq!(found.ty, PType::integer());
    }

    #[test]
    fn test_loop_variable_cannot_be_shadowed_while_active() {
        let mut scopes = manager();
        scopes.push_scope(NodeId(1));
        let loop_var = SymbolEntry::new("i", SymbolKind::LoopVar, PType::integer(), NodeId(2));
        scopes.add_symbol(loop_var).unwrap();

        scopes.push_scope(NodeId(3));
        assert_eq!(
            scopes.add_symbol(var("i")),
            Err(DeclareError::ShadowsLoopVariable)
        );
        scopes.push_scope(NodeId(4));
        assert_eq!(
            scopes.add_symbol(var("i")),
            Err(DeclareError::ShadowsLoopVariable)
        );
        scopes.pop_scope();
        scopes.pop_scope();
        scopes.pop_scope();

        assert!(!scopes.is_active_loop_var("i"));
        scopes.push_scope(NodeId(5));
        assert_eq!(scopes.add_symbol(var("i")), Ok(()));
    }

    #[test]
    fn test_undeclared_lookup() {
        let scopes = manager();
        assert!(scopes.get_symbol("missing").is_none());
    }

    #[test]
    fn test_locations() {
        let mut scopes = manager();
        scopes.add_symbol(var("g")).unwrap();
        assert_eq!(
            scopes.get_symbol("g").unwrap().location,
            Location::Global("g".to_string())
        );

        let func = SymbolEntry::new("f", SymbolKind::Function, PType::void(), NodeId(1));
        scopes.add_symbol(func.clone()).unwrap();
        scopes.push_context(func);
        scopes.push_scope(NodeId(1));

        let matrix = PType::array(PrimitiveType::Integer, vec![2, 3]);
        let param = SymbolEntry::new("p", SymbolKind::Parameter, matrix.clone(), NodeId(2));
        scopes.add_symbol(param).unwrap();
        let local = SymbolEntry::new("m", SymbolKind::Variable, matrix, NodeId(3));
        scopes.add_symbol(local).unwrap();
        scopes.add_symbol(var("x")).unwrap();

        assert_eq!(
            scopes.get_symbol("p").unwrap().location,
            Location::Param { offset: 12, index: 0 }
        );
        assert_eq!(
            scopes.get_symbol("m").unwrap().location,
            Location::Frame { offset: 36 }
        );
        assert_eq!(
            scopes.get_symbol("x").unwrap().location,
            Location::Frame { offset: 40 }
        );
        assert_eq!(scopes.get_context().unwrap().name, "f");

        scopes.pop_scope();
        let frame = scopes.pop_context().unwrap();
        assert_eq!(frame.frame_size(), MIN_FRAME_SIZE);
    }

    #[test]
    fn test_large_frame_is_aligned() {
        let mut frame = FrameLayout::new();
        assert_eq!(frame.allocate(200), Some(208));
        assert_eq!(frame.frame_size(), 208);
    }

    #[test]
    fn test_frame_overflow_keeps_symbol() {
        let mut scopes = ScopeManager::new();
        scopes.push_scope(NodeId(0));
        let func = SymbolEntry::new("f", SymbolKind::Function, PType::void(), NodeId(1));
        scopes.add_symbol(func.clone()).unwrap();
        scopes.push_scope(NodeId(1));
        scopes.push_context(func);

        let half = PType::array(PrimitiveType::Integer, vec![300_000_000]);
        scopes
            .add_symbol(SymbolEntry::new("a", SymbolKind::Variable, half.clone(), NodeId(2)))
            .unwrap();
        let result = scopes.add_symbol(SymbolEntry::new("b", SymbolKind::Variable, half, NodeId(3)));
        assert_eq!(result, Err(DeclareError::FrameOverflow));

        let b = scopes.get_symbol("b").unwrap();
        assert!(b.error);
        assert_eq!(b.location, Location::None);
        // the failed slot is not reserved
        let frame = scopes.pop_context().unwrap();
        assert_eq!(frame.frame_size(), 1_200_000_016);
    }

    #[test]
    fn test_dump_layout() {
        let mut scopes = manager();
        let func = SymbolEntry::new("func", SymbolKind::Function, PType::boolean(), NodeId(1))
            .with_attribute(Attribute::Parameters(vec![
                PType::integer(),
                PType::array(PrimitiveType::Real, vec![2, 3]),
            ]));
        scopes.add_symbol(func).unwrap();
        let table = scopes.pop_scope().unwrap().dump();
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines[0], "=".repeat(110));
        assert!(lines[1].starts_with(&format!("{:<33}{:<11}Level", "Name", "Kind")));
        assert_eq!(
            lines[3].trim_end(),
            format!(
                "{:<33}{:<11}{:<11}{:<17}{}",
                "func", "function", "0(global)", "boolean", "integer, real [2][3]"
            )
        );
        assert_eq!(lines[4], "-".repeat(110));
    }
}

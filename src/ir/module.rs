//! Module, function, basic block and instruction representation.
//!
//! # Architecture
//!
//! A [`Module`] owns a single value arena. Everything that can appear as an
//! operand — globals, constants, formal arguments, instructions — lives in
//! that arena and is addressed by a [`ValueRef`], a cheap `Copy` handle.
//! Handle equality *is* value identity: two operands refer to the same IR
//! value exactly when their `ValueRef`s compare equal. Integer constants are
//! interned so that repeated uses of the same literal share one handle.
//!
//! Functions own their basic blocks; blocks hold an ordered list of
//! instruction handles into the module arena. Control flow edges are encoded
//! in terminator instructions ([`InstrKind::Br`], [`InstrKind::CondBr`],
//! [`InstrKind::Switch`], [`InstrKind::Invoke`]); block predecessors are
//! derived from them on demand.
//!
//! # Mutation
//!
//! The model supports the two mutations the instrumenter needs: declaring
//! external functions ([`Module::ensure_declaration`]) and splicing new call
//! instructions into an existing block ([`Module::insert_instr`]).

use rustc_hash::FxHashMap;

use crate::ir::{DebugLoc, ScopeRef, SourceFile, Type};

/// Handle to a value in a module's arena.
///
/// This is the identity used throughout the analysis: access equality,
/// value-ID assignment and statement registration all compare handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueRef(pub(crate) u32);

impl ValueRef {
    /// The index of this value in the module arena.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle to a function within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub(crate) u32);

impl FuncRef {
    /// The index of this function in the module's function table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle to a basic block, local to its owning function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(pub(crate) u32);

impl BlockRef {
    /// The index of this block in its function.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Integer binary operations. The exact operation is irrelevant to the
/// analysis (all of them are transitive data-flow nodes); the distinction is
/// kept for readable test IR and debugging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
}

/// Comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// The operation performed by an instruction, including its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    /// Stack allocation backing a source-level variable.
    Alloca {
        /// Type of the allocated slot.
        allocated: Type,
        /// Source-level name, for diagnostics only.
        name: String,
    },
    /// Store `value` through the `target` pointer.
    Store {
        /// The value being written.
        value: ValueRef,
        /// The destination pointer.
        target: ValueRef,
    },
    /// Load through a pointer.
    Load {
        /// The pointer being read.
        source: ValueRef,
    },
    /// Direct call.
    Call {
        /// The called function.
        callee: FuncRef,
        /// Actual arguments.
        args: Vec<ValueRef>,
    },
    /// Call that may unwind; control continues at `normal` or `unwind`.
    Invoke {
        /// The called function.
        callee: FuncRef,
        /// Actual arguments.
        args: Vec<ValueRef>,
        /// Block reached on normal return.
        normal: BlockRef,
        /// Block reached when the callee unwinds.
        unwind: BlockRef,
    },
    /// Function return.
    Ret {
        /// The returned value, absent for `void` functions.
        value: Option<ValueRef>,
    },
    /// Unconditional branch.
    Br {
        /// The branch target.
        target: BlockRef,
    },
    /// Two-way conditional branch.
    CondBr {
        /// The branch condition (an `i1` value).
        cond: ValueRef,
        /// Target when the condition is true.
        if_true: BlockRef,
        /// Target when the condition is false.
        if_false: BlockRef,
    },
    /// Multi-way branch over an integer value.
    Switch {
        /// The scrutinee.
        value: ValueRef,
        /// Target when no case matches.
        default: BlockRef,
        /// `(case constant, target)` pairs.
        cases: Vec<(ValueRef, BlockRef)>,
    },
    /// Element-address computation into an aggregate or through a pointer.
    Gep {
        /// The base pointer.
        base: ValueRef,
        /// Index operands, outermost first.
        indices: Vec<ValueRef>,
        /// The aggregate type the indices step through. Struct sources make
        /// this a field selection; everything else is array-like.
        source: Type,
    },
    /// Integer or floating point arithmetic.
    BinOp {
        /// The operation.
        op: BinOp,
        /// Left operand.
        lhs: ValueRef,
        /// Right operand.
        rhs: ValueRef,
    },
    /// Comparison producing an `i1`.
    Cmp {
        /// The predicate.
        op: CmpOp,
        /// Left operand.
        lhs: ValueRef,
        /// Right operand.
        rhs: ValueRef,
    },
    /// Width or representation change of a single operand.
    Cast {
        /// The converted value.
        value: ValueRef,
    },
    /// SSA merge of per-predecessor values.
    Phi {
        /// `(incoming value, predecessor block)` pairs.
        incoming: Vec<(ValueRef, BlockRef)>,
    },
    /// Debug intrinsic associating an allocation with a source variable.
    ///
    /// Carries the location of the variable declaration; the detector uses it
    /// as a location fallback for argument-initializing stores.
    DbgDeclare {
        /// The allocation being described.
        target: ValueRef,
    },
}

impl InstrKind {
    /// Returns `true` for instructions that end a basic block.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstrKind::Ret { .. }
                | InstrKind::Br { .. }
                | InstrKind::CondBr { .. }
                | InstrKind::Switch { .. }
                | InstrKind::Invoke { .. }
        )
    }

    /// All value operands of this instruction, in operand order.
    #[must_use]
    pub fn operands(&self) -> Vec<ValueRef> {
        match self {
            InstrKind::Alloca { .. } => Vec::new(),
            InstrKind::Store { value, target } => vec![*value, *target],
            InstrKind::Load { source } => vec![*source],
            InstrKind::Call { args, .. } | InstrKind::Invoke { args, .. } => args.clone(),
            InstrKind::Ret { value } => value.iter().copied().collect(),
            InstrKind::Br { .. } => Vec::new(),
            InstrKind::CondBr { cond, .. } => vec![*cond],
            InstrKind::Switch { value, cases, .. } => {
                let mut ops = vec![*value];
                ops.extend(cases.iter().map(|(case, _)| *case));
                ops
            }
            InstrKind::Gep { base, indices, .. } => {
                let mut ops = vec![*base];
                ops.extend_from_slice(indices);
                ops
            }
            InstrKind::BinOp { lhs, rhs, .. } | InstrKind::Cmp { lhs, rhs, .. } => {
                vec![*lhs, *rhs]
            }
            InstrKind::Cast { value } => vec![*value],
            InstrKind::Phi { incoming } => incoming.iter().map(|(value, _)| *value).collect(),
            InstrKind::DbgDeclare { target } => vec![*target],
        }
    }

    /// Blocks this instruction transfers control to. Empty for
    /// non-terminators.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockRef> {
        match self {
            InstrKind::Br { target } => vec![*target],
            InstrKind::CondBr {
                if_true, if_false, ..
            } => vec![*if_true, *if_false],
            InstrKind::Switch {
                default, cases, ..
            } => {
                let mut succ = vec![*default];
                succ.extend(cases.iter().map(|(_, target)| *target));
                succ
            }
            InstrKind::Invoke { normal, unwind, .. } => vec![*normal, *unwind],
            _ => Vec::new(),
        }
    }
}

/// An instruction: operation, result type and optional source location.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrData {
    /// The operation and its operands.
    pub kind: InstrKind,
    /// The type of the produced value; [`Type::Void`] when nothing is
    /// produced.
    pub ty: Type,
    /// Source location, absent for synthesized instructions.
    pub loc: Option<DebugLoc>,
}

impl InstrData {
    /// Creates an instruction without a source location.
    #[must_use]
    pub fn new(kind: InstrKind, ty: Type) -> Self {
        Self {
            kind,
            ty,
            loc: None,
        }
    }

    /// Attaches a source location.
    #[must_use]
    pub fn with_loc(mut self, loc: DebugLoc) -> Self {
        self.loc = Some(loc);
        self
    }
}

/// A module-level variable.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalData {
    /// Symbol name.
    pub name: String,
    /// Type of the stored value.
    pub ty: Type,
    /// `true` when the value is immutable for the whole execution. Constant
    /// globals are literals from the analysis point of view, not variables.
    pub constant: bool,
}

/// A value stored in the module arena.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    /// A module-level variable.
    Global(GlobalData),
    /// An integer constant. The width lives in `ty`; the payload is the
    /// sign-extended bit pattern.
    ConstInt {
        /// The integer type.
        ty: Type,
        /// The constant value.
        value: i64,
    },
    /// A floating point constant.
    ConstFloat {
        /// [`Type::Float`] or [`Type::Double`].
        ty: Type,
        /// The constant value.
        value: f64,
    },
    /// A constant element-address expression over a global.
    ConstGep {
        /// The base value the address is computed from.
        base: ValueRef,
        /// Whether every index is statically within bounds. Out-of-bounds
        /// constant address arithmetic is not treated as a variable access.
        in_bounds: bool,
    },
    /// A formal argument of a function.
    Argument {
        /// The owning function.
        func: FuncRef,
        /// Zero-based position.
        index: u32,
        /// Parameter name, for diagnostics.
        name: String,
        /// Parameter type.
        ty: Type,
    },
    /// An instruction.
    Instr(InstrData),
}

/// A basic block: a straight-line run of instructions ending in a terminator.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    name: String,
    instrs: Vec<ValueRef>,
}

impl BasicBlock {
    /// The block label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instruction handles in program order.
    #[must_use]
    pub fn instructions(&self) -> &[ValueRef] {
        &self.instrs
    }
}

/// A function: signature, formal arguments and basic blocks.
///
/// A function without blocks is a declaration; declarations (and intrinsics)
/// can be called but have no body to analyze.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    ret: Type,
    params: Vec<ValueRef>,
    blocks: Vec<BasicBlock>,
    intrinsic: bool,
}

impl Function {
    /// The symbol name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The return type.
    #[must_use]
    pub fn return_type(&self) -> &Type {
        &self.ret
    }

    /// Formal argument values, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ValueRef] {
        &self.params
    }

    /// `true` when the function has no body.
    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// `true` for compiler/runtime intrinsics, which never form statements.
    #[must_use]
    pub fn is_intrinsic(&self) -> bool {
        self.intrinsic
    }

    /// Iterates the function's basic blocks in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockRef, &BasicBlock)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| (BlockRef(idx as u32), block))
    }

    /// Returns a block by handle.
    #[must_use]
    pub fn block(&self, block: BlockRef) -> &BasicBlock {
        &self.blocks[block.index()]
    }

    /// Number of basic blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// A compilation unit: value arena, functions and debug file table.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    values: Vec<ValueData>,
    functions: Vec<Function>,
    files: Vec<SourceFile>,
    int_consts: FxHashMap<(u32, i64), ValueRef>,
}

impl Module {
    /// Creates an empty module. The name is conventionally the path of the
    /// primary source file the module was compiled from.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ---- debug file table ----

    /// Registers a source file and returns its scope handle.
    pub fn add_file(
        &mut self,
        directory: impl Into<String>,
        filename: impl Into<String>,
    ) -> ScopeRef {
        self.files.push(SourceFile::new(directory, filename));
        ScopeRef((self.files.len() - 1) as u32)
    }

    /// Returns the source file behind a scope handle.
    #[must_use]
    pub fn file(&self, scope: ScopeRef) -> &SourceFile {
        &self.files[scope.index()]
    }

    // ---- values ----

    fn push_value(&mut self, data: ValueData) -> ValueRef {
        self.values.push(data);
        ValueRef((self.values.len() - 1) as u32)
    }

    /// Returns the value behind a handle.
    #[must_use]
    pub fn value(&self, value: ValueRef) -> &ValueData {
        &self.values[value.index()]
    }

    /// Returns the instruction data behind a handle, or `None` when the
    /// handle does not name an instruction.
    #[must_use]
    pub fn instr(&self, value: ValueRef) -> Option<&InstrData> {
        match self.value(value) {
            ValueData::Instr(data) => Some(data),
            _ => None,
        }
    }

    /// `true` when the handle names a formal argument.
    #[must_use]
    pub fn is_argument(&self, value: ValueRef) -> bool {
        matches!(self.value(value), ValueData::Argument { .. })
    }

    /// The type of any value.
    #[must_use]
    pub fn type_of(&self, value: ValueRef) -> &Type {
        match self.value(value) {
            ValueData::Global(global) => &global.ty,
            ValueData::ConstInt { ty, .. } | ValueData::ConstFloat { ty, .. } => ty,
            // Address of an element inside the base object; the precise
            // pointee type is irrelevant to the analysis.
            ValueData::ConstGep { base, .. } => self.type_of(*base),
            ValueData::Argument { ty, .. } => ty,
            ValueData::Instr(instr) => &instr.ty,
        }
    }

    /// Interns an integer constant of the given bit width.
    pub fn const_int(&mut self, bits: u32, value: i64) -> ValueRef {
        if let Some(&existing) = self.int_consts.get(&(bits, value)) {
            return existing;
        }
        let handle = self.push_value(ValueData::ConstInt {
            ty: Type::Int(bits),
            value,
        });
        self.int_consts.insert((bits, value), handle);
        handle
    }

    /// Creates a floating point constant.
    pub fn const_float(&mut self, ty: Type, value: f64) -> ValueRef {
        self.push_value(ValueData::ConstFloat { ty, value })
    }

    /// Creates a constant element-address expression over `base`.
    pub fn const_gep(&mut self, base: ValueRef, in_bounds: bool) -> ValueRef {
        self.push_value(ValueData::ConstGep { base, in_bounds })
    }

    /// Adds a module-level variable.
    pub fn add_global(&mut self, name: impl Into<String>, ty: Type, constant: bool) -> ValueRef {
        self.push_value(ValueData::Global(GlobalData {
            name: name.into(),
            ty,
            constant,
        }))
    }

    // ---- functions ----

    fn add_function_raw(
        &mut self,
        name: String,
        ret: Type,
        params: Vec<(String, Type)>,
        intrinsic: bool,
    ) -> FuncRef {
        let func = FuncRef(self.functions.len() as u32);
        let param_values = params
            .into_iter()
            .enumerate()
            .map(|(index, (name, ty))| {
                self.push_value(ValueData::Argument {
                    func,
                    index: index as u32,
                    name,
                    ty,
                })
            })
            .collect();
        self.functions.push(Function {
            name,
            ret,
            params: param_values,
            blocks: Vec::new(),
            intrinsic,
        });
        func
    }

    /// Adds a function definition shell. Blocks are attached through
    /// [`Module::add_block`] (usually via
    /// [`FunctionBuilder`](crate::ir::FunctionBuilder)).
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        ret: Type,
        params: &[(&str, Type)],
    ) -> FuncRef {
        let params = params
            .iter()
            .map(|(name, ty)| ((*name).to_string(), ty.clone()))
            .collect();
        self.add_function_raw(name.into(), ret, params, false)
    }

    /// Adds an external function declaration.
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        ret: Type,
        params: &[Type],
    ) -> FuncRef {
        let params = params.iter().map(|ty| (String::new(), ty.clone())).collect();
        self.add_function_raw(name.into(), ret, params, false)
    }

    /// Adds an intrinsic declaration. Calls to intrinsics are ignored by the
    /// statement detector.
    pub fn declare_intrinsic(
        &mut self,
        name: impl Into<String>,
        ret: Type,
        params: &[Type],
    ) -> FuncRef {
        let params = params.iter().map(|ty| (String::new(), ty.clone())).collect();
        self.add_function_raw(name.into(), ret, params, true)
    }

    /// Looks up a declaration by name, inserting it when absent. The
    /// instrumenter uses this to reference the runtime hooks.
    pub fn ensure_declaration(&mut self, name: &str, ret: Type, params: &[Type]) -> FuncRef {
        if let Some(existing) = self.function_by_name(name) {
            return existing;
        }
        self.declare_function(name, ret, params)
    }

    /// Finds a function by symbol name.
    #[must_use]
    pub fn function_by_name(&self, name: &str) -> Option<FuncRef> {
        self.functions
            .iter()
            .position(|func| func.name == name)
            .map(|idx| FuncRef(idx as u32))
    }

    /// Returns a function by handle.
    #[must_use]
    pub fn function(&self, func: FuncRef) -> &Function {
        &self.functions[func.index()]
    }

    /// Iterates all functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (FuncRef, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(idx, func)| (FuncRef(idx as u32), func))
    }

    /// The formal argument of `func` at `index`.
    ///
    /// # Panics
    ///
    /// Panics when the index is out of range.
    #[must_use]
    pub fn argument(&self, func: FuncRef, index: usize) -> ValueRef {
        self.functions[func.index()].params[index]
    }

    // ---- blocks and instructions ----

    /// Appends a new basic block to a function.
    pub fn add_block(&mut self, func: FuncRef, name: impl Into<String>) -> BlockRef {
        let blocks = &mut self.functions[func.index()].blocks;
        blocks.push(BasicBlock {
            name: name.into(),
            instrs: Vec::new(),
        });
        BlockRef((blocks.len() - 1) as u32)
    }

    /// Appends an instruction to a block and returns its value handle.
    pub fn push_instr(&mut self, func: FuncRef, block: BlockRef, instr: InstrData) -> ValueRef {
        let handle = self.push_value(ValueData::Instr(instr));
        self.functions[func.index()].blocks[block.index()]
            .instrs
            .push(handle);
        handle
    }

    /// Inserts an instruction at a position within a block and returns its
    /// value handle.
    ///
    /// # Panics
    ///
    /// Panics when `index` is past the end of the block.
    pub fn insert_instr(
        &mut self,
        func: FuncRef,
        block: BlockRef,
        index: usize,
        instr: InstrData,
    ) -> ValueRef {
        let handle = self.push_value(ValueData::Instr(instr));
        self.functions[func.index()].blocks[block.index()]
            .instrs
            .insert(index, handle);
        handle
    }

    /// Finds the block and in-block index of an instruction within `func`.
    #[must_use]
    pub fn position(&self, func: FuncRef, instr: ValueRef) -> Option<(BlockRef, usize)> {
        for (block_ref, block) in self.functions[func.index()].blocks() {
            if let Some(idx) = block.instrs.iter().position(|&handle| handle == instr) {
                return Some((block_ref, idx));
            }
        }
        None
    }

    /// Control-flow successors of a block, read off its terminator.
    #[must_use]
    pub fn block_successors(&self, func: FuncRef, block: BlockRef) -> Vec<BlockRef> {
        self.functions[func.index()].blocks[block.index()]
            .instrs
            .last()
            .and_then(|&handle| self.instr(handle))
            .map(|instr| instr.kind.successors())
            .unwrap_or_default()
    }

    /// Predecessor lists for every block of `func`, indexed by block.
    #[must_use]
    pub fn block_predecessors(&self, func: FuncRef) -> Vec<Vec<BlockRef>> {
        let count = self.functions[func.index()].block_count();
        let mut preds = vec![Vec::new(); count];
        for idx in 0..count {
            let block = BlockRef(idx as u32);
            for succ in self.block_successors(func, block) {
                preds[succ.index()].push(block);
            }
        }
        preds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_int_interning() {
        let mut module = Module::new("test");
        let a = module.const_int(32, 7);
        let b = module.const_int(32, 7);
        let c = module.const_int(64, 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ensure_declaration_is_idempotent() {
        let mut module = Module::new("test");
        let first = module.ensure_declaration("hook", Type::Void, &[Type::Int(64)]);
        let second = module.ensure_declaration("hook", Type::Void, &[Type::Int(64)]);
        assert_eq!(first, second);
        assert!(module.function(first).is_declaration());
    }

    #[test]
    fn test_block_edges() {
        let mut module = Module::new("test");
        let func = module.add_function("f", Type::Void, &[]);
        let entry = module.add_block(func, "entry");
        let left = module.add_block(func, "left");
        let right = module.add_block(func, "right");

        let cond = module.const_int(1, 1);
        module.push_instr(
            func,
            entry,
            InstrData::new(
                InstrKind::CondBr {
                    cond,
                    if_true: left,
                    if_false: right,
                },
                Type::Void,
            ),
        );

        assert_eq!(module.block_successors(func, entry), vec![left, right]);
        let preds = module.block_predecessors(func);
        assert_eq!(preds[left.index()], vec![entry]);
        assert_eq!(preds[right.index()], vec![entry]);
        assert!(preds[entry.index()].is_empty());
    }

    #[test]
    fn test_position_lookup() {
        let mut module = Module::new("test");
        let func = module.add_function("f", Type::Void, &[]);
        let entry = module.add_block(func, "entry");
        let slot = module.push_instr(
            func,
            entry,
            InstrData::new(
                InstrKind::Alloca {
                    allocated: Type::Int(32),
                    name: "x".into(),
                },
                Type::Int(32).pointer_to(),
            ),
        );
        let ret = module.push_instr(
            func,
            entry,
            InstrData::new(InstrKind::Ret { value: None }, Type::Void),
        );

        assert_eq!(module.position(func, slot), Some((entry, 0)));
        assert_eq!(module.position(func, ret), Some((entry, 1)));
    }
}

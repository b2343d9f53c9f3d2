//! The IR data model.
//!
//! A [`Module`] owns an ordered list of function definitions, an ordered map
//! of globals, and the external declarations user code links against. Each
//! [`Function`] owns its basic blocks; each [`Block`] owns its instructions
//! and ends in exactly one [`Terminator`]. Instruction results are values in
//! static single assignment form: every [`ValueId`] is defined by exactly
//! one instruction, and operands refer to values, incoming function
//! arguments, or globals.
//!
//! The `Display` rendering is the hand-off format for the external code
//! generator and what the driver writes for `--emit-ir`.

use std::fmt;

use indexmap::IndexMap;
use wabbitc_par::Ty;
use wabbitc_util::{Idx, IndexVec};

/// IR-level primitive type. Pointers are opaque; a load names its result
/// type explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrType {
    /// 1-bit integer (bool)
    I1,
    /// 8-bit integer (char)
    I8,
    /// 32-bit signed integer
    I32,
    /// 32-bit IEEE-754 float
    F32,
    /// Opaque pointer, produced by `alloca` and global handles
    Ptr,
    /// Absence of a value (external `print_char` return type, `store`)
    Void,
}

impl From<Ty> for IrType {
    fn from(ty: Ty) -> IrType {
        match ty {
            Ty::Int => IrType::I32,
            Ty::Float => IrType::F32,
            Ty::Char => IrType::I8,
            Ty::Bool => IrType::I1,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IrType::I1 => "i1",
            IrType::I8 => "i8",
            IrType::I32 => "i32",
            IrType::F32 => "f32",
            IrType::Ptr => "ptr",
            IrType::Void => "void",
        };
        f.write_str(s)
    }
}

/// A compile-time constant of one of the primitive types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constant {
    I32(i32),
    F32(f32),
    I8(u8),
    I1(bool),
}

impl Constant {
    pub fn ty(self) -> IrType {
        match self {
            Constant::I32(_) => IrType::I32,
            Constant::F32(_) => IrType::F32,
            Constant::I8(_) => IrType::I8,
            Constant::I1(_) => IrType::I1,
        }
    }

    /// The zero value of a primitive type, used to initialize slots whose
    /// declaration carries no initializer.
    pub fn zero(ty: Ty) -> Constant {
        match ty {
            Ty::Int => Constant::I32(0),
            Ty::Float => Constant::F32(0.0),
            Ty::Char => Constant::I8(0),
            Ty::Bool => Constant::I1(false),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::I32(v) => write!(f, "{}", v),
            Constant::F32(v) => write!(f, "{:?}", v),
            Constant::I8(v) => write!(f, "{}", v),
            Constant::I1(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);

        impl Idx for $name {
            fn from_usize(idx: usize) -> Self {
                $name(idx as u32)
            }
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id! {
    /// An instruction result, unique within its function.
    ValueId
}
define_id! {
    /// A basic block within a function.
    BlockId
}
define_id! {
    /// A function definition within the module.
    FuncId
}
define_id! {
    /// A global variable within the module.
    GlobalId
}
define_id! {
    /// An external declaration within the module.
    ExternId
}

/// An instruction operand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    /// The result of an instruction in the same function.
    Value(ValueId),
    /// An incoming function argument, by position.
    Arg(u32),
    /// A handle to a module global; reads go through `load`.
    Global(GlobalId),
}

/// Signed integer comparison predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        };
        f.write_str(s)
    }
}

/// Ordered float comparison predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl fmt::Display for FloatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        };
        f.write_str(s)
    }
}

/// Integer arithmetic. There is no integer division instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntOp {
    Add,
    Sub,
    Mul,
}

impl fmt::Display for IntOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntOp::Add => "add",
            IntOp::Sub => "sub",
            IntOp::Mul => "mul",
        };
        f.write_str(s)
    }
}

/// Float arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatOp {
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl fmt::Display for FloatOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FloatOp::FAdd => "fadd",
            FloatOp::FSub => "fsub",
            FloatOp::FMul => "fmul",
            FloatOp::FDiv => "fdiv",
        };
        f.write_str(s)
    }
}

/// Call target: a function defined in the module or an external.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Callee {
    Func(FuncId),
    Extern(ExternId),
}

/// One instruction. Every instruction defines a value; instructions without
/// a meaningful result (`store`, void calls) define a `Void`-typed one.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// Materialize a constant
    Const(Constant),
    /// Reserve a stack slot, yielding a pointer to it
    Alloca(IrType),
    /// Read through a pointer
    Load { ptr: Operand, ty: IrType },
    /// Write through a pointer
    Store { value: Operand, ptr: Operand },
    /// Integer arithmetic
    IntBin {
        op: IntOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// Float arithmetic
    FloatBin {
        op: FloatOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// Signed integer comparison, yields i1
    ICmp {
        pred: IntPredicate,
        lhs: Operand,
        rhs: Operand,
    },
    /// Ordered float comparison, yields i1
    FCmp {
        pred: FloatPredicate,
        lhs: Operand,
        rhs: Operand,
    },
    /// Function call
    Call { callee: Callee, args: Vec<Operand> },
}

/// Block terminator. Every block ends in exactly one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Terminator {
    /// Unconditional branch
    Br(BlockId),
    /// Two-way conditional branch on an i1 operand
    CondBr {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Return a value to the caller
    Ret(Operand),
}

/// A straight-line instruction sequence with a label and one terminator.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub label: String,
    pub instrs: Vec<(ValueId, Instr)>,
    /// `None` only while the block is under construction.
    pub terminator: Option<Terminator>,
}

/// A function definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub blocks: IndexVec<BlockId, Block>,
    /// Result type of every value defined in this function.
    pub values: IndexVec<ValueId, IrType>,
}

impl Function {
    /// All instructions of the function in block order. Handy for tests and
    /// simple analyses.
    pub fn instructions(&self) -> impl Iterator<Item = &(ValueId, Instr)> {
        self.blocks.iter().flat_map(|block| block.instrs.iter())
    }
}

/// An external function declaration, resolved by the host loader.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternFn {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
}

/// A module global. All globals have internal linkage.
#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    pub init: Constant,
    pub constant: bool,
}

/// The compilation artifact handed to the external code generator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub externs: Vec<ExternFn>,
    pub globals: IndexMap<String, Global>,
    pub functions: IndexVec<FuncId, Function>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            externs: Vec::new(),
            globals: IndexMap::new(),
            functions: IndexVec::new(),
        }
    }

    pub fn declare_extern(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret: IrType,
    ) -> ExternId {
        self.externs.push(ExternFn {
            name: name.into(),
            params,
            ret,
        });
        ExternId((self.externs.len() - 1) as u32)
    }

    pub fn define_global(&mut self, global: Global) -> GlobalId {
        let (index, _) = self.globals.insert_full(global.name.clone(), global);
        GlobalId(index as u32)
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        let (_, global) = self
            .globals
            .get_index(id.index())
            .expect("global id out of range");
        global
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|func| func.name == name)
    }
}

// =============================================================================
// Textual rendering
// =============================================================================

impl Module {
    fn write_operand(&self, f: &mut fmt::Formatter<'_>, op: Operand) -> fmt::Result {
        match op {
            Operand::Value(v) => write!(f, "%{}", v.0),
            Operand::Arg(i) => write!(f, "%arg{}", i),
            Operand::Global(g) => write!(f, "@{}", self.global(g).name),
        }
    }

    fn write_callee(&self, f: &mut fmt::Formatter<'_>, callee: Callee) -> fmt::Result {
        match callee {
            Callee::Func(id) => write!(f, "@{}", self.functions[id].name),
            Callee::Extern(id) => write!(f, "@{}", self.externs[id.index()].name),
        }
    }

    fn write_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        func: &Function,
        id: ValueId,
        instr: &Instr,
    ) -> fmt::Result {
        if func.values[id] != IrType::Void {
            write!(f, "%{} = ", id.0)?;
        }
        match instr {
            Instr::Const(c) => write!(f, "const {} {}", c.ty(), c),
            Instr::Alloca(ty) => write!(f, "alloca {}", ty),
            Instr::Load { ptr, ty } => {
                write!(f, "load {}, ", ty)?;
                self.write_operand(f, *ptr)
            },
            Instr::Store { value, ptr } => {
                write!(f, "store ")?;
                self.write_operand(f, *value)?;
                write!(f, ", ")?;
                self.write_operand(f, *ptr)
            },
            Instr::IntBin { op, lhs, rhs } => {
                write!(f, "{} {} ", op, func.values[id])?;
                self.write_operand(f, *lhs)?;
                write!(f, ", ")?;
                self.write_operand(f, *rhs)
            },
            Instr::FloatBin { op, lhs, rhs } => {
                write!(f, "{} {} ", op, func.values[id])?;
                self.write_operand(f, *lhs)?;
                write!(f, ", ")?;
                self.write_operand(f, *rhs)
            },
            Instr::ICmp { pred, lhs, rhs } => {
                write!(f, "icmp {} ", pred)?;
                self.write_operand(f, *lhs)?;
                write!(f, ", ")?;
                self.write_operand(f, *rhs)
            },
            Instr::FCmp { pred, lhs, rhs } => {
                write!(f, "fcmp {} ", pred)?;
                self.write_operand(f, *lhs)?;
                write!(f, ", ")?;
                self.write_operand(f, *rhs)
            },
            Instr::Call { callee, args } => {
                write!(f, "call ")?;
                self.write_callee(f, *callee)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.write_operand(f, *arg)?;
                }
                write!(f, ")")
            },
        }
    }

    fn write_terminator(
        &self,
        f: &mut fmt::Formatter<'_>,
        func: &Function,
        term: Terminator,
    ) -> fmt::Result {
        match term {
            Terminator::Br(target) => write!(f, "br {}", func.blocks[target].label),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => {
                write!(f, "cbr ")?;
                self.write_operand(f, cond)?;
                write!(
                    f,
                    ", {}, {}",
                    func.blocks[then_block].label, func.blocks[else_block].label
                )
            },
            Terminator::Ret(value) => {
                write!(f, "ret ")?;
                self.write_operand(f, value)
            },
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ext in &self.externs {
            write!(f, "declare {} @{}(", ext.ret, ext.name)?;
            for (i, param) in ext.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param)?;
            }
            writeln!(f, ")")?;
        }

        for global in self.globals.values() {
            let kind = if global.constant { "constant" } else { "global" };
            writeln!(
                f,
                "@{} = internal {} {} {}",
                global.name, kind, global.ty, global.init
            )?;
        }

        for func in self.functions.iter() {
            writeln!(f)?;
            write!(f, "define {} @{}(", func.ret, func.name)?;
            for (i, param) in func.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} %arg{}", param, i)?;
            }
            writeln!(f, ") {{")?;

            for block in func.blocks.iter() {
                writeln!(f, "{}:", block.label)?;
                for (id, instr) in &block.instrs {
                    write!(f, "  ")?;
                    self.write_instr(f, func, *id, instr)?;
                    writeln!(f)?;
                }
                if let Some(term) = block.terminator {
                    write!(f, "  ")?;
                    self.write_terminator(f, func, term)?;
                    writeln!(f)?;
                }
            }

            writeln!(f, "}}")?;
        }

        Ok(())
    }
}

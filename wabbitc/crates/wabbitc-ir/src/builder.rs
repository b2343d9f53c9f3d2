//! Function builder.
//!
//! Keeps a function under construction together with the block the next
//! instruction lands in. The lowerer creates blocks up front, positions the
//! builder, and emits; the builder hands out value ids and records result
//! types.

use crate::ir::*;
use wabbitc_util::IndexVec;

/// Builder for one [`Function`].
pub struct FuncBuilder {
    func: Function,
    current: BlockId,
}

impl FuncBuilder {
    /// Creates a function with an `entry` block and positions the builder
    /// there.
    pub fn new(name: impl Into<String>, params: Vec<IrType>, ret: IrType) -> Self {
        let mut blocks = IndexVec::new();
        let entry = blocks.push(Block {
            label: "entry".to_string(),
            instrs: Vec::new(),
            terminator: None,
        });

        Self {
            func: Function {
                name: name.into(),
                params,
                ret,
                blocks,
                values: IndexVec::new(),
            },
            current: entry,
        }
    }

    /// Appends a fresh, empty block with the given label.
    pub fn create_block(&mut self, label: impl Into<String>) -> BlockId {
        self.func.blocks.push(Block {
            label: label.into(),
            instrs: Vec::new(),
            terminator: None,
        })
    }

    /// Moves the insertion point to `block`.
    pub fn position_at(&mut self, block: BlockId) {
        self.current = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// True once the current block has its terminator; nothing more may be
    /// emitted into it.
    pub fn is_terminated(&self) -> bool {
        self.func.blocks[self.current].terminator.is_some()
    }

    /// Emits an instruction into the current block, recording `ty` as its
    /// result type, and returns an operand naming the result.
    pub fn emit(&mut self, instr: Instr, ty: IrType) -> Operand {
        debug_assert!(!self.is_terminated(), "emit into terminated block");
        let id = self.func.values.push(ty);
        self.func.blocks[self.current].instrs.push((id, instr));
        Operand::Value(id)
    }

    /// Emits a constant materialization.
    pub fn emit_const(&mut self, constant: Constant) -> Operand {
        let ty = constant.ty();
        self.emit(Instr::Const(constant), ty)
    }

    /// Emits a store; the result is void and unnamed.
    pub fn emit_store(&mut self, value: Operand, ptr: Operand) {
        self.emit(Instr::Store { value, ptr }, IrType::Void);
    }

    /// Seals the current block. A block that already has a terminator keeps
    /// it; control flow never falls through a terminator.
    pub fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.func.blocks[self.current];
        if block.terminator.is_none() {
            block.terminator = Some(terminator);
        }
    }

    /// Finishes the function. Any block still open receives a `ret` of the
    /// zero value of the return type; the checker guarantees such blocks
    /// are unreachable.
    pub fn finish(mut self, zero: Constant) -> Function {
        let open: Vec<BlockId> = self
            .func
            .blocks
            .iter_enumerated()
            .filter(|(_, block)| block.terminator.is_none())
            .map(|(id, _)| id)
            .collect();

        for block in open {
            self.position_at(block);
            let value = self.emit_const(zero);
            self.terminate(Terminator::Ret(value));
        }

        self.func
    }
}

//! Method IR and its builder.
//!
//! A [`MethodBuilder`] is exclusively owned by the single task compiling one
//! method. [`MethodBuilder::finish`] verifies the SSA completeness
//! invariants and seals the result into an immutable [`Method`], the sole
//! artifact handed to downstream stages.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::value::{PhiOperands, Value, ValueData};
use crate::{Block, BlockId, Location, TypeId, ValueId};

/// Invariant violation detected while finishing a method.
///
/// These indicate a defect in an earlier stage (malformed control flow from
/// the decoder, or a bug in SSA construction), not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodError {
    /// A block reachable from the entry was never sealed.
    UnsealedBlock(BlockId),
    /// An incomplete phi placeholder survived to the end of generation.
    IncompletePhi(ValueId),
    /// A phi has an unbound (NONE) operand.
    UnboundPhiOperand(ValueId),
    /// A phi's operand list does not cover its block's predecessors.
    PhiOperandMismatch { phi: ValueId, block: BlockId },
    /// A reachable block does not end in a terminator.
    MissingTerminator(BlockId),
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodError::UnsealedBlock(block) => {
                write!(f, "block {block:?} is reachable but was never sealed")
            }
            MethodError::IncompletePhi(value) => {
                write!(f, "incomplete phi {value:?} survived method generation")
            }
            MethodError::UnboundPhiOperand(value) => {
                write!(f, "phi {value:?} has an unbound operand")
            }
            MethodError::PhiOperandMismatch { phi, block } => {
                write!(
                    f,
                    "phi {phi:?} does not cover all predecessors of {block:?}"
                )
            }
            MethodError::MissingTerminator(block) => {
                write!(f, "block {block:?} has no terminator")
            }
        }
    }
}

impl std::error::Error for MethodError {}

/// An immutable, fully constructed method in SSA form.
pub struct Method {
    name: String,
    entry: BlockId,
    blocks: Vec<Block>,
    values: Vec<Value>,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.raw() as usize]
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the values of one block in order.
    pub fn values_in(&self, id: BlockId) -> impl Iterator<Item = (ValueId, &Value)> + '_ {
        self.block(id)
            .instrs
            .iter()
            .map(move |&vid| (vid, self.value(vid)))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("blocks", &self.blocks.len())
            .field("values", &self.values.len())
            .finish()
    }
}

/// Growable method under construction.
pub struct MethodBuilder {
    name: String,
    entry: BlockId,
    blocks: Vec<Block>,
    values: Vec<Value>,
    /// Values replaced by trivial-phi elimination. Chased on every read and
    /// materialized into operand lists by `finish`.
    replacements: FxHashMap<ValueId, ValueId>,
}

impl MethodBuilder {
    /// Create a builder with a fresh entry block.
    pub fn new(name: impl Into<String>) -> Self {
        let mut builder = MethodBuilder {
            name: name.into(),
            entry: BlockId::NONE,
            blocks: Vec::new(),
            values: Vec::new(),
            replacements: FxHashMap::default(),
        };
        builder.entry = builder.create_block();
        builder
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Append a fresh, empty block.
    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId::from_raw(self.blocks.len() as u32);
        self.blocks.push(Block::default());
        id
    }

    /// Record a CFG edge. Duplicate edges are kept distinct; the CFG builder
    /// never produces them.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].successors.push(to);
        self.blocks[to.index()].predecessors.push(from);
    }

    /// Mark a block's SSA bindings final.
    pub fn mark_sealed(&mut self, id: BlockId) {
        self.blocks[id.index()].sealed = true;
    }

    pub fn is_sealed(&self, id: BlockId) -> bool {
        self.blocks[id.index()].sealed
    }

    /// Append a value to the end of a block.
    pub fn append(
        &mut self,
        block: BlockId,
        data: ValueData,
        ty: TypeId,
        location: Location,
    ) -> ValueId {
        let id = self.alloc(data, ty, location);
        self.blocks[block.index()].instrs.push(id);
        id
    }

    /// Insert a value at the front of a block, after any existing phis.
    ///
    /// Phis must precede all ordinary values in their block.
    pub fn prepend_phi(&mut self, block: BlockId, ty: TypeId, location: Location) -> ValueId {
        let id = self.alloc(
            ValueData::Phi {
                operands: PhiOperands::new(),
                incomplete: true,
            },
            ty,
            location,
        );
        let block = &mut self.blocks[block.index()];
        let pos = block
            .instrs
            .iter()
            .take_while(|&&vid| matches!(self.values[vid.raw() as usize].data, ValueData::Phi { .. }))
            .count();
        block.instrs.insert(pos, id);
        id
    }

    /// Insert a value at the very start of a block. Used for entry-block
    /// stack slots, which must precede every other value.
    pub fn prepend(
        &mut self,
        block: BlockId,
        data: ValueData,
        ty: TypeId,
        location: Location,
    ) -> ValueId {
        let id = self.alloc(data, ty, location);
        self.blocks[block.index()].instrs.insert(0, id);
        id
    }

    fn alloc(&mut self, data: ValueData, ty: TypeId, location: Location) -> ValueId {
        let id = ValueId::from_raw(self.values.len() as u32);
        self.values.push(Value { data, ty, location });
        id
    }

    /// Chase the replacement map to the live representative of `id`.
    pub fn resolve(&self, mut id: ValueId) -> ValueId {
        while let Some(&next) = self.replacements.get(&id) {
            id = next;
        }
        id
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[self.resolve(id).raw() as usize]
    }

    pub fn ty(&self, id: ValueId) -> TypeId {
        self.value(id).ty
    }

    /// Bind a phi's operand list and clear its incomplete marker.
    pub fn set_phi_operands(&mut self, id: ValueId, operands: PhiOperands) {
        let value = &mut self.values[id.raw() as usize];
        match &mut value.data {
            ValueData::Phi {
                operands: slot,
                incomplete,
            } => {
                *slot = operands;
                *incomplete = false;
            }
            other => unreachable!("set_phi_operands on non-phi {other:?}"),
        }
    }

    /// Replace every use of `old` with `new` and retire `old`.
    ///
    /// The substitution is recorded lazily; operand lists are rewritten once
    /// in `finish`, and `resolve` covers reads in the meantime.
    pub fn replace_value(&mut self, old: ValueId, new: ValueId) {
        debug_assert_ne!(old, new);
        self.replacements.insert(old, new);
    }

    /// Blocks reachable from the entry, in discovery order.
    fn reachable(&self) -> Vec<BlockId> {
        let mut seen = vec![false; self.blocks.len()];
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut stack = vec![self.entry];
        seen[self.entry.index()] = true;
        while let Some(block) = stack.pop() {
            order.push(block);
            for &succ in &self.blocks[block.index()].successors {
                if !seen[succ.index()] {
                    seen[succ.index()] = true;
                    stack.push(succ);
                }
            }
        }
        order
    }

    /// Verify SSA completeness and seal into an immutable [`Method`].
    ///
    /// Every block reachable from the entry must be sealed and terminated,
    /// and every phi must be complete with one operand per predecessor.
    pub fn finish(mut self) -> Result<Method, MethodError> {
        // Materialize trivial-phi replacements into all operand lists.
        if !self.replacements.is_empty() {
            let resolved: Vec<ValueId> = (0..self.values.len())
                .map(|i| self.resolve(ValueId::from_raw(i as u32)))
                .collect();
            for value in &mut self.values {
                value
                    .data
                    .for_each_operand_mut(|op| *op = resolved[op.raw() as usize]);
            }
            let replacements = std::mem::take(&mut self.replacements);
            for block in &mut self.blocks {
                block.instrs.retain(|id| !replacements.contains_key(id));
            }
        }

        for block_id in self.reachable() {
            let block = &self.blocks[block_id.index()];
            if !block.sealed {
                return Err(MethodError::UnsealedBlock(block_id));
            }
            match block.terminator() {
                Some(term) if self.values[term.raw() as usize].data.is_terminator() => {}
                _ => return Err(MethodError::MissingTerminator(block_id)),
            }
            for &vid in &block.instrs {
                if let ValueData::Phi {
                    operands,
                    incomplete,
                } = &self.values[vid.raw() as usize].data
                {
                    if *incomplete {
                        return Err(MethodError::IncompletePhi(vid));
                    }
                    if operands.len() != block.predecessors.len() {
                        return Err(MethodError::PhiOperandMismatch {
                            phi: vid,
                            block: block_id,
                        });
                    }
                    if operands.iter().any(|(_, value)| value.is_none()) {
                        return Err(MethodError::UnboundPhiOperand(vid));
                    }
                }
            }
        }

        Ok(Method {
            name: self.name,
            entry: self.entry,
            blocks: self.blocks,
            values: self.values,
        })
    }
}

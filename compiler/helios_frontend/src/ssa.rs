//! On-the-fly SSA construction with block sealing.
//!
//! Variable writes bind `(block, variable) -> value`; reads look up the local
//! binding and otherwise recurse through predecessors, memoizing the answer
//! per block. A block is sealed once its predecessor set is final. Reads in
//! unsealed blocks plant an operandless placeholder phi that is completed at
//! seal time; reads in sealed join blocks plant a phi immediately and fill
//! its operands recursively, with the phi pre-registered as the block's
//! binding to cut lookup cycles through loops.
//!
//! A phi whose operands all resolve to one value (or to the phi itself) is
//! trivial and is replaced by that value through the builder's replacement
//! map. Removal can expose more trivial phis in other blocks;
//! [`SsaBuilder::simplify_phis`] runs that to a fixpoint after translation.

use rustc_hash::FxHashMap;

use helios_diagnostic::{FrontendError, FrontendResult};
use helios_ir::{
    BlockId, Location, MethodBuilder, PhiOperands, TypeId, ValueData, ValueId, VariableRef,
};

/// Per-method SSA variable state.
#[derive(Debug, Default)]
pub struct SsaBuilder {
    /// Current binding of each variable in each block.
    defs: FxHashMap<(BlockId, VariableRef), ValueId>,
    /// Placeholder phis awaiting operands, per unsealed block.
    pending: FxHashMap<BlockId, Vec<(VariableRef, ValueId)>>,
    /// Declared (promoted) type of each SSA-tracked variable.
    var_types: FxHashMap<VariableRef, TypeId>,
}

impl SsaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable's type. Phis planted for the variable are stamped
    /// with it.
    pub fn declare(&mut self, var: VariableRef, ty: TypeId) {
        self.var_types.insert(var, ty);
    }

    /// Bind `var` to `value` in `block`.
    pub fn write_variable(&mut self, var: VariableRef, block: BlockId, value: ValueId) {
        self.defs.insert((block, var), value);
    }

    /// The value of `var` at the end of `block`.
    pub fn read_variable(
        &mut self,
        builder: &mut MethodBuilder,
        var: VariableRef,
        block: BlockId,
    ) -> FrontendResult<ValueId> {
        if let Some(&value) = self.defs.get(&(block, var)) {
            return Ok(builder.resolve(value));
        }
        self.read_recursive(builder, var, block)
    }

    fn var_type(&self, var: VariableRef) -> FrontendResult<TypeId> {
        self.var_types.get(&var).copied().ok_or_else(|| {
            FrontendError::internal(
                format!("read of undeclared variable {var:?}"),
                Location::UNKNOWN,
            )
        })
    }

    fn read_recursive(
        &mut self,
        builder: &mut MethodBuilder,
        var: VariableRef,
        block: BlockId,
    ) -> FrontendResult<ValueId> {
        let value = if !builder.is_sealed(block) {
            // Predecessors not final yet; complete the phi at seal time.
            let ty = self.var_type(var)?;
            let phi = builder.prepend_phi(block, ty, Location::UNKNOWN);
            self.pending.entry(block).or_default().push((var, phi));
            phi
        } else {
            let preds = builder.block(block).predecessors.clone();
            match preds.len() {
                0 => {
                    return Err(FrontendError::internal(
                        format!("variable {var:?} read before any definition"),
                        Location::UNKNOWN,
                    ));
                }
                1 => self.read_variable(builder, var, preds[0])?,
                _ => {
                    // Register the phi before recursing so a lookup cycle
                    // through a loop terminates at it.
                    let ty = self.var_type(var)?;
                    let phi = builder.prepend_phi(block, ty, Location::UNKNOWN);
                    self.defs.insert((block, var), phi);
                    self.add_phi_operands(builder, var, phi, block)?
                }
            }
        };
        self.defs.insert((block, var), value);
        Ok(value)
    }

    /// Finalize `block`'s predecessor set and complete its pending phis.
    ///
    /// Idempotent; sealing an already-sealed block is a no-op.
    pub fn seal_block(&mut self, builder: &mut MethodBuilder, block: BlockId) -> FrontendResult<()> {
        if builder.is_sealed(block) {
            return Ok(());
        }
        // Sealed first: operand reads recursing back into this block must
        // take the sealed path and stop at the registered bindings.
        builder.mark_sealed(block);
        if let Some(pending) = self.pending.remove(&block) {
            for (var, phi) in pending {
                self.add_phi_operands(builder, var, phi, block)?;
            }
        }
        Ok(())
    }

    fn add_phi_operands(
        &mut self,
        builder: &mut MethodBuilder,
        var: VariableRef,
        phi: ValueId,
        block: BlockId,
    ) -> FrontendResult<ValueId> {
        let preds = builder.block(block).predecessors.clone();
        let mut operands = PhiOperands::new();
        for pred in preds {
            let value = self.read_variable(builder, var, pred)?;
            operands.push((pred, value));
        }
        builder.set_phi_operands(phi, operands);
        Ok(try_remove_trivial(builder, phi))
    }

    /// Whether any placeholder phi is still awaiting its operands. True after
    /// translation means a reachable block was never sealed.
    pub fn has_pending(&self) -> bool {
        self.pending.values().any(|phis| !phis.is_empty())
    }

    /// Re-check every surviving phi for triviality until a fixpoint.
    ///
    /// Removing one trivial phi can make a phi that used it trivial in turn;
    /// without use lists the ripple is found by re-scanning.
    pub fn simplify_phis(builder: &mut MethodBuilder) {
        loop {
            let mut changed = false;
            for index in 0..builder.block_count() {
                let block = BlockId::from_raw(index as u32);
                let phis: Vec<ValueId> = builder
                    .block(block)
                    .instrs
                    .iter()
                    .copied()
                    .filter(|&id| {
                        builder.resolve(id) == id
                            && matches!(builder.value(id).data, ValueData::Phi { .. })
                    })
                    .collect();
                for phi in phis {
                    if try_remove_trivial(builder, phi) != phi {
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Replace `phi` if all of its operands resolve to a single value or to the
/// phi itself. Returns the surviving representative.
fn try_remove_trivial(builder: &mut MethodBuilder, phi: ValueId) -> ValueId {
    let operands = match &builder.value(phi).data {
        ValueData::Phi { operands, .. } => operands.clone(),
        _ => return phi,
    };
    let mut same = ValueId::NONE;
    for (_, operand) in operands {
        let operand = builder.resolve(operand);
        if operand == same || operand == phi {
            continue;
        }
        if !same.is_none() {
            // Merges at least two distinct values.
            return phi;
        }
        same = operand;
    }
    if same.is_none() {
        // Only self-references; left for finish() to reject.
        return phi;
    }
    builder.replace_value(phi, same);
    same
}

#[cfg(test)]
mod tests;

//! Variable classification.
//!
//! A single linear scan over the instruction stream finds every
//! "load address of argument/local" and marks the referenced variable
//! address-taken. Address-taken variables get an entry-block stack slot and
//! are only ever accessed through indirect loads/stores; every other
//! variable is tracked purely as an SSA value.
//!
//! The analysis is conservative and call-free: it looks only for the
//! address-taking opcode itself, so it never misses an address-taken
//! variable, but it may provision a slot for an address that is taken and
//! never dereferenced.

use rustc_hash::FxHashMap;

use helios_ir::{ArithFlags, MethodInfo, OpCode, TypeId, VariableRef};

/// Declared type and classification for one variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarInfo {
    /// Declared type from method metadata.
    pub ty: TypeId,
    /// Conversion flags applied when the variable is loaded.
    pub flags: ArithFlags,
    /// Whether any instruction takes this variable's address.
    pub address_taken: bool,
}

/// Per-method variable table.
#[derive(Debug, Default)]
pub struct VariableModel {
    map: FxHashMap<VariableRef, VarInfo>,
}

impl VariableModel {
    /// Classify every argument and local of `info`.
    pub fn analyze(info: &MethodInfo) -> Self {
        let mut map = FxHashMap::default();
        for (index, &ty) in info.params.iter().enumerate() {
            map.insert(
                VariableRef::argument(index as u16),
                VarInfo {
                    ty,
                    flags: ArithFlags::empty(),
                    address_taken: false,
                },
            );
        }
        for (index, &ty) in info.locals.iter().enumerate() {
            map.insert(
                VariableRef::local(index as u16),
                VarInfo {
                    ty,
                    flags: ArithFlags::empty(),
                    address_taken: false,
                },
            );
        }

        for instr in &info.body {
            if let OpCode::LoadVariableAddress(var) = instr.opcode {
                if let Some(entry) = map.get_mut(&var) {
                    entry.address_taken = true;
                }
            }
        }

        VariableModel { map }
    }

    pub fn get(&self, var: VariableRef) -> Option<&VarInfo> {
        self.map.get(&var)
    }

    pub fn is_address_taken(&self, var: VariableRef) -> bool {
        self.map.get(&var).is_some_and(|info| info.address_taken)
    }

    /// Address-taken variables in a stable order, for deterministic slot
    /// allocation in the entry block.
    pub fn address_taken(&self) -> Vec<(VariableRef, VarInfo)> {
        let mut taken: Vec<_> = self
            .map
            .iter()
            .filter(|(_, info)| info.address_taken)
            .map(|(&var, &info)| (var, info))
            .collect();
        taken.sort_by_key(|(var, _)| *var);
        taken
    }

    /// All variables in a stable order.
    pub fn all(&self) -> Vec<(VariableRef, VarInfo)> {
        let mut all: Vec<_> = self.map.iter().map(|(&var, &info)| (var, info)).collect();
        all.sort_by_key(|(var, _)| *var);
        all
    }
}

#[cfg(test)]
mod tests;

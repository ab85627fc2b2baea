//! Instruction lowering.
//!
//! The translator walks the CFG in reverse postorder and lowers each block's
//! instructions against an explicit evaluation stack. Loaded sub-word
//! integers are promoted to `Int32` so the stack only ever carries uniform
//! machine kinds (predicates stay `Int1`); stores convert back down to the
//! destination's declared kind.
//!
//! The evaluation stack never crosses a block boundary: the decoder emits
//! per-statement stack discipline, so operands left over at a terminator
//! indicate a defective decoder and fail as internal errors.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use helios_diagnostic::{FrontendError, FrontendResult, UnsupportedReason};
use helios_ir::{
    ArithFlags, BasicKind, BinaryOp, BlockId, Const, FieldRef, InstrFlags, Instruction, Location,
    Method, MethodBuilder, MethodInfo, MethodToken, OpCode, PhiOperands, TypeId, ValueData,
    ValueId, VariableRef,
};
use helios_types::{AddressSpace, TypeInterner, TypeNode};

use crate::cfg::ControlFlow;
use crate::resolver::{CalleeInfo, MethodResolver, Settings, StaticLoadMode};
use crate::ssa::SsaBuilder;
use crate::variables::VariableModel;

/// Stack slots and `Alloca`s are stamped generic; concrete address spaces
/// are assigned when memory is lowered for a target.
const STACK_SPACE: AddressSpace = AddressSpace::Generic;

pub(crate) struct Translator<'a> {
    info: &'a MethodInfo,
    interner: &'a TypeInterner,
    resolver: &'a dyn MethodResolver,
    settings: &'a Settings,
    cfg: &'a ControlFlow,
    vars: &'a VariableModel,
    builder: MethodBuilder,
    ssa: SsaBuilder,
    /// CFG block index -> IR block.
    block_map: Vec<BlockId>,
    /// Leader instruction offset -> CFG block index.
    block_at: FxHashMap<u32, u32>,
    /// Stack slots of address-taken variables.
    slots: FxHashMap<VariableRef, ValueId>,
    /// Per-CFG-block translation state, for sealing.
    processed: Vec<bool>,
    reachable: Vec<bool>,
    /// Return values routed to the synthetic exit, per return block.
    returns: Vec<(BlockId, ValueId)>,
}

impl<'a> Translator<'a> {
    pub(crate) fn new(
        info: &'a MethodInfo,
        interner: &'a TypeInterner,
        resolver: &'a dyn MethodResolver,
        settings: &'a Settings,
        cfg: &'a ControlFlow,
        vars: &'a VariableModel,
    ) -> Self {
        let mut builder = MethodBuilder::new(info.name.clone());
        let block_count = cfg.blocks().len();

        let mut block_map = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            block_map.push(builder.create_block());
        }

        let mut reachable = vec![false; block_count];
        for &index in cfg.reverse_postorder() {
            reachable[index as usize] = true;
        }

        // The builder entry holds the prologue and falls into the first
        // bytecode block; edges otherwise mirror the reachable CFG.
        builder.add_edge(builder.entry(), block_map[ControlFlow::ENTRY as usize]);
        for (index, block) in cfg.blocks().iter().enumerate() {
            if !reachable[index] {
                continue;
            }
            for &succ in &block.successors {
                builder.add_edge(block_map[index], block_map[succ as usize]);
            }
        }

        let mut block_at = FxHashMap::default();
        for (index, block) in cfg.blocks().iter().enumerate() {
            if block.len > 0 {
                block_at.insert(block.start, index as u32);
            }
        }

        Translator {
            info,
            interner,
            resolver,
            settings,
            cfg,
            vars,
            builder,
            ssa: SsaBuilder::new(),
            block_map,
            block_at,
            slots: FxHashMap::default(),
            processed: vec![false; block_count],
            reachable,
            returns: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> FrontendResult<Method> {
        self.prologue();

        let cfg = self.cfg;
        for &index in cfg.reverse_postorder() {
            if cfg.has_synthetic_exit() && index == cfg.exit() {
                continue;
            }
            self.try_seal(index)?;
            self.process_block(index)?;
            self.processed[index as usize] = true;
            self.try_seal(index)?;
            for succ_pos in 0..cfg.block(index).successors.len() {
                let succ = cfg.block(index).successors[succ_pos];
                self.try_seal(succ)?;
            }
        }

        if cfg.has_synthetic_exit() {
            self.finish_exit()?;
        }

        if self.ssa.has_pending() {
            return Err(FrontendError::internal(
                "placeholder phis survived translation",
                Location::UNKNOWN,
            ));
        }

        SsaBuilder::simplify_phis(&mut self.builder);
        self.builder
            .finish()
            .map_err(|err| FrontendError::internal(err.to_string(), Location::UNKNOWN))
    }

    /// Materialize parameters, stack slots, and local zero-initialization in
    /// the builder's entry block.
    fn prologue(&mut self) {
        let entry = self.builder.entry();
        let first = self.block_map[ControlFlow::ENTRY as usize];

        for (index, &ty) in self.info.params.iter().enumerate() {
            let var = VariableRef::argument(index as u16);
            let param = self.builder.append(
                entry,
                ValueData::Param {
                    index: index as u16,
                },
                ty,
                Location::UNKNOWN,
            );
            if self.vars.is_address_taken(var) {
                let slot = self.alloc_slot(ty);
                self.builder.append(
                    entry,
                    ValueData::Store {
                        address: slot,
                        value: param,
                    },
                    TypeId::VOID,
                    Location::UNKNOWN,
                );
                self.slots.insert(var, slot);
            } else {
                self.ssa.declare(var, ty);
                self.ssa.write_variable(var, entry, param);
            }
        }

        for (index, &ty) in self.info.locals.iter().enumerate() {
            let var = VariableRef::local(index as u16);
            if self.vars.is_address_taken(var) {
                let slot = self.alloc_slot(ty);
                if let Some(kind) = self.interner.basic_kind(ty) {
                    let zero =
                        self.builder
                            .append(entry, ValueData::Const(zero_of(kind)), ty, Location::UNKNOWN);
                    self.builder.append(
                        entry,
                        ValueData::Store {
                            address: slot,
                            value: zero,
                        },
                        TypeId::VOID,
                        Location::UNKNOWN,
                    );
                }
                self.slots.insert(var, slot);
            } else {
                self.ssa.declare(var, ty);
                // Aggregate locals have no scalar zero; a read before the
                // first write is rejected during SSA lookup.
                if let Some(kind) = self.interner.basic_kind(ty) {
                    let zero =
                        self.builder
                            .append(entry, ValueData::Const(zero_of(kind)), ty, Location::UNKNOWN);
                    self.ssa.write_variable(var, entry, zero);
                }
            }
        }

        self.builder
            .append(entry, ValueData::Branch { target: first }, TypeId::VOID, Location::UNKNOWN);
        self.builder.mark_sealed(entry);
    }

    fn alloc_slot(&mut self, ty: TypeId) -> ValueId {
        let slot_ty = self.interner.pointer(ty, STACK_SPACE);
        self.builder
            .prepend(self.builder.entry(), ValueData::Alloca, slot_ty, Location::UNKNOWN)
    }

    /// Seal a CFG block's IR counterpart once every reachable predecessor
    /// has been translated.
    fn try_seal(&mut self, index: u32) -> FrontendResult<()> {
        let block = self.block_map[index as usize];
        if self.builder.is_sealed(block) {
            return Ok(());
        }
        let ready = self
            .cfg
            .block(index)
            .predecessors
            .iter()
            .all(|&pred| !self.reachable[pred as usize] || self.processed[pred as usize]);
        if ready {
            self.ssa.seal_block(&mut self.builder, block)?;
        }
        Ok(())
    }

    fn process_block(&mut self, index: u32) -> FrontendResult<()> {
        let info = self.info;
        let cfg_block = self.cfg.block(index);
        let (start, len) = (cfg_block.start as usize, cfg_block.len as usize);
        let block = self.block_map[index as usize];

        let mut stack: Vec<ValueId> = Vec::new();
        for instr in &info.body[start..start + len] {
            self.translate(block, &mut stack, *instr)?;
        }

        let last = info.body[start + len - 1];
        if !last.opcode.is_terminator() {
            // Fallthrough into the lexically next block.
            let succ = self.cfg.block(index).successors[0];
            let target = self.block_map[succ as usize];
            self.builder
                .append(block, ValueData::Branch { target }, TypeId::VOID, last.location);
        }

        if !stack.is_empty() {
            return Err(FrontendError::internal(
                format!(
                    "{} operands left on the evaluation stack at a block boundary",
                    stack.len()
                ),
                last.location,
            ));
        }
        Ok(())
    }

    fn translate(
        &mut self,
        block: BlockId,
        stack: &mut Vec<ValueId>,
        instr: Instruction,
    ) -> FrontendResult<()> {
        let location = instr.location;
        match instr.opcode {
            OpCode::Nop => {}

            OpCode::LoadConst(constant) => {
                let ty = TypeId::for_basic(constant.kind());
                stack.push(
                    self.builder
                        .append(block, ValueData::Const(constant), ty, location),
                );
            }

            OpCode::LoadVariable(var) => {
                if let Some(&slot) = self.slots.get(&var) {
                    let ty = self.pointee(slot, location)?;
                    let loaded =
                        self.builder
                            .append(block, ValueData::Load { address: slot }, ty, location);
                    let promoted = self.promote(block, loaded, location);
                    stack.push(promoted);
                } else {
                    let value = self.ssa.read_variable(&mut self.builder, var, block)?;
                    let promoted = self.promote(block, value, location);
                    stack.push(promoted);
                }
            }

            OpCode::StoreVariable(var) => {
                let value = pop(stack, location)?;
                if let Some(&slot) = self.slots.get(&var) {
                    let ty = self.pointee(slot, location)?;
                    let value = self.coerce(block, value, ty, location);
                    self.builder.append(
                        block,
                        ValueData::Store {
                            address: slot,
                            value,
                        },
                        TypeId::VOID,
                        location,
                    );
                } else {
                    let declared = self
                        .vars
                        .get(var)
                        .map(|info| info.ty)
                        .ok_or_else(|| {
                            FrontendError::internal(
                                format!("store to unknown variable {var:?}"),
                                location,
                            )
                        })?;
                    let value = self.coerce(block, value, declared, location);
                    self.ssa.write_variable(var, block, value);
                }
            }

            OpCode::LoadVariableAddress(var) => {
                let slot = self.slots.get(&var).copied().ok_or_else(|| {
                    FrontendError::internal(
                        format!("variable {var:?} has no stack slot"),
                        location,
                    )
                })?;
                stack.push(slot);
            }

            OpCode::Binary(op) => {
                let rhs = pop(stack, location)?;
                let lhs = pop(stack, location)?;
                let value = self.lower_binary(block, op, lhs, rhs, instr.flags, location)?;
                stack.push(value);
            }

            OpCode::Unary(op) => {
                let operand = pop(stack, location)?;
                let ty = self.builder.ty(operand);
                stack.push(self.builder.append(
                    block,
                    ValueData::Unary {
                        op,
                        operand,
                        flags: arith_flags(instr.flags),
                    },
                    ty,
                    location,
                ));
            }

            OpCode::Compare(kind) => {
                let rhs = pop(stack, location)?;
                let lhs = pop(stack, location)?;
                stack.push(self.builder.append(
                    block,
                    ValueData::Compare {
                        kind,
                        lhs,
                        rhs,
                        flags: arith_flags(instr.flags),
                    },
                    TypeId::BOOL,
                    location,
                ));
            }

            OpCode::Convert(kind) => {
                let value = pop(stack, location)?;
                let target = TypeId::for_basic(kind);
                let converted = if self.builder.ty(value) == target {
                    value
                } else {
                    self.builder.append(
                        block,
                        ValueData::Convert {
                            value,
                            flags: arith_flags(instr.flags),
                        },
                        target,
                        location,
                    )
                };
                let promoted = self.promote(block, converted, location);
                stack.push(promoted);
            }

            OpCode::Branch { target } => {
                let target = self.ir_target(target, location)?;
                self.builder
                    .append(block, ValueData::Branch { target }, TypeId::VOID, location);
            }

            OpCode::ConditionalBranch { if_true, if_false } => {
                let condition = pop(stack, location)?;
                let if_true = self.ir_target(if_true, location)?;
                let if_false = self.ir_target(if_false, location)?;
                let data = if if_true == if_false {
                    // Both arms coincide; the CFG carries a single edge.
                    ValueData::Branch { target: if_true }
                } else {
                    ValueData::CondBranch {
                        condition,
                        if_true,
                        if_false,
                    }
                };
                self.builder.append(block, data, TypeId::VOID, location);
            }

            OpCode::Return => {
                let value = if self.info.return_type == TypeId::VOID {
                    None
                } else {
                    let value = pop(stack, location)?;
                    Some(self.coerce(block, value, self.info.return_type, location))
                };
                if self.cfg.has_synthetic_exit() {
                    if let Some(value) = value {
                        self.returns.push((block, value));
                    }
                    let target = self.block_map[self.cfg.exit() as usize];
                    self.builder
                        .append(block, ValueData::Branch { target }, TypeId::VOID, location);
                } else {
                    self.builder
                        .append(block, ValueData::Return { value }, TypeId::VOID, location);
                }
            }

            OpCode::Call(token) => {
                let callee = self.resolver.resolve_call(token).ok_or_else(|| {
                    FrontendError::unsupported(UnsupportedReason::UnresolvedCall, location)
                })?;
                self.emit_call(block, stack, token, &callee, location)?;
            }

            OpCode::CallVirtual { token, constrained } => {
                self.lower_virtual_call(block, stack, token, constrained, location)?;
            }

            OpCode::CallIndirect => {
                return Err(FrontendError::unsupported(
                    UnsupportedReason::IndirectCall,
                    location,
                ));
            }

            OpCode::LoadField(field) => {
                let receiver = pop(stack, location)?;
                let value = self.lower_load_field(block, receiver, field, location)?;
                stack.push(value);
            }

            OpCode::StoreField(field) => {
                let value = pop(stack, location)?;
                let receiver = pop(stack, location)?;
                self.lower_store_field(block, receiver, value, field, location)?;
            }

            OpCode::LoadFieldAddress(field) => {
                let receiver = pop(stack, location)?;
                let (element, space) = self.pointer_parts(receiver, location)?;
                let address =
                    self.field_address(block, receiver, element, space, field, location)?;
                stack.push(address.0);
            }

            OpCode::LoadElement => {
                let index = pop(stack, location)?;
                let source = pop(stack, location)?;
                let (address, element) = self.element_address(block, source, index, location)?;
                let loaded =
                    self.builder
                        .append(block, ValueData::Load { address }, element, location);
                let promoted = self.promote(block, loaded, location);
                stack.push(promoted);
            }

            OpCode::StoreElement => {
                let value = pop(stack, location)?;
                let index = pop(stack, location)?;
                let source = pop(stack, location)?;
                let (address, element) = self.element_address(block, source, index, location)?;
                let value = self.coerce(block, value, element, location);
                self.builder.append(
                    block,
                    ValueData::Store { address, value },
                    TypeId::VOID,
                    location,
                );
            }

            OpCode::LoadElementAddress => {
                let index = pop(stack, location)?;
                let source = pop(stack, location)?;
                let (address, _) = self.element_address(block, source, index, location)?;
                stack.push(address);
            }

            OpCode::NewObject(token) => {
                self.lower_new_object(block, stack, token, location)?;
            }

            OpCode::LoadStatic(field) => {
                let resolved = self.resolver.static_field(field).ok_or_else(|| {
                    FrontendError::unsupported(UnsupportedReason::UnresolvedStaticField, location)
                })?;
                if resolved.mutable && self.settings.static_load_mode == StaticLoadMode::ReadOnly {
                    return Err(FrontendError::unsupported_member(
                        UnsupportedReason::MutableStaticLoad,
                        resolved.name,
                        location,
                    ));
                }
                let loaded = self.builder.append(
                    block,
                    ValueData::LoadStatic { field },
                    resolved.ty,
                    location,
                );
                let promoted = self.promote(block, loaded, location);
                stack.push(promoted);
            }

            OpCode::RuntimeTypeTest => {
                return Err(FrontendError::unsupported(
                    UnsupportedReason::RuntimeTypeTest,
                    location,
                ));
            }
        }
        Ok(())
    }

    fn lower_binary(
        &mut self,
        block: BlockId,
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
        flags: InstrFlags,
        location: Location,
    ) -> FrontendResult<ValueId> {
        let lhs_ptr = self.interner.is_pointer(self.builder.ty(lhs));
        let rhs_ptr = self.interner.is_pointer(self.builder.ty(rhs));

        if op == BinaryOp::Add && (lhs_ptr || rhs_ptr) {
            if lhs_ptr && rhs_ptr {
                return Err(FrontendError::internal(
                    "addition of two pointers",
                    location,
                ));
            }
            let (pointer, offset) = if lhs_ptr { (lhs, rhs) } else { (rhs, lhs) };
            return self.fold_pointer_add(block, pointer, offset, location);
        }

        let mut rhs = rhs;
        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            // Shift amounts are always 32-bit, whatever the shifted width.
            rhs = self.coerce(block, rhs, TypeId::INT32, location);
        }

        let ty = self.builder.ty(lhs);
        Ok(self.builder.append(
            block,
            ValueData::Binary {
                op,
                lhs,
                rhs,
                flags: arith_flags(flags),
            },
            ty,
            location,
        ))
    }

    /// Rewrite `pointer + byte_offset` as a strided element address.
    ///
    /// The byte offset is matched against its producer: a multiply or shift
    /// by the element size yields the index directly, provided the size is a
    /// machine-kind width. Any other offset is divided by the element size;
    /// a non-multiple offset truncates, which mirrors how such pointer
    /// arithmetic behaves after lowering and is deliberately kept.
    fn fold_pointer_add(
        &mut self,
        block: BlockId,
        pointer: ValueId,
        offset: ValueId,
        location: Location,
    ) -> FrontendResult<ValueId> {
        let pointer_ty = self.builder.ty(pointer);
        let element = self.interner.element(pointer_ty).ok_or_else(|| {
            FrontendError::internal("pointer type without an element", location)
        })?;
        let element_size = self.interner.size(element);

        let index = self.element_index(block, offset, element_size, location);
        Ok(self.builder.append(
            block,
            ValueData::ElementAddress {
                address: pointer,
                index,
            },
            pointer_ty,
            location,
        ))
    }

    fn element_index(
        &mut self,
        block: BlockId,
        offset: ValueId,
        element_size: u32,
        location: Location,
    ) -> ValueId {
        if element_size == 1 {
            return offset;
        }
        if BasicKind::from_size(element_size).is_some() {
            match self.builder.value(offset).data.clone() {
                ValueData::Binary {
                    op: BinaryOp::Mul,
                    lhs,
                    rhs,
                    ..
                } => {
                    if self.const_int(rhs) == Some(element_size as i64) {
                        return self.builder.resolve(lhs);
                    }
                    if self.const_int(lhs) == Some(element_size as i64) {
                        return self.builder.resolve(rhs);
                    }
                }
                ValueData::Binary {
                    op: BinaryOp::Shl,
                    lhs,
                    rhs,
                    ..
                } => {
                    if let Some(shift) = self.const_int(rhs) {
                        if (0..32).contains(&shift) && 1u64 << shift == element_size as u64 {
                            return self.builder.resolve(lhs);
                        }
                    }
                }
                _ => {}
            }
        }

        let offset_ty = self.builder.ty(offset);
        let size_const = if self.interner.basic_kind(offset_ty) == Some(BasicKind::Int64) {
            Const::I64(element_size as i64)
        } else {
            Const::I32(element_size as i32)
        };
        let size = self
            .builder
            .append(block, ValueData::Const(size_const), offset_ty, location);
        self.builder.append(
            block,
            ValueData::Binary {
                op: BinaryOp::Div,
                lhs: offset,
                rhs: size,
                flags: ArithFlags::empty(),
            },
            offset_ty,
            location,
        )
    }

    fn lower_load_field(
        &mut self,
        block: BlockId,
        receiver: ValueId,
        field: FieldRef,
        location: Location,
    ) -> FrontendResult<ValueId> {
        let receiver_ty = self.builder.ty(receiver);
        match self.interner.node(receiver_ty) {
            TypeNode::Pointer { element, space } => {
                let (address, field_ty) =
                    self.field_address(block, receiver, element, space, field, location)?;
                let loaded =
                    self.builder
                        .append(block, ValueData::Load { address }, field_ty, location);
                Ok(self.promote(block, loaded, location))
            }
            TypeNode::Structure(_) => {
                let (field_ty, flat) = self.resolve_field(receiver_ty, field, location)?;
                let value = self.builder.append(
                    block,
                    ValueData::GetField {
                        object: receiver,
                        field_index: flat,
                    },
                    field_ty,
                    location,
                );
                Ok(self.promote(block, value, location))
            }
            _ => {
                // A single-field structure interned down to its field: the
                // receiver is the field.
                self.resolve_field(receiver_ty, field, location)?;
                Ok(self.promote(block, receiver, location))
            }
        }
    }

    fn lower_store_field(
        &mut self,
        block: BlockId,
        receiver: ValueId,
        value: ValueId,
        field: FieldRef,
        location: Location,
    ) -> FrontendResult<()> {
        let (element, space) = self.pointer_parts(receiver, location)?;
        let (address, field_ty) =
            self.field_address(block, receiver, element, space, field, location)?;
        let value = self.coerce(block, value, field_ty, location);
        self.builder.append(
            block,
            ValueData::Store { address, value },
            TypeId::VOID,
            location,
        );
        Ok(())
    }

    /// The address of a field behind a pointer receiver, together with the
    /// field's type. Collapsed single-field owners address the whole object.
    fn field_address(
        &mut self,
        block: BlockId,
        receiver: ValueId,
        element: TypeId,
        space: AddressSpace,
        field: FieldRef,
        location: Location,
    ) -> FrontendResult<(ValueId, TypeId)> {
        let (field_ty, flat) = self.resolve_field(element, field, location)?;
        if field_ty == element && !matches!(self.interner.node(element), TypeNode::Structure(_)) {
            return Ok((receiver, field_ty));
        }
        let address_ty = self.interner.pointer(field_ty, space);
        let address = self.builder.append(
            block,
            ValueData::FieldAddress {
                address: receiver,
                field_index: flat,
            },
            address_ty,
            location,
        );
        Ok((address, field_ty))
    }

    fn resolve_field(
        &self,
        owner: TypeId,
        field: FieldRef,
        location: Location,
    ) -> FrontendResult<(TypeId, u32)> {
        self.interner.direct_field(owner, field.index).ok_or_else(|| {
            FrontendError::internal(
                format!("field {} out of range for its owner type", field.index),
                location,
            )
        })
    }

    /// The element address behind a pointer or view source, plus the element
    /// type.
    fn element_address(
        &mut self,
        block: BlockId,
        source: ValueId,
        index: ValueId,
        location: Location,
    ) -> FrontendResult<(ValueId, TypeId)> {
        let source_ty = self.builder.ty(source);
        let (element, space) = match self.interner.node(source_ty) {
            TypeNode::Pointer { element, space } | TypeNode::View { element, space } => {
                (element, space)
            }
            _ => {
                return Err(FrontendError::internal(
                    "element access requires a pointer or view",
                    location,
                ));
            }
        };
        let address_ty = self.interner.pointer(element, space);
        let address = self.builder.append(
            block,
            ValueData::ElementAddress {
                address: source,
                index,
            },
            address_ty,
            location,
        );
        Ok((address, element))
    }

    fn lower_virtual_call(
        &mut self,
        block: BlockId,
        stack: &mut Vec<ValueId>,
        token: MethodToken,
        constrained: Option<TypeId>,
        location: Location,
    ) -> FrontendResult<()> {
        let declared = self.resolver.resolve_call(token);
        let unresolved = |declared: Option<CalleeInfo>| match declared {
            Some(callee) => FrontendError::unsupported_member(
                UnsupportedReason::UnresolvedVirtualCall,
                callee.name,
                location,
            ),
            None => {
                FrontendError::unsupported(UnsupportedReason::UnresolvedVirtualCall, location)
            }
        };

        let Some(receiver_ty) = constrained else {
            return Err(unresolved(declared));
        };
        let Some(target) = self.resolver.devirtualize(token, receiver_ty) else {
            return Err(unresolved(declared));
        };
        let callee = self
            .resolver
            .resolve_call(target)
            .ok_or_else(|| unresolved(declared))?;
        self.emit_call(block, stack, target, &callee, location)
    }

    fn emit_call(
        &mut self,
        block: BlockId,
        stack: &mut Vec<ValueId>,
        token: MethodToken,
        callee: &CalleeInfo,
        location: Location,
    ) -> FrontendResult<()> {
        if self.settings.is_forbidden(&callee.name) {
            return Err(FrontendError::unsupported_member(
                UnsupportedReason::ForbiddenNamespace,
                callee.name.clone(),
                location,
            ));
        }

        let mut args: SmallVec<[ValueId; 4]> = SmallVec::with_capacity(callee.arg_count());
        for _ in 0..callee.arg_count() {
            args.push(pop(stack, location)?);
        }
        args.reverse();
        for (arg, &param_ty) in args.iter_mut().zip(&callee.params) {
            *arg = self.coerce(block, *arg, param_ty, location);
        }

        let call = self.builder.append(
            block,
            ValueData::Call {
                target: token,
                args,
            },
            callee.return_type,
            location,
        );
        if callee.return_type != TypeId::VOID {
            let promoted = self.promote(block, call, location);
            stack.push(promoted);
        }
        Ok(())
    }

    /// Construct an object in a fresh stack slot: call the constructor with
    /// the slot's address as the receiver, then push the constructed value.
    fn lower_new_object(
        &mut self,
        block: BlockId,
        stack: &mut Vec<ValueId>,
        token: MethodToken,
        location: Location,
    ) -> FrontendResult<()> {
        let ctor = self.resolver.resolve_constructor(token).ok_or_else(|| {
            FrontendError::unsupported(UnsupportedReason::UnresolvedConstructor, location)
        })?;
        if self.settings.is_forbidden(&ctor.name) {
            return Err(FrontendError::unsupported_member(
                UnsupportedReason::ForbiddenNamespace,
                ctor.name,
                location,
            ));
        }

        let receiver_ty = ctor.params.first().copied().ok_or_else(|| {
            FrontendError::internal("constructor without a receiver parameter", location)
        })?;
        let object_ty = self.interner.element(receiver_ty).ok_or_else(|| {
            FrontendError::internal("constructor receiver is not a pointer", location)
        })?;

        let slot = self.alloc_slot(object_ty);
        let mut args: SmallVec<[ValueId; 4]> = SmallVec::with_capacity(ctor.params.len());
        for _ in 1..ctor.params.len() {
            args.push(pop(stack, location)?);
        }
        args.reverse();
        for (arg, &param_ty) in args.iter_mut().zip(&ctor.params[1..]) {
            *arg = self.coerce(block, *arg, param_ty, location);
        }
        args.insert(0, slot);

        self.builder.append(
            block,
            ValueData::Call {
                target: token,
                args,
            },
            ctor.return_type,
            location,
        );
        let constructed =
            self.builder
                .append(block, ValueData::Load { address: slot }, object_ty, location);
        let promoted = self.promote(block, constructed, location);
        stack.push(promoted);
        Ok(())
    }

    /// Complete the synthetic unifying exit: merge the per-path return
    /// values in a phi and emit the single `Return`.
    fn finish_exit(&mut self) -> FrontendResult<()> {
        let exit_index = self.cfg.exit();
        self.try_seal(exit_index)?;
        let exit = self.block_map[exit_index as usize];

        let value = if self.info.return_type == TypeId::VOID {
            None
        } else {
            // The builder's edge list covers reachable predecessors only;
            // the CFG's also counts unreachable return blocks.
            let expected = self.builder.block(exit).predecessors.len();
            if self.returns.len() != expected {
                return Err(FrontendError::internal(
                    "return value missing on a path to the exit",
                    Location::UNKNOWN,
                ));
            }
            let phi = self
                .builder
                .prepend_phi(exit, self.info.return_type, Location::UNKNOWN);
            let operands: PhiOperands = self.returns.iter().copied().collect();
            self.builder.set_phi_operands(phi, operands);
            Some(phi)
        };

        self.builder
            .append(exit, ValueData::Return { value }, TypeId::VOID, Location::UNKNOWN);
        Ok(())
    }

    /// Widen a sub-word integer to the uniform stack kind.
    fn promote(&mut self, block: BlockId, value: ValueId, location: Location) -> ValueId {
        let ty = self.builder.ty(value);
        if let Some(kind) = self.interner.basic_kind(ty) {
            let promoted = kind.promoted();
            if promoted != kind {
                return self.builder.append(
                    block,
                    ValueData::Convert {
                        value,
                        flags: ArithFlags::empty(),
                    },
                    TypeId::for_basic(promoted),
                    location,
                );
            }
        }
        value
    }

    /// Convert `value` to `target` when both are machine kinds; other type
    /// pairs pass through unchanged.
    fn coerce(
        &mut self,
        block: BlockId,
        value: ValueId,
        target: TypeId,
        location: Location,
    ) -> ValueId {
        let ty = self.builder.ty(value);
        if ty == target
            || self.interner.basic_kind(ty).is_none()
            || self.interner.basic_kind(target).is_none()
        {
            return value;
        }
        self.builder.append(
            block,
            ValueData::Convert {
                value,
                flags: ArithFlags::empty(),
            },
            target,
            location,
        )
    }

    fn const_int(&self, id: ValueId) -> Option<i64> {
        match self.builder.value(id).data {
            ValueData::Const(constant) => constant.as_integer(),
            _ => None,
        }
    }

    fn pointee(&self, pointer: ValueId, location: Location) -> FrontendResult<TypeId> {
        self.interner
            .element(self.builder.ty(pointer))
            .ok_or_else(|| FrontendError::internal("expected a pointer value", location))
    }

    fn pointer_parts(
        &self,
        pointer: ValueId,
        location: Location,
    ) -> FrontendResult<(TypeId, AddressSpace)> {
        match self.interner.node(self.builder.ty(pointer)) {
            TypeNode::Pointer { element, space } => Ok((element, space)),
            _ => Err(FrontendError::internal(
                "field access requires a pointer receiver",
                location,
            )),
        }
    }

    fn ir_target(&self, offset: u32, location: Location) -> FrontendResult<BlockId> {
        self.block_at
            .get(&offset)
            .map(|&index| self.block_map[index as usize])
            .ok_or_else(|| {
                FrontendError::internal(
                    format!("branch target {offset} is not a block leader"),
                    location,
                )
            })
    }
}

fn pop(stack: &mut Vec<ValueId>, location: Location) -> FrontendResult<ValueId> {
    stack
        .pop()
        .ok_or_else(|| FrontendError::internal("evaluation stack underflow", location))
}

fn arith_flags(flags: InstrFlags) -> ArithFlags {
    let mut out = ArithFlags::empty();
    if flags.contains(InstrFlags::OVERFLOW_CHECK) {
        out |= ArithFlags::OVERFLOW_CHECK;
    }
    if flags.contains(InstrFlags::UNSIGNED) {
        out |= ArithFlags::UNSIGNED;
    }
    out
}

fn zero_of(kind: BasicKind) -> Const {
    match kind {
        BasicKind::Int1 => Const::Bool(false),
        BasicKind::Int8 | BasicKind::Int16 | BasicKind::Int32 => Const::I32(0),
        BasicKind::Int64 => Const::I64(0),
        BasicKind::Float32 => Const::F32(0.0),
        BasicKind::Float64 => Const::F64(0.0),
    }
}

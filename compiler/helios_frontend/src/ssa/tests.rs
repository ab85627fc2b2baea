use super::*;
use helios_ir::{Const, MethodBuilder, TypeId, VariableRef};

fn ok(result: FrontendResult<ValueId>) -> ValueId {
    match result {
        Ok(value) => value,
        Err(err) => panic!("ssa read failed: {err}"),
    }
}

fn seal(ssa: &mut SsaBuilder, builder: &mut MethodBuilder, block: BlockId) {
    if let Err(err) = ssa.seal_block(builder, block) {
        panic!("seal failed: {err}");
    }
}

fn const_i32(builder: &mut MethodBuilder, block: BlockId, value: i32) -> ValueId {
    builder.append(
        block,
        ValueData::Const(Const::I32(value)),
        TypeId::INT32,
        Location::UNKNOWN,
    )
}

fn operands(pairs: &[(BlockId, ValueId)]) -> PhiOperands {
    pairs.iter().copied().collect()
}

fn phi_operands(builder: &MethodBuilder, phi: ValueId) -> PhiOperands {
    match &builder.value(phi).data {
        ValueData::Phi {
            operands,
            incomplete,
        } => {
            assert!(!incomplete, "phi left incomplete");
            operands.clone()
        }
        other => panic!("expected phi, found {other:?}"),
    }
}

#[test]
fn local_read_returns_last_write() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let mut ssa = SsaBuilder::new();
    let var = VariableRef::local(0);
    ssa.declare(var, TypeId::INT32);
    seal(&mut ssa, &mut builder, entry);

    let first = const_i32(&mut builder, entry, 1);
    ssa.write_variable(var, entry, first);
    let second = const_i32(&mut builder, entry, 2);
    ssa.write_variable(var, entry, second);

    assert_eq!(ok(ssa.read_variable(&mut builder, var, entry)), second);
}

#[test]
fn read_chases_single_predecessor_without_phi() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let next = builder.create_block();
    builder.add_edge(entry, next);

    let mut ssa = SsaBuilder::new();
    let var = VariableRef::argument(0);
    ssa.declare(var, TypeId::INT64);
    seal(&mut ssa, &mut builder, entry);
    seal(&mut ssa, &mut builder, next);

    let def = const_i32(&mut builder, entry, 5);
    ssa.write_variable(var, entry, def);

    assert_eq!(ok(ssa.read_variable(&mut builder, var, next)), def);
    // No phi was planted in the straight-line successor.
    assert!(builder
        .block(next)
        .instrs
        .iter()
        .all(|&id| !matches!(builder.value(id).data, ValueData::Phi { .. })));
}

#[test]
fn diamond_with_distinct_writes_merges_in_a_phi() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let left = builder.create_block();
    let right = builder.create_block();
    let join = builder.create_block();
    builder.add_edge(entry, left);
    builder.add_edge(entry, right);
    builder.add_edge(left, join);
    builder.add_edge(right, join);

    let mut ssa = SsaBuilder::new();
    let var = VariableRef::local(0);
    ssa.declare(var, TypeId::INT32);
    for block in [entry, left, right, join] {
        seal(&mut ssa, &mut builder, block);
    }

    let from_left = const_i32(&mut builder, left, 1);
    ssa.write_variable(var, left, from_left);
    let from_right = const_i32(&mut builder, right, 2);
    ssa.write_variable(var, right, from_right);

    let merged = ok(ssa.read_variable(&mut builder, var, join));
    let ops = phi_operands(&builder, merged);
    assert_eq!(ops.len(), 2);
    assert!(ops.contains(&(left, from_left)));
    assert!(ops.contains(&(right, from_right)));
    // Memoized: a second read returns the same phi.
    assert_eq!(ok(ssa.read_variable(&mut builder, var, join)), merged);
}

#[test]
fn diamond_without_writes_folds_the_trivial_phi() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let left = builder.create_block();
    let right = builder.create_block();
    let join = builder.create_block();
    builder.add_edge(entry, left);
    builder.add_edge(entry, right);
    builder.add_edge(left, join);
    builder.add_edge(right, join);

    let mut ssa = SsaBuilder::new();
    let var = VariableRef::local(0);
    ssa.declare(var, TypeId::INT32);
    for block in [entry, left, right, join] {
        seal(&mut ssa, &mut builder, block);
    }

    let def = const_i32(&mut builder, entry, 9);
    ssa.write_variable(var, entry, def);

    // Both arms flow the same definition; the join phi is trivial and the
    // read lands back on the original value.
    assert_eq!(ok(ssa.read_variable(&mut builder, var, join)), def);
}

#[test]
fn loop_with_redefinition_keeps_the_header_phi() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let header = builder.create_block();
    let body = builder.create_block();
    builder.add_edge(entry, header);
    builder.add_edge(header, body);
    builder.add_edge(body, header);

    let mut ssa = SsaBuilder::new();
    let var = VariableRef::local(0);
    ssa.declare(var, TypeId::INT32);
    seal(&mut ssa, &mut builder, entry);

    let init = const_i32(&mut builder, entry, 0);
    ssa.write_variable(var, entry, init);

    // Header is unsealed while the back edge is outstanding: the read
    // plants a placeholder.
    let in_header = ok(ssa.read_variable(&mut builder, var, header));
    assert!(ssa.has_pending());

    seal(&mut ssa, &mut builder, body);
    let next = const_i32(&mut builder, body, 1);
    ssa.write_variable(var, body, next);

    seal(&mut ssa, &mut builder, header);
    assert!(!ssa.has_pending());

    let ops = phi_operands(&builder, in_header);
    assert_eq!(ops.len(), 2);
    assert!(ops.contains(&(entry, init)));
    assert!(ops.contains(&(body, next)));
}

#[test]
fn loop_invariant_variable_folds_to_its_initial_value() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let header = builder.create_block();
    let body = builder.create_block();
    builder.add_edge(entry, header);
    builder.add_edge(header, body);
    builder.add_edge(body, header);

    let mut ssa = SsaBuilder::new();
    let var = VariableRef::local(0);
    ssa.declare(var, TypeId::INT32);
    seal(&mut ssa, &mut builder, entry);

    let init = const_i32(&mut builder, entry, 3);
    ssa.write_variable(var, entry, init);

    let placeholder = ok(ssa.read_variable(&mut builder, var, header));
    seal(&mut ssa, &mut builder, body);
    // Body never writes the variable.
    seal(&mut ssa, &mut builder, header);

    // The placeholder's operands were (init, placeholder): trivial.
    assert_eq!(builder.resolve(placeholder), init);
    assert_eq!(ok(ssa.read_variable(&mut builder, var, header)), init);
}

#[test]
fn read_before_any_definition_is_internal() {
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let mut ssa = SsaBuilder::new();
    let var = VariableRef::local(0);
    ssa.declare(var, TypeId::INT32);
    seal(&mut ssa, &mut builder, entry);

    match ssa.read_variable(&mut builder, var, entry) {
        Err(err) => assert!(err.is_internal()),
        Ok(_) => panic!("undefined read must fail"),
    }
}

#[test]
fn simplify_phis_ripples_through_dependent_phis() {
    // phi_a sits in an earlier block and merges the real value with phi_b,
    // so the scan visits and keeps it before phi_b collapses. Only the
    // rescan discovers that phi_a has become trivial in turn.
    let mut builder = MethodBuilder::new("t");
    let entry = builder.entry();
    let first = builder.create_block();
    let second = builder.create_block();
    builder.add_edge(entry, first);
    builder.add_edge(entry, second);
    builder.add_edge(first, second);
    builder.add_edge(second, first);

    let real = const_i32(&mut builder, entry, 42);
    let phi_a = builder.prepend_phi(first, TypeId::INT32, Location::UNKNOWN);
    let phi_b = builder.prepend_phi(second, TypeId::INT32, Location::UNKNOWN);
    builder.set_phi_operands(phi_a, operands(&[(entry, real), (second, phi_b)]));
    builder.set_phi_operands(phi_b, operands(&[(entry, real), (first, real)]));

    SsaBuilder::simplify_phis(&mut builder);

    assert_eq!(builder.resolve(phi_a), real);
    assert_eq!(builder.resolve(phi_b), real);
}

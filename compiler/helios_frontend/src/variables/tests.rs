use super::*;
use helios_ir::{Instruction, TypeId};

fn method(body: Vec<Instruction>) -> MethodInfo {
    MethodInfo {
        name: "demo.vars".into(),
        params: vec![TypeId::INT32, TypeId::FLOAT32],
        locals: vec![TypeId::INT64],
        is_static: true,
        return_type: TypeId::VOID,
        body,
    }
}

#[test]
fn untouched_variables_are_ssa_eligible() {
    let model = VariableModel::analyze(&method(vec![Instruction::new(OpCode::Return, 0)]));
    assert!(!model.is_address_taken(VariableRef::argument(0)));
    assert!(!model.is_address_taken(VariableRef::local(0)));
    assert!(model.address_taken().is_empty());
    assert_eq!(model.all().len(), 3);
}

#[test]
fn load_address_marks_variable() {
    let body = vec![
        Instruction::new(OpCode::LoadVariableAddress(VariableRef::local(0)), 0),
        Instruction::new(OpCode::Return, 1),
    ];
    let model = VariableModel::analyze(&method(body));
    assert!(model.is_address_taken(VariableRef::local(0)));
    assert!(!model.is_address_taken(VariableRef::argument(0)));

    let taken = model.address_taken();
    assert_eq!(taken.len(), 1);
    assert_eq!(taken[0].0, VariableRef::local(0));
    assert_eq!(taken[0].1.ty, TypeId::INT64);
}

#[test]
fn address_taken_is_conservative() {
    // The address is taken and immediately discarded; the variable is
    // still stack-allocated (over-provisioning is allowed, missing is not).
    let body = vec![
        Instruction::new(OpCode::LoadVariableAddress(VariableRef::argument(1)), 0),
        Instruction::new(OpCode::Return, 1),
    ];
    let model = VariableModel::analyze(&method(body));
    assert!(model.is_address_taken(VariableRef::argument(1)));
}

#[test]
fn declared_types_are_recorded() {
    let model = VariableModel::analyze(&method(vec![Instruction::new(OpCode::Return, 0)]));
    let info = match model.get(VariableRef::argument(1)) {
        Some(info) => *info,
        None => panic!("missing argument 1"),
    };
    assert_eq!(info.ty, TypeId::FLOAT32);
    assert_eq!(info.flags, ArithFlags::empty());
}

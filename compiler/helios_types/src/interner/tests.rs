use super::*;
use std::sync::Arc;

#[test]
fn seeded_types_have_fixed_ids() {
    let interner = TypeInterner::new();
    assert_eq!(interner.intern(TypeNode::Void), TypeId::VOID);
    assert_eq!(interner.intern(TypeNode::Str), TypeId::STR);
    assert_eq!(interner.intern(TypeNode::Handle), TypeId::HANDLE);
    assert_eq!(
        interner.intern(TypeNode::Primitive(BasicKind::Int32)),
        TypeId::INT32
    );
    assert_eq!(
        interner.intern(TypeNode::Primitive(BasicKind::Float64)),
        TypeId::FLOAT64
    );
    assert_eq!(interner.len() as u32, TypeId::FIRST_DYNAMIC);
}

#[test]
fn interning_is_idempotent() {
    let interner = TypeInterner::new();
    let a = interner.pointer(TypeId::INT32, AddressSpace::Global);
    let b = interner.pointer(TypeId::INT32, AddressSpace::Global);
    assert_eq!(a, b);
    // A structurally different shape gets a different id.
    let c = interner.pointer(TypeId::INT32, AddressSpace::Shared);
    assert_ne!(a, c);
    let d = interner.pointer(TypeId::INT64, AddressSpace::Global);
    assert_ne!(a, d);
}

#[test]
fn primitive_metrics() {
    let interner = TypeInterner::new();
    assert_eq!(interner.size(TypeId::VOID), 0);
    assert_eq!(interner.alignment(TypeId::VOID), 1);
    assert_eq!(interner.size(TypeId::INT16), 2);
    assert_eq!(interner.alignment(TypeId::INT16), 2);
    assert_eq!(interner.size(TypeId::FLOAT64), 8);
}

#[test]
fn pointer_metrics_and_flags() {
    let interner = TypeInterner::new();
    let ptr = interner.pointer(TypeId::INT32, AddressSpace::Generic);
    assert_eq!(interner.size(ptr), POINTER_SIZE);
    assert_eq!(interner.alignment(ptr), POINTER_SIZE);
    assert!(interner.flags(ptr).is_pointer_dependent());
    assert!(!interner.flags(ptr).is_view_dependent());
    assert_eq!(interner.element(ptr), Some(TypeId::INT32));
    assert!(interner.is_pointer(ptr));
}

#[test]
fn view_and_array_are_view_dependent() {
    let interner = TypeInterner::new();
    let view = interner.view(TypeId::FLOAT32, AddressSpace::Global);
    assert!(interner.flags(view).is_view_dependent());

    let array = interner.array(TypeId::FLOAT32, 2);
    let flags = interner.flags(array);
    assert!(flags.contains(TypeFlags::ARRAY_DEPENDENT));
    assert!(flags.is_view_dependent());
}

#[test]
fn flags_propagate_through_nesting() {
    let interner = TypeInterner::new();
    let ptr = interner.pointer(TypeId::INT8, AddressSpace::Global);
    // Pointer-to-pointer keeps the dependence bit.
    let ptr_ptr = interner.pointer(ptr, AddressSpace::Generic);
    assert!(interner.flags(ptr_ptr).is_pointer_dependent());
}

#[test]
fn clear_resets_to_seeded_set() {
    let interner = TypeInterner::new();
    let before = interner.pointer(TypeId::INT32, AddressSpace::Global);
    assert!(!interner.is_empty());

    interner.clear();
    assert!(interner.is_empty());

    // Re-interning hands out the same (now-recycled) slot again.
    let after = interner.pointer(TypeId::INT32, AddressSpace::Global);
    assert_eq!(before, after);
}

#[test]
fn concurrent_interning_yields_one_id_per_shape() {
    let interner = Arc::new(TypeInterner::new());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let interner = Arc::clone(&interner);
        handles.push(std::thread::spawn(move || {
            let mut ids = Vec::new();
            for _ in 0..100 {
                ids.push(interner.pointer(TypeId::FLOAT32, AddressSpace::Global));
                ids.push(interner.view(TypeId::FLOAT32, AddressSpace::Global));
            }
            ids
        }));
    }
    let mut all = Vec::new();
    for handle in handles {
        match handle.join() {
            Ok(ids) => all.extend(ids),
            Err(_) => panic!("worker panicked"),
        }
    }
    let ptr = interner.pointer(TypeId::FLOAT32, AddressSpace::Global);
    let view = interner.view(TypeId::FLOAT32, AddressSpace::Global);
    assert!(all.iter().all(|&id| id == ptr || id == view));
}

#[test]
fn direct_field_on_collapsed_type_is_identity() {
    let interner = TypeInterner::new();
    // A non-structure type resolves field 0 to itself (collapse semantics).
    assert_eq!(
        interner.direct_field(TypeId::INT32, 0),
        Some((TypeId::INT32, 0))
    );
    assert_eq!(interner.direct_field(TypeId::INT32, 1), None);
}

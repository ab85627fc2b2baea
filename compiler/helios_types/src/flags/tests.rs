use super::*;

#[test]
fn flags_are_one_byte() {
    assert_eq!(std::mem::size_of::<TypeFlags>(), 1);
}

#[test]
fn propagate_all_unions_children() {
    let combined = TypeFlags::propagate_all([
        TypeFlags::POINTER_DEPENDENT,
        TypeFlags::VIEW_DEPENDENT | TypeFlags::ARRAY_DEPENDENT,
        TypeFlags::empty(),
    ]);
    assert!(combined.contains(TypeFlags::POINTER_DEPENDENT));
    assert!(combined.contains(TypeFlags::VIEW_DEPENDENT));
    assert!(combined.contains(TypeFlags::ARRAY_DEPENDENT));
    assert!(!combined.contains(TypeFlags::STRUCTURE_DEPENDENT));
}

#[test]
fn view_dependence_query() {
    assert!(TypeFlags::VIEW_DEPENDENT.is_view_dependent());
    assert!(!TypeFlags::POINTER_DEPENDENT.is_view_dependent());
    assert!(TypeFlags::POINTER_DEPENDENT.is_pointer_dependent());
}

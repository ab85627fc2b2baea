use super::*;
use crate::node::AddressSpace;
use pretty_assertions::assert_eq;

fn seal_ok(builder: StructBuilder<'_>) -> TypeId {
    match builder.seal() {
        Ok(ty) => ty,
        Err(err) => panic!("seal failed: {err}"),
    }
}

fn add_ok(builder: &mut StructBuilder<'_>, ty: TypeId) {
    if let Err(err) = builder.add(ty) {
        panic!("add failed: {err}");
    }
}

fn structure_data(interner: &TypeInterner, ty: TypeId) -> StructureData {
    match interner.node(ty) {
        TypeNode::Structure(data) => data,
        other => panic!("expected structure, got {other:?}"),
    }
}

#[test]
fn primitive_structure_layout() {
    // {int32, int8, int32} -> offsets {0, 4, 8}, size 12, alignment 4.
    let interner = TypeInterner::new();
    let mut builder = StructBuilder::new(&interner);
    add_ok(&mut builder, TypeId::INT32);
    add_ok(&mut builder, TypeId::INT8);
    add_ok(&mut builder, TypeId::INT32);
    let ty = seal_ok(builder);

    let data = structure_data(&interner, ty);
    assert_eq!(&data.offsets[..3], &[0, 4, 8]);
    assert_eq!(data.size, 12);
    assert_eq!(data.alignment, 4);
    assert_eq!(interner.size(ty), 12);
    assert_eq!(interner.alignment(ty), 4);
}

#[test]
fn nested_structure_flattening() {
    // A = {int16, int16} (size 4, alignment 2); {A, int8} flattens to
    // {int16@0, int16@2, int8@4} with parent size 8 after trailing padding.
    let interner = TypeInterner::new();
    let mut inner = StructBuilder::new(&interner);
    add_ok(&mut inner, TypeId::INT16);
    add_ok(&mut inner, TypeId::INT16);
    let a = seal_ok(inner);
    let a_data = structure_data(&interner, a);
    assert_eq!(a_data.size, 4);
    assert_eq!(a_data.alignment, 2);

    let mut outer = StructBuilder::new(&interner);
    add_ok(&mut outer, a);
    add_ok(&mut outer, TypeId::INT8);
    let ty = seal_ok(outer);

    let data = structure_data(&interner, ty);
    // Flattened: no nested Structure entries.
    for &field in data.fields.iter() {
        assert!(!matches!(interner.node(field), TypeNode::Structure(_)));
    }
    assert_eq!(&data.fields[..3], &[TypeId::INT16, TypeId::INT16, TypeId::INT8]);
    assert_eq!(&data.offsets[..3], &[0, 2, 4]);
    assert_eq!(data.size, 8);
    assert_eq!(data.alignment, 4);
}

#[test]
fn layout_is_monotone_and_aligned() {
    let interner = TypeInterner::new();
    let ptr = interner.pointer(TypeId::FLOAT64, AddressSpace::Global);
    let mut builder = StructBuilder::new(&interner);
    for ty in [TypeId::INT8, TypeId::INT64, TypeId::INT16, ptr, TypeId::BOOL] {
        add_ok(&mut builder, ty);
    }
    let ty = seal_ok(builder);
    let data = structure_data(&interner, ty);

    for i in 0..data.fields.len() {
        let field = data.fields[i];
        assert_eq!(data.offsets[i] % interner.alignment(field), 0);
        if i + 1 < data.fields.len() {
            assert!(data.offsets[i] + interner.size(field) <= data.offsets[i + 1]);
        }
    }
    assert_eq!(data.size % data.alignment, 0);
}

#[test]
fn single_field_collapse() {
    let interner = TypeInterner::new();
    let mut builder = StructBuilder::new(&interner);
    add_ok(&mut builder, TypeId::FLOAT32);
    // Not a wrapper structure: the field's type itself, by identity.
    assert_eq!(seal_ok(builder), TypeId::FLOAT32);
}

#[test]
fn empty_builder_gets_implicit_padding_field() {
    let interner = TypeInterner::new();
    let ty = seal_ok(StructBuilder::new(&interner));
    let data = structure_data(&interner, ty);
    assert_eq!(data.fields.len(), 1);
    assert!(interner.node(data.fields[0]).is_padding());
    assert_eq!(data.size, 1);
    assert_eq!(data.alignment, 1);
}

#[test]
fn explicit_size_is_honored_with_trailing_padding() {
    let interner = TypeInterner::new();
    let mut builder = StructBuilder::new(&interner);
    add_ok(&mut builder, TypeId::INT32);
    builder.set_explicit_size(16);
    let ty = seal_ok(builder);

    let data = structure_data(&interner, ty);
    assert_eq!(data.size, 16);
    // One real field plus padding covering bytes 4..16.
    assert!(!interner.node(data.fields[0]).is_padding());
    let padded: u32 = data.fields[1..]
        .iter()
        .map(|&f| {
            assert!(interner.node(f).is_padding());
            interner.size(f)
        })
        .sum();
    assert_eq!(padded, 12);
}

#[test]
fn nested_explicit_size_advances_parent_offset() {
    let interner = TypeInterner::new();
    let mut inner = StructBuilder::new(&interner);
    add_ok(&mut inner, TypeId::INT32);
    inner.set_explicit_size(16);
    let a = seal_ok(inner);
    assert_eq!(interner.size(a), 16);

    let mut outer = StructBuilder::new(&interner);
    add_ok(&mut outer, a);
    add_ok(&mut outer, TypeId::INT32);
    let ty = seal_ok(outer);

    let data = structure_data(&interner, ty);
    // The int32 lands after A's full declared size, not after its fields.
    let field_offset = match data.direct_offset(1) {
        Some(offset) => offset,
        None => panic!("missing direct field 1"),
    };
    assert_eq!(field_offset, 16);
}

#[test]
fn view_dependent_structures_skip_trailing_padding() {
    let interner = TypeInterner::new();
    let view = interner.view(TypeId::FLOAT32, AddressSpace::Global);
    let mut builder = StructBuilder::new(&interner);
    add_ok(&mut builder, view);
    add_ok(&mut builder, TypeId::INT8);
    let ty = seal_ok(builder);

    let data = structure_data(&interner, ty);
    assert!(data.fields.iter().all(|&f| !interner.node(f).is_padding()));
    // Raw running offset, unrounded: size is not yet meaningful.
    assert_eq!(data.size, 17);
}

#[test]
fn reference_fields_are_rejected() {
    let interner = TypeInterner::new();
    let mut builder = StructBuilder::new(&interner);
    match builder.add(TypeId::STR) {
        Err(err) => assert!(!err.is_internal()),
        Ok(()) => panic!("str field must be rejected"),
    }
    match builder.add(TypeId::VOID) {
        Err(_) => {}
        Ok(()) => panic!("void field must be rejected"),
    }
}

#[test]
fn direct_field_resolution() {
    let interner = TypeInterner::new();
    let mut inner = StructBuilder::new(&interner);
    add_ok(&mut inner, TypeId::INT16);
    add_ok(&mut inner, TypeId::INT16);
    let a = seal_ok(inner);

    let mut outer = StructBuilder::new(&interner);
    add_ok(&mut outer, a);
    add_ok(&mut outer, TypeId::INT64);
    let ty = seal_ok(outer);

    // Flattened indices: A expands to two entries, so int64 starts at 2.
    assert_eq!(interner.direct_field(ty, 0), Some((a, 0)));
    assert_eq!(interner.direct_field(ty, 1), Some((TypeId::INT64, 2)));
    let data = structure_data(&interner, ty);
    assert_eq!(data.direct_offset(1), Some(8));
}

mod vectors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn four_contiguous_floats_form_one_chunk() {
        let interner = TypeInterner::new();
        let fields = [TypeId::FLOAT32; 4];
        let offsets = [0, 4, 8, 12];
        let chunks = vector_chunks(&fields, &offsets, &interner, 16);
        assert_eq!(chunks, vec![VectorChunk { start: 0, len: 4 }]);
    }

    #[test]
    fn max_width_caps_chunk_size() {
        let interner = TypeInterner::new();
        let fields = [TypeId::FLOAT32; 4];
        let offsets = [0, 4, 8, 12];
        // 16-byte chunks are too wide; two 8-byte pairs instead.
        let chunks = vector_chunks(&fields, &offsets, &interner, 8);
        assert_eq!(
            chunks,
            vec![
                VectorChunk { start: 0, len: 2 },
                VectorChunk { start: 2, len: 2 },
            ]
        );
    }

    #[test]
    fn misaligned_base_is_bisected() {
        let interner = TypeInterner::new();
        let fields = [TypeId::FLOAT32; 4];
        // Base offset 4 is not 16-aligned, and a pair at 4 is not 8-aligned:
        // only the pair at offset 8 survives.
        let offsets = [4, 8, 12, 16];
        let chunks = vector_chunks(&fields, &offsets, &interner, 16);
        assert_eq!(chunks, vec![VectorChunk { start: 1, len: 2 }]);
    }

    #[test]
    fn runs_break_on_type_change_or_gap() {
        let interner = TypeInterner::new();
        let fields = [TypeId::INT32, TypeId::INT32, TypeId::FLOAT32, TypeId::FLOAT32];
        let offsets = [0, 4, 8, 12];
        // Type change at index 2 splits the run; both pairs still chunk.
        let chunks = vector_chunks(&fields, &offsets, &interner, 16);
        assert_eq!(
            chunks,
            vec![
                VectorChunk { start: 0, len: 2 },
                VectorChunk { start: 2, len: 2 },
            ]
        );
        // A gap breaks contiguity entirely.
        let gappy = [0, 4, 12, 16];
        let fields = [TypeId::INT32; 4];
        let chunks = vector_chunks(&fields, &gappy, &interner, 16);
        assert_eq!(chunks, vec![VectorChunk { start: 0, len: 2 }]);
    }

    #[test]
    fn non_scalar_fields_never_chunk() {
        let interner = TypeInterner::new();
        let ptr = interner.pointer(TypeId::INT32, AddressSpace::Global);
        let fields = [ptr, ptr];
        let offsets = [0, 8];
        assert!(vector_chunks(&fields, &offsets, &interner, 16).is_empty());
    }
}

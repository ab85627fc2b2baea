use super::*;
use pretty_assertions::assert_eq;

#[test]
fn unsupported_carries_location_and_member() {
    let err = FrontendError::unsupported_member(
        UnsupportedReason::ForbiddenNamespace,
        "runtime.reflect.TypeOf",
        Location::new(12),
    );
    let text = err.to_string();
    assert!(text.contains("offset 12"), "missing location: {text}");
    assert!(text.contains("runtime.reflect.TypeOf"), "missing member: {text}");
}

#[test]
fn frames_accumulate_innermost_first() {
    let err = FrontendError::unsupported(UnsupportedReason::IndirectCall, Location::new(4))
        .with_frame("lib.inner", Location::new(9))
        .with_frame("app.outer", Location::new(2));

    let frames = err.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].method, "lib.inner");
    assert_eq!(frames[0].location, Location::new(9));
    assert_eq!(frames[1].method, "app.outer");

    let text = err.to_string();
    let inner_pos = match text.find("lib.inner") {
        Some(pos) => pos,
        None => panic!("missing inner frame: {text}"),
    };
    let outer_pos = match text.find("app.outer") {
        Some(pos) => pos,
        None => panic!("missing outer frame: {text}"),
    };
    assert!(inner_pos < outer_pos);
}

#[test]
fn internal_errors_are_never_rewrapped() {
    let err = FrontendError::internal("unsealed block b3", Location::new(7));
    assert!(err.is_internal());

    let wrapped = err.clone().with_frame("app.outer", Location::new(1));
    assert_eq!(wrapped, err);
    assert!(wrapped.frames().is_empty());
}

#[test]
fn structural_errors_take_frames() {
    let err = FrontendError::structural("class types are not value types")
        .with_frame("app.main", Location::new(0));
    assert_eq!(err.frames().len(), 1);
    assert!(!err.is_internal());
}

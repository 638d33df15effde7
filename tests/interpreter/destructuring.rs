//! Destructuring: var/let patterns, nested patterns, assignment targets,
//! parameters.

use super::eval;

#[test]
fn test_array_pattern() {
    assert_eq!(eval("var [a, b] = [1, 2]; a + b"), "3");
}

#[test]
fn test_nested_array_pattern() {
    // Spec scenario (e).
    assert_eq!(eval("var [a, b, [c, d]] = [1, 2, [3, 4]]; a + b + c + d"), "10");
}

#[test]
fn test_array_pattern_with_holes() {
    assert_eq!(eval("var [, b] = [1, 2]; b"), "2");
    assert_eq!(eval("var [a, , c] = [1, 2, 3]; a + c"), "4");
}

#[test]
fn test_object_pattern() {
    assert_eq!(eval("var {a: x, b: y} = {a: 1, b: 2}; x + y"), "3");
}

#[test]
fn test_object_pattern_shorthand() {
    assert_eq!(eval("var {a, b} = {a: 4, b: 5}; a + b"), "9");
}

#[test]
fn test_mixed_nested_pattern() {
    assert_eq!(
        eval("var {a: [x, y], b: {c: z}} = {a: [1, 2], b: {c: 3}}; x + y + z"),
        "6"
    );
}

#[test]
fn test_missing_source_properties_are_undefined() {
    assert_eq!(eval("var [a, b] = [1]; typeof b"), "undefined");
    assert_eq!(eval("var {q: v} = {}; typeof v"), "undefined");
}

#[test]
fn test_destructuring_assignment_expression() {
    assert_eq!(eval("var a, b; [a, b] = [7, 8]; a + b"), "15");
    assert_eq!(eval("var x; ({a: x} = {a: 9}); x"), "9");
}

#[test]
fn test_let_pattern() {
    assert_eq!(eval("var r; { let [a, b] = [10, 20]; r = a + b; } r"), "30");
}

#[test]
fn test_pattern_in_parameters() {
    assert_eq!(
        eval("function f([a, b], {c: d}) { return a * b * d; } f([2, 3], {c: 4})"),
        "24"
    );
}

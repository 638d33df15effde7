//! Objects: literals, property access, prototype chains, accessors,
//! delete/in/instanceof, extensibility.

use super::{eval, eval_err};
use scriptling::ErrorKind;

#[test]
fn test_object_literal_and_member_access() {
    assert_eq!(eval("var o = {a: 1, b: 2}; o.a + o.b"), "3");
    assert_eq!(eval("var o = {a: 1}; o['a']"), "1");
    assert_eq!(eval("var o = {}; o.x = 5; o.x"), "5");
    assert_eq!(eval("var o = {'quoted key': 7}; o['quoted key']"), "7");
    assert_eq!(eval("var o = {1: 'one'}; o[1]"), "one");
}

#[test]
fn test_nested_objects() {
    assert_eq!(eval("var o = {a: {b: {c: 42}}}; o.a.b.c"), "42");
}

#[test]
fn test_missing_property_is_undefined() {
    assert_eq!(eval("var o = {}; o.missing"), "undefined");
    assert_eq!(eval("typeof ({}).missing"), "undefined");
}

#[test]
fn test_member_of_nullish_is_reference_error() {
    assert_eq!(eval_err("var o; o.x"), ErrorKind::ReferenceError);
    assert_eq!(eval_err("null.x"), ErrorKind::ReferenceError);
}

#[test]
fn test_array_literal_and_length() {
    assert_eq!(eval("var a = [1, 2, 3]; a[0] + a[2]"), "4");
    assert_eq!(eval("[1, 2, 3].length"), "3");
    assert_eq!(eval("var a = []; a[4] = 1; a.length"), "5");
    assert_eq!(eval("[1, 2]"), "1, 2");
}

#[test]
fn test_array_holes() {
    assert_eq!(eval("var a = [1, , 3]; typeof a[1]"), "undefined");
    assert_eq!(eval("var a = [1, , 3]; a.length"), "3");
}

#[test]
fn test_getter() {
    // Spec scenario (c): assignment through a getter-only accessor is
    // silently ignored.
    assert_eq!(eval("var o = {get x() { return 42; }}; o.x"), "42");
    assert_eq!(
        eval("var o = {get x() { return 42; }}; o.x = 7; o.x"),
        "42"
    );
}

#[test]
fn test_getter_and_setter() {
    assert_eq!(
        eval(
            "var o = {_v: 0, get v() { return this._v; }, set v(nv) { this._v = nv * 2; }}; \
             o.v = 21; o.v"
        ),
        "42"
    );
}

#[test]
fn test_prototype_chain_via_new() {
    assert_eq!(
        eval("function A() { this.x = 1; } A.prototype.y = 2; var a = new A(); a.x + a.y"),
        "3"
    );
}

#[test]
fn test_instanceof() {
    assert_eq!(eval("function A() {} var a = new A(); a instanceof A"), "true");
    assert_eq!(
        eval("function A() {} function B() {} var a = new A(); a instanceof B"),
        "false"
    );
    assert_eq!(eval_err("1 instanceof 2"), ErrorKind::TypeError);
}

#[test]
fn test_new_on_non_function_is_type_error() {
    assert_eq!(eval_err("var x = 1; new x()"), ErrorKind::TypeError);
}

#[test]
fn test_in_operator() {
    assert_eq!(eval("'a' in {a: 1}"), "true");
    assert_eq!(eval("'b' in {a: 1}"), "false");
    // `in` sees the prototype chain.
    assert_eq!(
        eval("function A() {} A.prototype.p = 1; 'p' in new A()"),
        "true"
    );
}

#[test]
fn test_delete() {
    assert_eq!(eval("var o = {a: 1}; delete o.a; 'a' in o"), "false");
    assert_eq!(eval("var o = {a: 1}; delete o.a"), "true");
    assert_eq!(eval("var o = {}; delete o.missing"), "false");
}

#[test]
fn test_has_own_property() {
    assert_eq!(eval("({a: 1}).hasOwnProperty('a')"), "true");
    assert_eq!(eval("({a: 1}).hasOwnProperty('b')"), "false");
    // Inherited properties are not own.
    assert_eq!(
        eval("function A() {} A.prototype.p = 1; (new A()).hasOwnProperty('p')"),
        "false"
    );
}

#[test]
fn test_prevent_extensions() {
    assert_eq!(
        eval("var o = {}; Object.preventExtensions(o); o.x = 1; typeof o.x"),
        "undefined"
    );
    assert_eq!(eval("var o = {}; Object.isExtensible(o)"), "true");
    assert_eq!(
        eval("var o = {}; Object.preventExtensions(o); Object.isExtensible(o)"),
        "false"
    );
}

#[test]
fn test_get_prototype_of() {
    assert_eq!(
        eval("function A() {} var a = new A(); Object.getPrototypeOf(a) == A.prototype"),
        "true"
    );
}

#[test]
fn test_object_to_string() {
    assert_eq!(eval("({})"), "[object Object]");
    assert_eq!(eval("'' + {}"), "[object Object]");
}

#[test]
fn test_custom_to_string_is_used() {
    assert_eq!(
        eval("var o = {toString: function() { return 'custom'; }}; '' + o"),
        "custom"
    );
}

#[test]
fn test_custom_value_of_is_used() {
    assert_eq!(
        eval("var o = {valueOf: function() { return 6; }}; o * 7"),
        "42"
    );
}

#[test]
fn test_boxed_primitives() {
    assert_eq!(eval("new String('x') + 'y'"), "xy");
    assert_eq!(eval("new Number(41) + 1"), "42");
    assert_eq!(eval("typeof new Number(1)"), "object");
}

#[test]
fn test_enumeration_skips_hidden_slots() {
    // __proto__ and the length accessor are not enumerable.
    assert_eq!(
        eval("var ks = ''; for (var k in {a: 1}) ks += k; ks"),
        "a"
    );
    assert_eq!(
        eval("var ks = ''; var a = [7]; for (var k in a) ks += k; ks"),
        "0"
    );
}

//! Scopes: var hoisting, let block scoping, let expressions, with.

use super::eval;

#[test]
fn test_var_hoists_to_function() {
    assert_eq!(eval("function f() { { var x = 1; } return x; } f()"), "1");
    assert_eq!(eval("typeof x; var x = 1; typeof x"), "number");
}

#[test]
fn test_let_is_block_scoped() {
    assert_eq!(eval("var x = 1; { let x = 2; } x"), "1");
    assert_eq!(eval("var r; { let x = 2; r = x; } r"), "2");
}

#[test]
fn test_let_shadowing_restores_outer() {
    assert_eq!(
        eval("let x = 'outer'; var r = ''; { let x = 'inner'; r += x; } r += x; r"),
        "innerouter"
    );
}

#[test]
fn test_let_at_function_root_behaves_like_var() {
    assert_eq!(eval("let a = 1; let a = 2; a"), "2");
}

#[test]
fn test_let_expression() {
    assert_eq!(eval("var r = let (x = 5) x + 1; r"), "6");
    // Initializers see the enclosing scope, not the new bindings.
    assert_eq!(eval("var x = 1; var r = let (x = x + 10) x; r"), "11");
}

#[test]
fn test_let_statement_form() {
    assert_eq!(eval("var r; let (a = 2, b = 3) { r = a * b; } r"), "6");
}

#[test]
fn test_with_scope_lookup_and_fallthrough() {
    assert_eq!(eval("var o = {a: 1}; var b = 9; var r; with (o) { r = a + b; } r"), "10");
    // `this` inside with is the wrapped object.
    assert_eq!(eval("var o = {a: 3}; var r; with (o) { r = this.a; } r"), "3");
}

#[test]
fn test_with_sees_prototype_chain() {
    assert_eq!(
        eval(
            "function A() {} A.prototype.p = 'proto'; var a = new A(); var r; \
             with (a) { r = p; } r"
        ),
        "proto"
    );
}

#[test]
fn test_with_assignment_to_prototype_property_shadows() {
    assert_eq!(
        eval(
            "function A() {} A.prototype.p = 1; var a = new A(); \
             with (a) { p = 2; } a.hasOwnProperty('p') + ',' + A.prototype.p"
        ),
        "true,1"
    );
}

#[test]
fn test_nested_function_scopes() {
    assert_eq!(
        eval(
            "var x = 'global'; function outer() { var x = 'outer'; \
             function inner() { return x; } return inner(); } outer()"
        ),
        "outer"
    );
}

#[test]
fn test_block_without_lets_shares_scope() {
    assert_eq!(eval("var r = 0; { r = 1; { r = 2; } } r"), "2");
}

//! Functions: declarations, hoisting, closures, arguments, call/apply,
//! recursion, the Function constructor.

use super::{eval, eval_err};
use scriptling::ErrorKind;

#[test]
fn test_function_declaration_and_call() {
    assert_eq!(eval("function add(a, b) { return a + b; } add(2, 3)"), "5");
}

#[test]
fn test_function_hoisting() {
    // Callable before its declaration.
    assert_eq!(eval("var r = f(); function f() { return 'hoisted'; } r"), "hoisted");
}

#[test]
fn test_recursion() {
    // Spec scenario (b).
    assert_eq!(
        eval("function f(n) { return n < 2 ? n : f(n-1) + f(n-2); } f(10)"),
        "55"
    );
}

#[test]
fn test_function_expression() {
    assert_eq!(eval("var f = function(x) { return x * 2; }; f(21)"), "42");
    // Named function expressions can recurse through their own name.
    assert_eq!(
        eval("var f = function fact(n) { return n < 2 ? 1 : n * fact(n - 1); }; f(5)"),
        "120"
    );
}

#[test]
fn test_lambda_expression_body() {
    assert_eq!(eval("var f = function(a) a * 2;\nf(21)"), "42");
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(eval("function f(a, b) { return typeof b; } f(1)"), "undefined");
}

#[test]
fn test_arguments_object() {
    assert_eq!(
        eval("function f() { return arguments.length; } f(1, 2, 3)"),
        "3"
    );
    assert_eq!(
        eval("function f() { return arguments[0] + arguments[1]; } f(40, 2)"),
        "42"
    );
}

#[test]
fn test_closures_capture_environment() {
    assert_eq!(
        eval(
            "function counter() { var n = 0; return function() { n++; return n; }; } \
             var c = counter(); c(); c(); c()"
        ),
        "3"
    );
    // Independent instances.
    assert_eq!(
        eval(
            "function counter() { var n = 0; return function() { n++; return n; }; } \
             var a = counter(); var b = counter(); a(); a(); b()"
        ),
        "1"
    );
}

#[test]
fn test_this_binding() {
    assert_eq!(
        eval("var o = {v: 7, get_v: function() { return this.v; }}; o.get_v()"),
        "7"
    );
}

#[test]
fn test_call_and_apply() {
    assert_eq!(
        eval("function add(a, b) { return a + b; } add.call(null, 1, 2)"),
        "3"
    );
    assert_eq!(
        eval("function add(a, b) { return a + b; } add.apply(null, [3, 4])"),
        "7"
    );
    assert_eq!(
        eval("var o = {v: 5}; function get_v() { return this.v; } get_v.call(o)"),
        "5"
    );
}

#[test]
fn test_apply_requires_array_like() {
    assert_eq!(
        eval_err("function f() {} f.apply(null, 5)"),
        ErrorKind::TypeError
    );
}

#[test]
fn test_function_constructor() {
    assert_eq!(eval("var f = new Function('a', 'b', 'return a + b'); f(2, 3)"), "5");
}

#[test]
fn test_calling_non_function_is_type_error() {
    assert_eq!(eval_err("var x = 1; x()"), ErrorKind::TypeError);
    assert_eq!(eval_err("var o = {}; o.missing()"), ErrorKind::TypeError);
}

#[test]
fn test_function_length_and_constructor_return() {
    // A constructor returning an object overrides the fresh instance.
    assert_eq!(
        eval("function A() { return {custom: 1}; } (new A()).custom"),
        "1"
    );
    // A primitive return value does not.
    assert_eq!(
        eval("function A() { this.x = 2; return 5; } (new A()).x"),
        "2"
    );
}

#[test]
fn test_destructured_parameters() {
    assert_eq!(
        eval("function f([a, b], {c: d}) { return a + b + d; } f([1, 2], {c: 3})"),
        "6"
    );
}

#[test]
fn test_deep_recursion_is_bounded() {
    assert_eq!(
        eval_err("function f() { return f(); } f()"),
        ErrorKind::Error
    );
}

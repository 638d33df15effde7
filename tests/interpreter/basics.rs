//! Basic language features: arithmetic, coercion, comparison, variables,
//! conditionals, typeof.

use super::{eval, eval_err};
use scriptling::ErrorKind;

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 2 * 3"), "7");
    assert_eq!(eval("(1 + 2) * 3"), "9");
    assert_eq!(eval("10 - 4"), "6");
    assert_eq!(eval("15 / 3"), "5");
    assert_eq!(eval("10 % 3"), "1");
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(eval("5 / 2"), "2");
    assert_eq!(eval("5.0 / 2"), "2.5");
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval("1 / 0"), "Infinity");
    assert_eq!(eval("-1 / 0"), "-Infinity");
    assert_eq!(eval("0 / 0"), "NaN");
    assert_eq!(eval("5 % 0"), "NaN");
}

#[test]
fn test_infinity_arithmetic_matrix() {
    assert_eq!(eval("Infinity + Infinity"), "Infinity");
    assert_eq!(eval("Infinity - Infinity"), "NaN");
    assert_eq!(eval("0 * Infinity"), "NaN");
    assert_eq!(eval("Infinity / Infinity"), "NaN");
    assert_eq!(eval("Infinity + 1"), "Infinity");
    assert_eq!(eval("1 / Infinity"), "0");
    assert_eq!(eval("2 * Infinity"), "Infinity");
    assert_eq!(eval("-2 * Infinity"), "-Infinity");
}

#[test]
fn test_nan_comparisons() {
    assert_eq!(eval("NaN === NaN"), "false");
    assert_eq!(eval("NaN !== NaN"), "true");
    assert_eq!(eval("NaN == NaN"), "false");
    assert_eq!(eval("NaN != NaN"), "true");
    assert_eq!(eval("NaN < 1"), "false");
}

#[test]
fn test_equality_and_identity() {
    assert_eq!(eval("1 == 1"), "true");
    assert_eq!(eval("'5' == 5"), "true");
    assert_eq!(eval("'5' === 5"), "false");
    assert_eq!(eval("null == undefined"), "true");
    assert_eq!(eval("null === undefined"), "false");
    assert_eq!(eval("1 === 1"), "true");
    assert_eq!(eval("1 !== 2"), "true");
}

#[test]
fn test_string_concatenation_and_comparison() {
    assert_eq!(eval("'foo' + 'bar'"), "foobar");
    assert_eq!(eval("'foo' + 5"), "foo5");
    assert_eq!(eval("5 + 'foo'"), "5foo");
    assert_eq!(eval("'a' < 'b'"), "true");
    assert_eq!(eval("'abc' == 'abc'"), "true");
}

#[test]
fn test_string_to_number_coercion() {
    assert_eq!(eval("'5' - 2"), "3");
    assert_eq!(eval("'0x10' - 0"), "16");
    assert_eq!(eval("'x' - 1"), "NaN");
    assert_eq!(eval("null + 1"), "1");
    assert_eq!(eval("undefined + 1"), "NaN");
}

#[test]
fn test_bitwise_and_shift() {
    assert_eq!(eval("8 << 2"), "32");
    assert_eq!(eval("32 >> 2"), "8");
    assert_eq!(eval("-8 >> 2"), "-2");
    assert_eq!(eval("8 >>> 1"), "4");
    assert_eq!(eval("5 & 3"), "1");
    assert_eq!(eval("5 | 3"), "7");
    assert_eq!(eval("5 ^ 3"), "6");
    assert_eq!(eval("~0"), "-1");
}

#[test]
fn test_logic_operators() {
    assert_eq!(eval("true && false"), "false");
    assert_eq!(eval("1 && 2"), "2");
    assert_eq!(eval("0 || 3"), "3");
    assert_eq!(eval("1 || sideEffectNotEvaluated()"), "1");
    assert_eq!(eval("!0"), "true");
    assert_eq!(eval("!'x'"), "false");
}

#[test]
fn test_ternary_and_comma() {
    assert_eq!(eval("true ? 1 : 2"), "1");
    assert_eq!(eval("false ? 1 : 2"), "2");
    assert_eq!(eval("1, 2, 3"), "3");
}

#[test]
fn test_variables_and_compound_assignment() {
    assert_eq!(eval("var x = 5; x"), "5");
    assert_eq!(eval("var x = 5; x = 10; x"), "10");
    assert_eq!(eval("var x = 5; x += 3; x"), "8");
    assert_eq!(eval("var x = 32; x >>>= 2; x"), "8");
    assert_eq!(eval("var x = 6; x *= 7; x"), "42");
}

#[test]
fn test_increment_decrement() {
    assert_eq!(eval("var x = 5; x++"), "5");
    assert_eq!(eval("var x = 5; x++; x"), "6");
    assert_eq!(eval("var x = 5; ++x"), "6");
    assert_eq!(eval("var x = 5; --x; x"), "4");
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof undefined"), "undefined");
    assert_eq!(eval("typeof null"), "object");
    assert_eq!(eval("typeof true"), "boolean");
    assert_eq!(eval("typeof 1"), "number");
    assert_eq!(eval("typeof 1.5"), "number");
    assert_eq!(eval("typeof NaN"), "number");
    assert_eq!(eval("typeof 'x'"), "string");
    assert_eq!(eval("typeof {}"), "object");
    assert_eq!(eval("typeof function(){}"), "function");
    assert_eq!(eval("typeof new String('x')"), "object");
}

#[test]
fn test_void() {
    assert_eq!(eval("void 0"), "undefined");
    assert_eq!(eval("typeof void 'x'"), "undefined");
}

#[test]
fn test_asi() {
    assert_eq!(eval("var a = 1\nvar b = 2\na + b"), "3");
}

#[test]
fn test_hex_and_float_literals() {
    assert_eq!(eval("0x10"), "16");
    assert_eq!(eval(".5 * 2"), "1");
    assert_eq!(eval("1e-2"), "0.01");
}

#[test]
fn test_undefined_variable_is_reference_error() {
    assert_eq!(eval_err("noSuchThing"), ErrorKind::ReferenceError);
    assert_eq!(eval_err("noSuchThing + 1"), ErrorKind::ReferenceError);
}

#[test]
fn test_implicit_global_creation_on_assignment() {
    assert_eq!(eval("implicit = 4; implicit + 1"), "5");
}

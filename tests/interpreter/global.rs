//! Global functions: eval, parseInt, parseFloat, isNaN, isFinite, and the
//! global constants.

use super::eval;

#[test]
fn test_eval_runs_in_caller_scope() {
    assert_eq!(eval("eval('1 + 2')"), "3");
    assert_eq!(eval("var x = 40; eval('x + 2')"), "42");
    assert_eq!(eval("var x = 1; eval('x = 9'); x"), "9");
}

#[test]
fn test_eval_syntax_errors_are_catchable() {
    assert_eq!(
        eval("var r; try { eval('1 +'); } catch (e) { r = e instanceof SyntaxError; } r"),
        "true"
    );
}

#[test]
fn test_eval_thrown_values_propagate() {
    assert_eq!(
        eval("var r; try { eval('throw 7;'); } catch (e) { r = e; } r"),
        "7"
    );
}

#[test]
fn test_parse_int() {
    assert_eq!(eval("parseInt('42')"), "42");
    assert_eq!(eval("parseInt('42abc')"), "42");
    assert_eq!(eval("parseInt('ff', 16)"), "255");
    assert_eq!(eval("parseInt('0x1f')"), "31");
    assert_eq!(eval("parseInt('zzz')"), "NaN");
}

#[test]
fn test_parse_float() {
    assert_eq!(eval("parseFloat('2.5')"), "2.5");
    assert_eq!(eval("parseFloat('2.5rest')"), "2.5");
    assert_eq!(eval("parseFloat('nope')"), "NaN");
}

#[test]
fn test_is_nan() {
    assert_eq!(eval("isNaN(NaN)"), "true");
    assert_eq!(eval("isNaN('x')"), "true");
    assert_eq!(eval("isNaN(5)"), "false");
    assert_eq!(eval("isNaN('5')"), "false");
}

#[test]
fn test_is_finite() {
    assert_eq!(eval("isFinite(1)"), "true");
    assert_eq!(eval("isFinite(1 / 0)"), "false");
    assert_eq!(eval("isFinite(NaN)"), "false");
}

#[test]
fn test_global_constants() {
    assert_eq!(eval("undefined"), "undefined");
    assert_eq!(eval("NaN"), "NaN");
    assert_eq!(eval("Infinity"), "Infinity");
    assert_eq!(eval("-Infinity"), "-Infinity");
}

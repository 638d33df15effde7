//! Exceptions: throw, try/catch (with guards), finally, error objects,
//! uncaught propagation to the host.

use super::{eval, eval_err};
use scriptling::ErrorKind;

#[test]
fn test_throw_and_catch() {
    assert_eq!(eval("var r; try { throw 'boom'; } catch (e) { r = e; } r"), "boom");
    assert_eq!(
        eval("var r = 'no'; try { r = 'ok'; } catch (e) { r = 'caught'; } r"),
        "ok"
    );
}

#[test]
fn test_catch_guards() {
    // Spec scenario (d): the guard selects the second catch; finally always
    // runs.
    assert_eq!(
        eval(
            "var r = ''; try { throw {m: 1}; } catch (e if e.m == 2) { r += 'a'; } \
             catch (e) { r += 'b'; } finally { r += 'c'; } r"
        ),
        "bc"
    );
    assert_eq!(
        eval(
            "var r = ''; try { throw {m: 2}; } catch (e if e.m == 2) { r += 'a'; } \
             catch (e) { r += 'b'; } finally { r += 'c'; } r"
        ),
        "ac"
    );
}

#[test]
fn test_trailing_statement_after_try_runs() {
    assert_eq!(
        eval("var r = ''; try { throw 1; } catch (e) { r = 'c'; } r + 'x'"),
        "cx"
    );
}

#[test]
fn test_finally_runs_without_exception() {
    assert_eq!(
        eval("var r = ''; try { r += 'a'; } finally { r += 'f'; } r"),
        "af"
    );
}

#[test]
fn test_nested_try_rethrow() {
    assert_eq!(
        eval(
            "var r = ''; try { try { throw 'inner'; } finally { r += 'f'; } } \
             catch (e) { r += e; } r"
        ),
        "finner"
    );
}

#[test]
fn test_uncaught_throw_reaches_host() {
    assert_eq!(eval_err("throw 'kaboom';"), ErrorKind::Error);
}

#[test]
fn test_runtime_errors_are_catchable() {
    assert_eq!(
        eval("var r; try { missing + 1; } catch (e) { r = e instanceof ReferenceError; } r"),
        "true"
    );
    assert_eq!(
        eval("var r; try { null.x; } catch (e) { r = 'caught'; } r"),
        "caught"
    );
}

#[test]
fn test_error_object_fields() {
    assert_eq!(eval("var e = new Error('msg'); e.message"), "msg");
    assert_eq!(eval("var e = new Error('msg'); e.name"), "Error");
    assert_eq!(eval("var e = new TypeError('t'); e.name"), "TypeError");
    assert_eq!(
        eval("var e = new RangeError('r', 'file.js', 3, 7); e.fileName + ':' + e.lineNumber + ':' + e.column"),
        "file.js:3:7"
    );
}

#[test]
fn test_error_prototype_chain() {
    assert_eq!(eval("new TypeError('x') instanceof TypeError"), "true");
    assert_eq!(eval("new TypeError('x') instanceof Error"), "true");
    assert_eq!(eval("new Error('x') instanceof TypeError"), "false");
}

#[test]
fn test_caught_runtime_error_has_fields() {
    assert_eq!(
        eval("var r; try { missing; } catch (e) { r = e.message; } r"),
        "missing is not defined"
    );
}

#[test]
fn test_exceptions_unwind_loops() {
    assert_eq!(
        eval(
            "var r = ''; try { for (var i = 0; i < 9; i++) { r += i; if (i == 2) throw 'x'; } } \
             catch (e) { r += e; } r"
        ),
        "012x"
    );
}

#[test]
fn test_interpreter_recovers_after_error() {
    let mut interp = scriptling::Interpreter::new();
    assert!(interp.evaluate("missing").is_err());
    assert_eq!(interp.evaluate("1 + 1").unwrap_or_default(), "2");
}

#[test]
fn test_error_kinds_from_host_perspective() {
    assert_eq!(eval_err("missing"), ErrorKind::ReferenceError);
    assert_eq!(eval_err("var x = 1; x()"), ErrorKind::TypeError);
    assert_eq!(eval_err("var x = 'a b;"), ErrorKind::SyntaxError);
}

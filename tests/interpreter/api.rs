//! Embedding API: native registration, host-initiated calls, value links.

use std::cell::RefCell;
use std::rc::Rc;

use scriptling::{ErrorKind, Interpreter, ScriptError};

#[test]
fn test_add_native_function() {
    let mut interp = Interpreter::new();
    interp
        .add_native("function double(n)", |interp, scope| {
            let n = interp.native_arg_named(scope, "n").borrow().get_int();
            let result = interp.new_int(n * 2);
            interp.native_return(scope, result);
            Ok(())
        })
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(interp.evaluate("double(21)").unwrap_or_default(), "42");
}

#[test]
fn test_add_native_dotted_path_creates_containers() {
    let mut interp = Interpreter::new();
    interp
        .add_native("function app.math.add(a, b)", |interp, scope| {
            let a = interp.native_arg_named(scope, "a").borrow().get_int();
            let b = interp.native_arg_named(scope, "b").borrow().get_int();
            let result = interp.new_int(a + b);
            interp.native_return(scope, result);
            Ok(())
        })
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(interp.evaluate("typeof app").unwrap_or_default(), "object");
    assert_eq!(interp.evaluate("app.math.add(40, 2)").unwrap_or_default(), "42");
}

#[test]
fn test_native_side_effects_via_closure() {
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let mut interp = Interpreter::new();
    interp
        .add_native("function log(message)", move |interp, scope| {
            let message = interp.native_arg_named(scope, "message");
            let mut execute = true;
            let text = interp.coerce_string(&mut execute, &message)?;
            sink.borrow_mut().push(text);
            Ok(())
        })
        .unwrap_or_else(|e| panic!("{}", e));
    interp
        .evaluate("for (var i = 0; i < 3; i++) log('n' + i);")
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(log.borrow().as_slice(), ["n0", "n1", "n2"]);
}

#[test]
fn test_native_errors_are_script_catchable() {
    let mut interp = Interpreter::new();
    interp
        .add_native("function fail()", |_, _| {
            Err(ScriptError::new(
                ErrorKind::RangeError,
                "nope",
                "",
                0,
                0,
            ))
        })
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(
        interp
            .evaluate("var r; try { fail(); } catch (e) { r = e instanceof RangeError; } r")
            .unwrap_or_default(),
        "true"
    );
    // Outside a try it surfaces to the host.
    assert!(interp.evaluate("fail()").is_err());
}

#[test]
fn test_call_function_from_host() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("function mul(a, b) { return a * b; }")
        .unwrap_or_else(|e| panic!("{}", e));
    let func = interp
        .evaluate_link("mul")
        .unwrap_or_else(|e| panic!("{}", e));
    let args = vec![interp.new_int(6), interp.new_int(7)];
    let result = interp
        .call_function(&func.var(), args, None)
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(result.borrow().get_int(), 42);
}

#[test]
fn test_call_function_uncaught_throw() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("function boom() { throw 'pow'; }")
        .unwrap_or_else(|e| panic!("{}", e));
    let func = interp
        .evaluate_link("boom")
        .unwrap_or_else(|e| panic!("{}", e));
    let err = interp.call_function(&func.var(), Vec::new(), None);
    assert!(matches!(err, Err(ScriptError::Thrown)));
    let exception = interp.take_exception().unwrap_or_else(|| panic!("no exception"));
    assert_eq!(exception.borrow().primitive_string(), "pow");
}

#[test]
fn test_evaluate_link_returns_value() {
    let mut interp = Interpreter::new();
    let link = interp
        .evaluate_link("({answer: 42}).answer")
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(link.var().borrow().get_int(), 42);
}

#[test]
fn test_evaluate_at_reports_position() {
    let mut interp = Interpreter::new();
    let err = interp.evaluate_at("var x = 'unterminated", "input.js", 10, 0);
    match err {
        Err(ScriptError::Script { location, .. }) => {
            assert_eq!(location.file, "input.js");
            assert_eq!(location.line, 10);
        }
        other => panic!("expected syntax error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_strict_let_option() {
    let mut interp = Interpreter::with_options(scriptling::InterpreterOptions {
        strict_let_redeclaration: true,
        ..Default::default()
    });
    let err = interp.evaluate("let a; let a;");
    assert_eq!(err.err().and_then(|e| e.kind()), Some(ErrorKind::TypeError));
}

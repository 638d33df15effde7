//! JSON.parse / JSON.stringify and the host-side serde_json bridge.

use super::eval;
use scriptling::{json_to_var, var_to_json, Interpreter};

#[test]
fn test_parse_scalars() {
    assert_eq!(eval("JSON.parse('1')"), "1");
    assert_eq!(eval("JSON.parse('1.5')"), "1.5");
    assert_eq!(eval("JSON.parse('\"hi\"')"), "hi");
    assert_eq!(eval("JSON.parse('true')"), "true");
    assert_eq!(eval("JSON.parse('null')"), "null");
}

#[test]
fn test_parse_structures() {
    assert_eq!(eval("JSON.parse('{\"a\": 1, \"b\": 2}').b"), "2");
    assert_eq!(eval("JSON.parse('[1, [2, 3]]')[1][0]"), "2");
    assert_eq!(
        eval("var o = JSON.parse('{\"xs\": [1, 2, 3]}'); o.xs.length"),
        "3"
    );
}

#[test]
fn test_stringify_scalars() {
    assert_eq!(eval("JSON.stringify(1)"), "1");
    assert_eq!(eval("JSON.stringify('hi')"), "\"hi\"");
    assert_eq!(eval("JSON.stringify(true)"), "true");
    assert_eq!(eval("JSON.stringify(null)"), "null");
    assert_eq!(eval("JSON.stringify(undefined)"), "undefined");
    assert_eq!(eval("JSON.stringify(NaN)"), "null");
}

#[test]
fn test_stringify_structures() {
    assert_eq!(eval("JSON.stringify({a: 1, b: 'x'})"), "{\"a\":1,\"b\":\"x\"}");
    assert_eq!(eval("JSON.stringify([1, 2, 3])"), "[1,2,3]");
    assert_eq!(eval("JSON.stringify({})"), "{}");
    assert_eq!(eval("JSON.stringify([])"), "[]");
}

#[test]
fn test_stringify_skips_functions_and_undefined() {
    assert_eq!(
        eval("JSON.stringify({a: 1, f: function() {}, u: undefined})"),
        "{\"a\":1}"
    );
    assert_eq!(eval("JSON.stringify([1, undefined, 2])"), "[1,null,2]");
}

#[test]
fn test_stringify_escapes() {
    assert_eq!(eval("JSON.stringify('a\\nb')"), "\"a\\nb\"");
    assert_eq!(eval("JSON.stringify('q\\\"q')"), "\"q\\\"q\"");
}

#[test]
fn test_roundtrip() {
    // Spec invariant 6: parse(stringify(v)) equals v for JSON-safe values.
    assert_eq!(
        eval(
            "var v = {a: 1, b: [true, null, 'x'], c: {d: 2.5}}; \
             var w = JSON.parse(JSON.stringify(v)); \
             (w.a == v.a) + ',' + (w.b[2] == v.b[2]) + ',' + (w.c.d == v.c.d) + ',' + \
             (w.b.length == v.b.length)"
        ),
        "true,true,true,true"
    );
}

#[test]
fn test_stringify_with_indent() {
    assert_eq!(
        eval("JSON.stringify({a: 1}, 2)"),
        "{\n  \"a\": 1\n}"
    );
}

#[test]
fn test_host_json_bridge() {
    let mut interp = Interpreter::new();
    let value = serde_json::json!({"n": 1, "xs": [1, 2], "s": "hi"});
    let var = json_to_var(&interp, &value);
    let back = var_to_json(&mut interp, &var).unwrap_or_else(|e| panic!("to_json: {}", e));
    assert_eq!(back, value);
}

#[test]
fn test_host_json_var_is_scriptable() {
    let mut interp = Interpreter::new();
    let var = json_to_var(&interp, &serde_json::json!({"a": {"b": 41}}));
    let args = vec![var];
    let func = interp
        .evaluate_link("(function(o) { return o.a.b + 1; })")
        .unwrap_or_else(|e| panic!("prepare: {}", e));
    let result = interp
        .call_function(&func.var(), args, None)
        .unwrap_or_else(|e| panic!("call: {}", e));
    assert_eq!(result.borrow().get_int(), 42);
}

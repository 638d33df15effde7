//! Garbage collection: unreachable values (including cycles) are collected
//! after top-level evaluations.

use scriptling::Interpreter;

#[test]
fn test_unreachable_values_are_collected() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("var keep = {a: 1};")
        .unwrap_or_else(|e| panic!("{}", e));
    let baseline = interp.heap_stats().live;

    interp
        .evaluate("var tmp = {big: [1, 2, 3, 4, 5]}; tmp = null;")
        .unwrap_or_else(|e| panic!("{}", e));
    // The temporary graph died with the sweep at the end of the evaluation.
    let after = interp.heap_stats().live;
    assert!(
        after <= baseline + 4,
        "temporaries should be swept: baseline {} -> after {}",
        baseline,
        after
    );
}

#[test]
fn test_cycles_are_collected() {
    let mut interp = Interpreter::new();
    interp.evaluate("1;").unwrap_or_else(|e| panic!("{}", e));
    let baseline = interp.heap_stats().live;

    interp
        .evaluate("var a = {}; var b = {}; a.other = b; b.other = a; a = null; b = null;")
        .unwrap_or_else(|e| panic!("{}", e));
    let after = interp.heap_stats().live;
    assert!(
        after <= baseline + 4,
        "cyclic garbage should be swept: baseline {} -> after {}",
        baseline,
        after
    );
}

#[test]
fn test_reachable_values_survive() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("var o = {list: [1, 2, 3]}; o.self = o;")
        .unwrap_or_else(|e| panic!("{}", e));
    interp.collect_garbage(None);
    assert_eq!(interp.evaluate("o.list[2]").unwrap_or_default(), "3");
    assert_eq!(interp.evaluate("o.self.list[0]").unwrap_or_default(), "1");
}

#[test]
fn test_closure_environments_survive() {
    let mut interp = Interpreter::new();
    interp
        .evaluate("function mk() { var n = 41; return function() { return n + 1; }; } var f = mk();")
        .unwrap_or_else(|e| panic!("{}", e));
    interp.collect_garbage(None);
    assert_eq!(interp.evaluate("f()").unwrap_or_default(), "42");
}

#[test]
fn test_collected_count_grows() {
    let mut interp = Interpreter::new();
    interp.evaluate("1;").unwrap_or_else(|e| panic!("{}", e));
    let before = interp.heap_stats().collected;
    interp
        .evaluate("var g = {}; g.cycle = g; g = null;")
        .unwrap_or_else(|e| panic!("{}", e));
    assert!(interp.heap_stats().collected > before);
}

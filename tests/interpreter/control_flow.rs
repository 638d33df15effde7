//! Control flow: if/else, loops, labels, switch.

use super::eval;

#[test]
fn test_if_else() {
    assert_eq!(eval("var r; if (1 < 2) r = 'a'; else r = 'b'; r"), "a");
    assert_eq!(eval("var r; if (1 > 2) r = 'a'; else r = 'b'; r"), "b");
    assert_eq!(eval("var r = 'x'; if (false) r = 'y'; r"), "x");
    assert_eq!(
        eval("var r; if (0) r = 'a'; else if (1) r = 'b'; else r = 'c'; r"),
        "b"
    );
}

#[test]
fn test_while_loop() {
    assert_eq!(eval("var i = 0; while (i < 5) i++; i"), "5");
    assert_eq!(eval("var i = 9; while (i < 5) i++; i"), "9");
}

#[test]
fn test_do_while_runs_at_least_once() {
    assert_eq!(eval("var i = 9; do i++; while (i < 5); i"), "10");
    assert_eq!(eval("var i = 0; do { i += 2; } while (i < 5); i"), "6");
}

#[test]
fn test_for_loop_sum() {
    // Spec scenario (a).
    assert_eq!(eval("var a = 0; for (var i=0; i<5; i++) a += i; a"), "10");
}

#[test]
fn test_for_loop_with_empty_sections() {
    assert_eq!(
        eval("var i = 0; for (;;) { i++; if (i > 3) break; } i"),
        "4"
    );
    assert_eq!(eval("var a = 0; for (var i=0; i<3;) { a += i; i++; } a"), "3");
}

#[test]
fn test_break_and_continue() {
    assert_eq!(
        eval("var s = 0; for (var i=0; i<10; i++) { if (i == 3) break; s += i; } s"),
        "3"
    );
    assert_eq!(
        eval("var s = 0; for (var i=0; i<5; i++) { if (i % 2) continue; s += i; } s"),
        "6"
    );
    assert_eq!(
        eval("var i = 0; while (true) { i++; if (i == 4) break; } i"),
        "4"
    );
}

#[test]
fn test_labeled_break_out_of_nested_loops() {
    // Spec scenario (f).
    assert_eq!(
        eval(
            "var i, j; outer: for (i=0; i<3; i++) for (j=0; j<3; j++) { if (j==1) break outer; } \
             [i, j]"
        ),
        "0, 1"
    );
}

#[test]
fn test_labeled_continue() {
    assert_eq!(
        eval(
            "var s = 0; outer: for (var i=0; i<3; i++) { for (var j=0; j<3; j++) { \
             if (j == 1) continue outer; s += 1; } s += 100; } s"
        ),
        "3"
    );
}

#[test]
fn test_for_in_iterates_keys() {
    assert_eq!(
        eval("var o = {b: 2, a: 1}; var ks = ''; for (var k in o) ks += k; ks"),
        "ab"
    );
}

#[test]
fn test_for_in_numeric_keys_come_first() {
    assert_eq!(
        eval("var o = {x: 1}; o[10] = 2; o[2] = 3; var ks = ''; for (var k in o) ks += k + ','; ks"),
        "2,10,x,"
    );
}

#[test]
fn test_for_each_in_iterates_values() {
    assert_eq!(
        eval("var o = {a: 1, b: 2}; var s = 0; for each (var v in o) s += v; s"),
        "3"
    );
}

#[test]
fn test_for_in_with_let_binding() {
    assert_eq!(
        eval("var o = {a: 1, b: 2}; var ks = ''; for (let k in o) ks += k; ks"),
        "ab"
    );
}

#[test]
fn test_switch_fallthrough_and_break() {
    assert_eq!(
        eval(
            "var r = ''; switch (2) { case 1: r += 'a'; case 2: r += 'b'; case 3: r += 'c'; \
             break; case 4: r += 'd'; } r"
        ),
        "bc"
    );
}

#[test]
fn test_switch_default() {
    assert_eq!(
        eval("var r = ''; switch (9) { case 1: r = 'a'; break; default: r = 'd'; } r"),
        "d"
    );
    // Default in the middle still only runs when nothing matches.
    assert_eq!(
        eval("var r = ''; switch (1) { default: r += 'd'; case 1: r += 'a'; } r"),
        "a"
    );
}

#[test]
fn test_switch_uses_loose_equality() {
    assert_eq!(
        eval("var r = ''; switch ('2') { case 2: r = 'matched'; break; default: r = 'no'; } r"),
        "matched"
    );
}

#[test]
fn test_nested_loops() {
    assert_eq!(
        eval("var s = 0; for (var i=0; i<3; i++) for (var j=0; j<3; j++) s++; s"),
        "9"
    );
}

#[test]
fn test_with_statement() {
    assert_eq!(
        eval("var o = {a: 5}; var r = 0; with (o) { r = a; } r"),
        "5"
    );
    // Assignment inside `with` targets the wrapped object.
    assert_eq!(
        eval("var o = {a: 5}; with (o) { a = 7; } o.a"),
        "7"
    );
}

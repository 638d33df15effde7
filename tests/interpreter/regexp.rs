//! Regular expressions: literals, constructor, test/exec, lastIndex.

use super::{eval, eval_err};
use scriptling::ErrorKind;

#[test]
fn test_regexp_literal_test() {
    assert_eq!(eval("/a+/.test('baaa')"), "true");
    assert_eq!(eval("/a+/.test('xyz')"), "false");
}

#[test]
fn test_regexp_literal_at_statement_start() {
    assert_eq!(eval("/x/.test('axb')"), "true");
}

#[test]
fn test_regexp_constructor() {
    assert_eq!(eval("new RegExp('a.c').test('abc')"), "true");
    assert_eq!(eval("new RegExp('a', 'i').test('A')"), "true");
}

#[test]
fn test_invalid_flags_are_syntax_error() {
    assert_eq!(eval_err("new RegExp('a', 'gx')"), ErrorKind::SyntaxError);
}

#[test]
fn test_invalid_pattern_in_constructor() {
    assert_eq!(eval_err("new RegExp('(oops')"), ErrorKind::SyntaxError);
}

#[test]
fn test_exec_result_fields() {
    assert_eq!(eval("/b(c)/.exec('abcd')[0]"), "bc");
    assert_eq!(eval("/b(c)/.exec('abcd')[1]"), "c");
    assert_eq!(eval("/b(c)/.exec('abcd').index"), "1");
    assert_eq!(eval("/b(c)/.exec('abcd').input"), "abcd");
    assert_eq!(eval("/z/.exec('abc')"), "null");
}

#[test]
fn test_global_flag_advances_last_index() {
    assert_eq!(
        eval("var re = /a/g; re.exec('aa'); re.lastIndex"),
        "1"
    );
    assert_eq!(
        eval("var re = /a/g; re.exec('aa'); re.exec('aa'); re.lastIndex"),
        "2"
    );
    // Exhausted: resets to 0 and reports no match. (String concatenation
    // renders null as the empty string.)
    assert_eq!(
        eval("var re = /a/g; re.exec('aa'); re.exec('aa'); re.exec('aa') + ',' + re.lastIndex"),
        ",0"
    );
}

#[test]
fn test_case_insensitive_flag() {
    assert_eq!(eval("/abc/i.test('xABCx')"), "true");
    assert_eq!(eval("/abc/.test('xABCx')"), "false");
}

#[test]
fn test_flag_properties() {
    assert_eq!(eval("/a/gi.global + ',' + /a/gi.ignoreCase + ',' + /a/gi.multiline"), "true,true,false");
    assert_eq!(eval("/ab/.source"), "ab");
}

#[test]
fn test_regexp_to_string() {
    assert_eq!(eval("'' + /a+b/gi"), "/a+b/gi");
}

//! String values: length, character indexing, boxing.

use super::eval;

#[test]
fn test_string_length() {
    assert_eq!(eval("'abc'.length"), "3");
    assert_eq!(eval("''.length"), "0");
    assert_eq!(eval("var s = 'hello'; s.length"), "5");
}

#[test]
fn test_character_indexing() {
    assert_eq!(eval("'abc'[0]"), "a");
    assert_eq!(eval("'abc'[2]"), "c");
    assert_eq!(eval("typeof 'abc'[9]"), "undefined");
}

#[test]
fn test_char_at() {
    assert_eq!(eval("'abc'.charAt(1)"), "b");
    assert_eq!(eval("'abc'.charAt(9)"), "");
}

#[test]
fn test_string_constructor() {
    assert_eq!(eval("String(42)"), "42");
    assert_eq!(eval("String(true)"), "true");
    assert_eq!(eval("String()"), "");
}

#[test]
fn test_boxed_string() {
    assert_eq!(eval("typeof new String('x')"), "object");
    assert_eq!(eval("new String('abc').length"), "3");
    assert_eq!(eval("new String('ab') + 'c'"), "abc");
}

#[test]
fn test_string_comparisons() {
    assert_eq!(eval("'abc' == 'abc'"), "true");
    assert_eq!(eval("'abc' === 'abc'"), "true");
    assert_eq!(eval("'a' < 'b' && 'b' <= 'b' && 'c' > 'b'"), "true");
}

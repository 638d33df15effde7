//! Tokenizer tests: skip offsets, forwarder construction, redeclaration
//! rules, loop-label injection, ASI, and destructuring pre-parse.

use scriptling::string_pool::StringPool;
use scriptling::token::{Token, TokenKind};
use scriptling::tokenizer::TokenBuffer;
use scriptling::ErrorKind;

fn parse(source: &str) -> Vec<Token> {
    let mut pool = StringPool::new();
    let buffer = TokenBuffer::parse(source, "test", 0, 0, false, &mut pool)
        .unwrap_or_else(|e| panic!("tokenize failed: {}", e));
    buffer.tokens.as_ref().clone()
}

fn parse_err(source: &str) -> scriptling::ScriptError {
    let mut pool = StringPool::new();
    match TokenBuffer::parse(source, "test", 0, 0, false, &mut pool) {
        Ok(_) => panic!("expected a tokenize error for {:?}", source),
        Err(err) => err,
    }
}

fn parse_err_strict(source: &str) -> scriptling::ScriptError {
    let mut pool = StringPool::new();
    match TokenBuffer::parse(source, "test", 0, 0, true, &mut pool) {
        Ok(_) => panic!("expected a tokenize error for {:?}", source),
        Err(err) => err,
    }
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn test_ends_with_eof() {
    let tokens = parse("1;");
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn test_if_skip_offsets_jump_to_branch_ends() {
    let tokens = parse("if (a) b(); else c();");
    // The `if` head carries a skip to the end of the whole statement.
    let if_idx = tokens.iter().position(|t| t.kind == TokenKind::If).unwrap();
    let if_end = if_idx + tokens[if_idx].skip as usize;
    let else_idx = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Else)
        .unwrap();
    assert!(tokens[if_idx].skip > 0);
    assert!(if_end > else_idx, "if-skip must jump past the else arm");
    // The Skip marker before the then-branch jumps exactly to the else.
    let marker_idx = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Skip)
        .unwrap();
    assert_eq!(marker_idx + tokens[marker_idx].skip as usize, else_idx);
    // The else arm's skip reaches the same end as the if head.
    assert_eq!(else_idx + tokens[else_idx].skip as usize, if_end);
}

#[test]
fn test_block_skip_covers_block() {
    let tokens = parse("{ 1; 2; }");
    let open = tokens
        .iter()
        .position(|t| t.kind == TokenKind::LBrace)
        .unwrap();
    let close = tokens
        .iter()
        .position(|t| t.kind == TokenKind::RBrace)
        .unwrap();
    assert_eq!(open + tokens[open].skip as usize, close + 1);
}

#[test]
fn test_forwarder_collects_vars_and_lets() {
    let tokens = parse("var a; { let b; var c; }");
    // Root forwarder is the first token.
    assert_eq!(tokens[0].kind, TokenKind::Forward);
    let root = tokens[0].forwarder();
    assert!(root.vars.borrow().contains("a"));
    assert!(root.vars.borrow().contains("c"), "vars float to the function");
    assert!(!root.vars.borrow().contains("b"));
    // The block forwarder holds the let.
    let block_fwd = tokens[1..]
        .iter()
        .find(|t| t.kind == TokenKind::Forward)
        .unwrap_or_else(|| panic!("missing block forwarder"));
    assert!(block_fwd.forwarder().lets.borrow().contains("b"));
}

#[test]
fn test_function_declarations_are_hoisted_to_forwarder() {
    let tokens = parse("function f(a) { return a; }");
    assert_eq!(tokens[0].kind, TokenKind::Forward);
    let functions = tokens[0].forwarder().functions.borrow().clone();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name.as_str(), "f");
    // The in-place token degrades to a placeholder.
    assert!(kinds(&tokens).contains(&TokenKind::FunctionPlaceholder));
}

#[test]
fn test_empty_forwarder_is_removed() {
    let tokens = parse("1 + 2;");
    assert!(!kinds(&tokens).contains(&TokenKind::Forward));
}

#[test]
fn test_let_redeclaration_in_block_is_type_error() {
    let err = parse_err("{ let a; let a; }");
    assert_eq!(err.kind(), Some(ErrorKind::TypeError));
}

#[test]
fn test_var_colliding_with_let_is_type_error() {
    let err = parse_err("{ let a; var a; }");
    assert_eq!(err.kind(), Some(ErrorKind::TypeError));
}

#[test]
fn test_let_at_function_root_is_permissive_by_default() {
    // Allowed: treated as var.
    parse("let a; let a;");
    // The strict flag turns it into a TypeError.
    let err = parse_err_strict("let a; let a;");
    assert_eq!(err.kind(), Some(ErrorKind::TypeError));
}

#[test]
fn test_loop_labels_are_injected() {
    let tokens = parse("outer: while (a) { break outer; }");
    let kinds = kinds(&tokens);
    assert!(kinds.contains(&TokenKind::DummyLabel));
    assert!(kinds.contains(&TokenKind::LoopLabel));
    let loop_label = tokens
        .iter()
        .find(|t| t.kind == TokenKind::LoopLabel)
        .unwrap_or_else(|| panic!("missing loop label"));
    assert_eq!(loop_label.text().as_str(), "outer");
}

#[test]
fn test_unknown_break_label_is_syntax_error() {
    let err = parse_err("while (a) { break missing; }");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_break_outside_loop_is_syntax_error() {
    let err = parse_err("break;");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_return_outside_function_is_syntax_error() {
    let err = parse_err("return 1;");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_duplicate_switch_default_is_syntax_error() {
    let err = parse_err("switch (a) { default: ; default: ; }");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_asi_inserts_semicolons() {
    // Newline-separated statements parse, and the synthetic `;` tokens are
    // in the buffer.
    let tokens = parse("var a = 1\nvar b = 2");
    let semis = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Semicolon)
        .count();
    assert_eq!(semis, 2);
}

#[test]
fn test_missing_semicolon_without_newline_is_error() {
    let err = parse_err("var a = 1 var b = 2");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_destructuring_var_is_preparsed() {
    let tokens = parse("var [a, , {b: c}] = x;");
    let pattern_token = tokens
        .iter()
        .find(|t| t.kind == TokenKind::DestructuringVar)
        .unwrap_or_else(|| panic!("missing destructuring payload"));
    let names = pattern_token.destructuring().var_names();
    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
    assert_eq!(names, ["a", "c"]);
    // The bound names are hoisted as vars.
    assert!(tokens[0].forwarder().vars.borrow().contains("a"));
    assert!(tokens[0].forwarder().vars.borrow().contains("c"));
}

#[test]
fn test_object_literal_mode_resolution() {
    // Plain literal in expression position.
    let tokens = parse("x = {a: 1};");
    let literal = tokens
        .iter()
        .find(|t| t.kind == TokenKind::ObjectLiteral)
        .unwrap_or_else(|| panic!("missing object literal"));
    assert!(literal.object_literal().structuring.get());
    assert!(!literal.object_literal().destructuring.get());
}

#[test]
fn test_invalid_assignment_target_is_reference_error() {
    let err = parse_err("1 = 2;");
    assert_eq!(err.kind(), Some(ErrorKind::ReferenceError));
}

#[test]
fn test_assignment_to_this_is_syntax_error() {
    let err = parse_err("this = 1;");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_for_variants_are_classified() {
    let tokens = parse("for (var i = 0; i < 3; i++) ;");
    assert!(kinds(&tokens).contains(&TokenKind::For));

    let tokens = parse("for (var k in o) ;");
    assert!(kinds(&tokens).contains(&TokenKind::ForIn));

    let tokens = parse("for each (var v in o) ;");
    assert!(kinds(&tokens).contains(&TokenKind::ForEachIn));
}

#[test]
fn test_expression_start_mode() {
    let mut pool = StringPool::new();
    let buffer = TokenBuffer::parse_expression("{\"a\": [1, 2]}", "json", 0, 0, false, &mut pool)
        .unwrap_or_else(|e| panic!("tokenize failed: {}", e));
    assert_eq!(buffer.tokens[0].kind, TokenKind::ObjectLiteral);
}

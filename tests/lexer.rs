//! Lexer tests: token kinds, literals, escapes, positions, ASI flags, and
//! regex-literal disambiguation.

use scriptling::lexer::Lexer;
use scriptling::string_pool::StringPool;
use scriptling::token::{TokenKind, TokenPayload};
use scriptling::value::ScriptString;
use scriptling::ErrorKind;

fn lex_kinds(source: &str) -> Vec<TokenKind> {
    let mut pool = StringPool::new();
    let mut lexer = Lexer::new(source, ScriptString::from("test"), 0, 0, &mut pool)
        .unwrap_or_else(|e| panic!("lex failed: {}", e));
    let mut kinds = Vec::new();
    loop {
        kinds.push(lexer.kind());
        if lexer.kind() == TokenKind::Eof {
            break;
        }
        lexer.advance().unwrap_or_else(|e| panic!("lex failed: {}", e));
    }
    kinds
}

fn lex_error(source: &str) -> scriptling::ScriptError {
    let mut pool = StringPool::new();
    let mut lexer = match Lexer::new(source, ScriptString::from("test"), 0, 0, &mut pool) {
        Ok(lexer) => lexer,
        Err(err) => return err,
    };
    loop {
        if lexer.kind() == TokenKind::Eof {
            panic!("expected a lex error for {:?}", source);
        }
        if let Err(err) = lexer.advance() {
            return err;
        }
    }
}

#[test]
fn test_identifiers_and_keywords() {
    assert_eq!(
        lex_kinds("var foo = null"),
        vec![
            TokenKind::Var,
            TokenKind::Id,
            TokenKind::Assign,
            TokenKind::Null,
            TokenKind::Eof
        ]
    );
    // `each` is contextual, not reserved.
    assert_eq!(
        lex_kinds("each"),
        vec![TokenKind::Id, TokenKind::Eof]
    );
}

#[test]
fn test_number_literals() {
    let mut pool = StringPool::new();
    let lexer = Lexer::new("0x1f", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert_eq!(lexer.kind(), TokenKind::Int);
    assert_eq!(lexer.token().int(), 31);

    let mut pool = StringPool::new();
    let lexer = Lexer::new(".5", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert_eq!(lexer.kind(), TokenKind::Float);
    assert_eq!(lexer.token().float(), 0.5);

    let mut pool = StringPool::new();
    let lexer = Lexer::new("1e-2", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert_eq!(lexer.kind(), TokenKind::Float);
    assert_eq!(lexer.token().float(), 0.01);
}

#[test]
fn test_string_escapes() {
    let mut pool = StringPool::new();
    let lexer = Lexer::new(
        r#""a\n\t\x41\102\"b""#,
        ScriptString::from(""),
        0,
        0,
        &mut pool,
    )
    .unwrap();
    assert_eq!(lexer.kind(), TokenKind::Str);
    assert_eq!(lexer.text().as_str(), "a\n\tAB\"b");
}

#[test]
fn test_string_line_continuation() {
    let mut pool = StringPool::new();
    let lexer = Lexer::new("'a\\\nb'", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert_eq!(lexer.text().as_str(), "ab");
}

#[test]
fn test_unterminated_string() {
    let err = lex_error("'abc");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
    let err = lex_error("'ab\ncd'");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_multi_char_operators() {
    assert_eq!(
        lex_kinds("a === b !== c >>>= d"),
        vec![
            TokenKind::Id,
            TokenKind::StrictEqual,
            TokenKind::Id,
            TokenKind::StrictNotEqual,
            TokenKind::Id,
            TokenKind::ShrUAssign,
            TokenKind::Id,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        lex_kinds("1 // line\n /* block\n */ 2"),
        vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]
    );
}

#[test]
fn test_newline_before_token() {
    let mut pool = StringPool::new();
    let mut lexer = Lexer::new("a\nb c", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert!(!lexer.newline_before());
    lexer.advance().unwrap(); // b
    assert!(lexer.newline_before());
    lexer.advance().unwrap(); // c
    assert!(!lexer.newline_before());
}

#[test]
fn test_regexp_literal_context() {
    // At start of input and after `=`, `/` opens a regex.
    let mut pool = StringPool::new();
    let lexer = Lexer::new("/a+b/gi", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert_eq!(lexer.kind(), TokenKind::RegExp);
    match &lexer.token().payload {
        TokenPayload::RegExp { source, flags } => {
            assert_eq!(source.as_str(), "a+b");
            assert_eq!(flags.as_str(), "gi");
        }
        other => panic!("unexpected payload {:?}", other),
    }

    // After an identifier, `/` is division.
    assert_eq!(
        lex_kinds("a / b"),
        vec![TokenKind::Id, TokenKind::Slash, TokenKind::Id, TokenKind::Eof]
    );
    // After `)` as well.
    assert_eq!(
        lex_kinds("(a) / 2"),
        vec![
            TokenKind::LParen,
            TokenKind::Id,
            TokenKind::RParen,
            TokenKind::Slash,
            TokenKind::Int,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_invalid_regexp_is_syntax_error() {
    let err = lex_error("var x = /(unclosed/");
    assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
}

#[test]
fn test_positions_are_tracked() {
    let mut pool = StringPool::new();
    let mut lexer = Lexer::new("a\n  b", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    assert_eq!((lexer.line(), lexer.column()), (0, 0));
    lexer.advance().unwrap();
    assert_eq!((lexer.line(), lexer.column()), (1, 2));
}

#[test]
fn test_checkpoint_restore() {
    let mut pool = StringPool::new();
    let mut lexer = Lexer::new("a b c", ScriptString::from(""), 0, 0, &mut pool).unwrap();
    let checkpoint = lexer.checkpoint();
    lexer.advance().unwrap();
    lexer.advance().unwrap();
    assert_eq!(lexer.text().as_str(), "c");
    lexer.restore(checkpoint);
    assert_eq!(lexer.text().as_str(), "a");
}

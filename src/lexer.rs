//! Lexer: converts source text to tokens with position tracking.
//!
//! The lexer keeps a two-character window over the input, tracks line and
//! column, and records whether a line break preceded the current token (the
//! signal automatic semicolon insertion runs on). Regex literals are
//! context sensitive: a `/` opens one only when the previous token cannot
//! end an expression.

use std::str::Chars;

use crate::error::ScriptError;
use crate::regexp;
use crate::string_pool::StringPool;
use crate::token::{reserved_word, Token, TokenKind, TokenPayload};
use crate::value::{parse_int_radix, ScriptString};

/// Lexer state snapshot for bounded lookahead.
#[derive(Clone)]
pub struct LexerCheckpoint<'a> {
    chars: Chars<'a>,
    curr: Option<char>,
    next: Option<char>,
    line: u32,
    column: u32,
    token: Token,
    newline_before: bool,
}

pub struct Lexer<'a> {
    chars: Chars<'a>,
    curr: Option<char>,
    next: Option<char>,
    line: u32,
    column: u32,
    file: ScriptString,
    pool: &'a mut StringPool,
    token: Token,
    newline_before: bool,
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_id_part(c: char) -> bool {
    is_id_start(c) || c.is_ascii_digit()
}

impl<'a> Lexer<'a> {
    pub fn new(
        source: &'a str,
        file: ScriptString,
        line: u32,
        column: u32,
        pool: &'a mut StringPool,
    ) -> Result<Lexer<'a>, ScriptError> {
        let mut lexer = Lexer {
            chars: source.chars(),
            curr: None,
            next: None,
            line,
            column,
            file,
            pool,
            token: Token::bare(TokenKind::Eof),
            newline_before: false,
        };
        lexer.next_ch();
        lexer.next_ch();
        lexer.column = column;
        lexer.token = lexer.scan_token(Some(None))?;
        Ok(lexer)
    }

    pub fn file(&self) -> &ScriptString {
        &self.file
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    /// Text of the current token (identifiers, strings, labels).
    pub fn text(&self) -> &ScriptString {
        self.token.text()
    }

    pub fn newline_before(&self) -> bool {
        self.newline_before
    }

    pub fn line(&self) -> u32 {
        self.token.line
    }

    pub fn column(&self) -> u32 {
        self.token.column
    }

    pub fn checkpoint(&self) -> LexerCheckpoint<'a> {
        LexerCheckpoint {
            chars: self.chars.clone(),
            curr: self.curr,
            next: self.next,
            line: self.line,
            column: self.column,
            token: self.token.clone(),
            newline_before: self.newline_before,
        }
    }

    pub fn restore(&mut self, checkpoint: LexerCheckpoint<'a>) {
        self.chars = checkpoint.chars;
        self.curr = checkpoint.curr;
        self.next = checkpoint.next;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.token = checkpoint.token;
        self.newline_before = checkpoint.newline_before;
    }

    /// Error at the current token's position.
    pub fn error_here(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::syntax(
            message,
            self.file.as_str(),
            self.token.line,
            self.token.column,
        )
    }

    fn error_at_cursor(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::syntax(message, self.file.as_str(), self.line, self.column)
    }

    pub fn check(&self, expected: TokenKind, alternate: Option<TokenKind>) -> Result<(), ScriptError> {
        if expected == TokenKind::Semicolon && self.token.kind == TokenKind::Eof {
            return Ok(());
        }
        if self.token.kind != expected && Some(self.token.kind) != alternate {
            let mut message = if expected == TokenKind::Eof {
                format!("Got unexpected {}", self.token.kind.describe())
            } else {
                format!(
                    "Got '{}' expected '{}'",
                    self.token.kind.describe(),
                    expected.describe()
                )
            };
            if let Some(alt) = alternate {
                message.push_str(&format!(" or '{}'", alt.describe()));
            }
            return Err(self.error_here(message));
        }
        Ok(())
    }

    /// Check the current token, then advance.
    pub fn expect(&mut self, expected: TokenKind) -> Result<(), ScriptError> {
        self.expect2(expected, None)
    }

    pub fn expect2(
        &mut self,
        expected: TokenKind,
        alternate: Option<TokenKind>,
    ) -> Result<(), ScriptError> {
        self.check(expected, alternate)?;
        self.advance()
    }

    /// Advance to the next token.
    pub fn advance(&mut self) -> Result<(), ScriptError> {
        let line_before = self.line;
        self.token = self.scan_token(None)?;
        self.newline_before = line_before != self.line;
        Ok(())
    }

    /// Advance, pretending the consumed token was `pretend` for the purposes
    /// of regex-literal disambiguation. Used for lambda bodies, where a
    /// regex may directly follow the parameter list's `)`.
    pub fn advance_as(&mut self, pretend: TokenKind) -> Result<(), ScriptError> {
        let line_before = self.line;
        self.token = self.scan_token(Some(Some(pretend)))?;
        self.newline_before = line_before != self.line;
        Ok(())
    }

    fn next_ch(&mut self) {
        if self.curr == Some('\n') {
            self.line += 1;
            self.column = 0;
        } else if self.curr.is_some() {
            self.column += 1;
        }
        self.curr = self.next;
        self.next = self.chars.next();
        if self.curr == Some('\r') {
            if self.next == Some('\n') {
                // Windows line ending: drop the '\r'.
                self.next_ch();
            } else {
                self.curr = Some('\n');
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ScriptError> {
        loop {
            while matches!(self.curr, Some(c) if c.is_whitespace()) {
                self.next_ch();
            }
            if self.curr == Some('/') && self.next == Some('/') {
                while self.curr.is_some() && self.curr != Some('\n') {
                    self.next_ch();
                }
                continue;
            }
            if self.curr == Some('/') && self.next == Some('*') {
                self.next_ch();
                self.next_ch();
                while self.curr.is_some() && !(self.curr == Some('*') && self.next == Some('/')) {
                    self.next_ch();
                }
                if self.curr.is_none() {
                    return Err(self.error_at_cursor("unterminated comment"));
                }
                self.next_ch();
                self.next_ch();
                continue;
            }
            return Ok(());
        }
    }

    /// Scan one token. `last_override` replaces the previous-token context
    /// used for regex disambiguation: `Some(None)` means start of input.
    fn scan_token(
        &mut self,
        last_override: Option<Option<TokenKind>>,
    ) -> Result<Token, ScriptError> {
        self.skip_whitespace_and_comments()?;
        let last = last_override.unwrap_or(Some(self.token.kind));
        let line = self.line;
        let column = self.column;
        let mut token = Token::bare(TokenKind::Eof);
        token.line = line;
        token.column = column;

        let c = match self.curr {
            Some(c) => c,
            None => return Ok(token),
        };

        if is_id_start(c) {
            let mut text = String::new();
            while matches!(self.curr, Some(c) if is_id_part(c)) {
                text.push(self.curr.unwrap_or('\0'));
                self.next_ch();
            }
            match reserved_word(&text) {
                Some(kind) => token.kind = kind,
                None => {
                    token.kind = TokenKind::Id;
                    token.payload = TokenPayload::Str(self.pool.intern(&text));
                }
            }
            return Ok(token);
        }

        if c.is_ascii_digit() || (c == '.' && matches!(self.next, Some(n) if n.is_ascii_digit())) {
            return self.scan_number(token);
        }

        if c == '"' || c == '\'' {
            return self.scan_string(token, c);
        }

        self.next_ch();
        let next = self.curr;
        token.kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '~' => TokenKind::Tilde,
            '=' => {
                if next == Some('=') {
                    self.next_ch();
                    if self.curr == Some('=') {
                        self.next_ch();
                        TokenKind::StrictEqual
                    } else {
                        TokenKind::Equal
                    }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if next == Some('=') {
                    self.next_ch();
                    if self.curr == Some('=') {
                        self.next_ch();
                        TokenKind::StrictNotEqual
                    } else {
                        TokenKind::NotEqual
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => match next {
                Some('=') => {
                    self.next_ch();
                    TokenKind::LessEqual
                }
                Some('<') => {
                    self.next_ch();
                    if self.curr == Some('=') {
                        self.next_ch();
                        TokenKind::ShlAssign
                    } else {
                        TokenKind::Shl
                    }
                }
                _ => TokenKind::Lt,
            },
            '>' => match next {
                Some('=') => {
                    self.next_ch();
                    TokenKind::GreaterEqual
                }
                Some('>') => {
                    self.next_ch();
                    match self.curr {
                        Some('=') => {
                            self.next_ch();
                            TokenKind::ShrAssign
                        }
                        Some('>') => {
                            self.next_ch();
                            if self.curr == Some('=') {
                                self.next_ch();
                                TokenKind::ShrUAssign
                            } else {
                                TokenKind::ShrU
                            }
                        }
                        _ => TokenKind::Shr,
                    }
                }
                _ => TokenKind::Gt,
            },
            '+' => match next {
                Some('=') => {
                    self.next_ch();
                    TokenKind::PlusAssign
                }
                Some('+') => {
                    self.next_ch();
                    TokenKind::PlusPlus
                }
                _ => TokenKind::Plus,
            },
            '-' => match next {
                Some('=') => {
                    self.next_ch();
                    TokenKind::MinusAssign
                }
                Some('-') => {
                    self.next_ch();
                    TokenKind::MinusMinus
                }
                _ => TokenKind::Minus,
            },
            '&' => match next {
                Some('=') => {
                    self.next_ch();
                    TokenKind::AndAssign
                }
                Some('&') => {
                    self.next_ch();
                    TokenKind::AndAnd
                }
                _ => TokenKind::Amp,
            },
            '|' => match next {
                Some('=') => {
                    self.next_ch();
                    TokenKind::OrAssign
                }
                Some('|') => {
                    self.next_ch();
                    TokenKind::OrOr
                }
                _ => TokenKind::Pipe,
            },
            '^' => {
                if next == Some('=') {
                    self.next_ch();
                    TokenKind::XorAssign
                } else {
                    TokenKind::Caret
                }
            }
            '*' => {
                if next == Some('=') {
                    self.next_ch();
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '%' => {
                if next == Some('=') {
                    self.next_ch();
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            '/' => {
                let regexp_allowed = last.map_or(true, |kind| !kind.forbids_regexp_after());
                if regexp_allowed {
                    return self.scan_regexp(token);
                } else if next == Some('=') {
                    self.next_ch();
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            other => {
                return Err(self.error_at_cursor(format!("unexpected character '{}'", other)));
            }
        };
        Ok(token)
    }

    fn scan_number(&mut self, mut token: Token) -> Result<Token, ScriptError> {
        let mut text = String::new();
        let mut is_float = false;
        let mut is_hex = false;
        if self.curr == Some('.') {
            text.push('0');
        }
        if self.curr == Some('0') {
            text.push('0');
            self.next_ch();
            if self.curr == Some('x') || self.curr == Some('X') {
                is_hex = true;
                text.push('x');
                self.next_ch();
            }
        }
        while matches!(self.curr, Some(c) if c.is_ascii_digit() || (is_hex && c.is_ascii_hexdigit()))
        {
            text.push(self.curr.unwrap_or('\0'));
            self.next_ch();
        }
        if !is_hex && self.curr == Some('.') {
            is_float = true;
            text.push('.');
            self.next_ch();
            while matches!(self.curr, Some(c) if c.is_ascii_digit()) {
                text.push(self.curr.unwrap_or('\0'));
                self.next_ch();
            }
        }
        if !is_hex && (self.curr == Some('e') || self.curr == Some('E')) {
            is_float = true;
            text.push('e');
            self.next_ch();
            if self.curr == Some('-') {
                text.push('-');
                self.next_ch();
            }
            while matches!(self.curr, Some(c) if c.is_ascii_digit()) {
                text.push(self.curr.unwrap_or('\0'));
                self.next_ch();
            }
        }
        if is_float {
            token.kind = TokenKind::Float;
            token.payload = TokenPayload::Float(parse_float_lenient(&text));
        } else {
            token.kind = TokenKind::Int;
            token.payload = TokenPayload::Int(parse_int_radix(&text, 0).0);
        }
        Ok(token)
    }

    fn scan_string(&mut self, mut token: Token, quote: char) -> Result<Token, ScriptError> {
        self.next_ch();
        let mut text = String::new();
        while let Some(c) = self.curr {
            if c == quote || c == '\n' {
                break;
            }
            if c == '\\' {
                self.next_ch();
                match self.curr {
                    // Escaped newline: line continuation.
                    Some('\n') => {}
                    Some('n') => text.push('\n'),
                    Some('r') => text.push('\r'),
                    Some('a') => text.push('\x07'),
                    Some('b') => text.push('\x08'),
                    Some('f') => text.push('\x0c'),
                    Some('t') => text.push('\t'),
                    Some('v') => text.push('\x0b'),
                    Some('x') => {
                        let mut value = 0u32;
                        let mut digits = 0;
                        while digits < 2
                            && matches!(self.next, Some(d) if d.is_ascii_hexdigit())
                        {
                            self.next_ch();
                            value = value * 16
                                + self.curr.and_then(|d| d.to_digit(16)).unwrap_or(0);
                            digits += 1;
                        }
                        if digits == 0 {
                            return Err(self
                                .error_at_cursor("malformed hexadecimal escape sequence"));
                        }
                        text.push(char::from_u32(value).unwrap_or('\u{fffd}'));
                    }
                    Some(c) if ('0'..='7').contains(&c) => {
                        let mut value = c.to_digit(8).unwrap_or(0);
                        let mut digits = 1;
                        while digits < 3 && matches!(self.next, Some(d) if ('0'..='7').contains(&d))
                        {
                            self.next_ch();
                            value = value * 8 + self.curr.and_then(|d| d.to_digit(8)).unwrap_or(0);
                            digits += 1;
                        }
                        text.push(char::from_u32(value).unwrap_or('\u{fffd}'));
                    }
                    Some(c) => text.push(c),
                    None => break,
                }
            } else {
                text.push(c);
            }
            self.next_ch();
        }
        if self.curr != Some(quote) {
            return Err(self.error_at_cursor("unterminated string literal"));
        }
        self.next_ch();
        token.kind = TokenKind::Str;
        token.payload = TokenPayload::Str(self.pool.intern(&text));
        Ok(token)
    }

    /// Scan a regex literal; the leading `/` is already consumed.
    fn scan_regexp(&mut self, mut token: Token) -> Result<Token, ScriptError> {
        let mut source = String::new();
        while let Some(c) = self.curr {
            if c == '/' || c == '\n' {
                break;
            }
            if c == '\\' && self.next == Some('/') {
                source.push('\\');
                self.next_ch();
                source.push('/');
            } else {
                source.push(c);
            }
            self.next_ch();
        }
        if self.curr != Some('/') {
            return Err(self.error_at_cursor("unterminated regular expression literal"));
        }
        self.next_ch();
        if let Err(message) = regexp::validate(&source) {
            return Err(self.error_at_cursor(message));
        }
        let mut flags = String::new();
        while matches!(self.curr, Some('g' | 'i' | 'm' | 'y')) {
            flags.push(self.curr.unwrap_or('\0'));
            self.next_ch();
        }
        token.kind = TokenKind::RegExp;
        token.payload = TokenPayload::RegExp {
            source: self.pool.intern(&source),
            flags: self.pool.intern(&flags),
        };
        Ok(token)
    }
}

/// `strtod`-style float parse: consume the longest valid prefix, so `"1e"`
/// parses as `1.0`.
fn parse_float_lenient(text: &str) -> f64 {
    if let Ok(v) = text.parse() {
        return v;
    }
    for end in (1..text.len()).rev() {
        if let Ok(v) = text[..end].parse() {
            return v;
        }
    }
    0.0
}

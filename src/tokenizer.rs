//! Tokenizer / preparser.
//!
//! Transforms the raw token stream into an executable [`TokenBuffer`] in a
//! single pass (bounded lookahead only at `for` and shorthand destructuring
//! properties):
//!
//! - **skip offsets** are patched onto branch/loop/switch/try heads so the
//!   evaluator can jump past branches without re-parsing;
//! - **forwarder records** at block/function entries list the `var`, `let`,
//!   and hoisted function declarations visible in that scope, and carry the
//!   redeclaration checks;
//! - **loop labels** are injected at the head of labeled loops and `try`
//!   statements for O(1) `break label` matching;
//! - **destructuring patterns** are pre-parsed into flat traversal scripts;
//! - missing `;` is inserted where a line break, `}`, or EOF allows it.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{ErrorKind, ScriptError};
use crate::lexer::Lexer;
use crate::string_pool::StringPool;
use crate::token::{
    DestructuringData, DestructuringStep, FnData, ForwardData, ObjectLiteralData,
    ObjectLiteralElement, ObjectLiteralKind, Param, PatternItem, PatternKind, Token, TokenKind,
    TokenPayload, TokenVec,
};
use crate::value::{format_double, ScriptString};

// Tokenize flags.
const F_CAN_LABEL: u16 = 1 << 0;
const F_CAN_BREAK: u16 = 1 << 1;
const F_CAN_CONTINUE: u16 = 1 << 2;
const F_CAN_RETURN: u16 = 1 << 3;
const F_AS_STATEMENT: u16 = 1 << 4;
const F_FOR_FOR: u16 = 1 << 5;
const F_IS_ACCESSOR: u16 = 1 << 6;
const F_CALL_FOR_NEW: u16 = 1 << 7;
const F_NO_BLOCK_START: u16 = 1 << 8;
const F_NESTED_OBJECT: u16 = 1 << 9;

// Expression state bits.
const S_LEFT_HAND: u8 = 1 << 0;
const S_DESTRUCTURING: u8 = 1 << 1;

/// The flat, enriched token sequence for one compilation unit.
#[derive(Clone)]
pub struct TokenBuffer {
    pub tokens: TokenVec,
    pub file: ScriptString,
}

impl TokenBuffer {
    /// Tokenize a program (statement level).
    pub fn parse(
        source: &str,
        file: &str,
        line: u32,
        column: u32,
        strict_let: bool,
        pool: &mut StringPool,
    ) -> Result<TokenBuffer, ScriptError> {
        Self::run(source, file, line, column, strict_let, pool, false)
    }

    /// Tokenize starting at expression/literal level (used by `JSON.parse`).
    pub fn parse_expression(
        source: &str,
        file: &str,
        line: u32,
        column: u32,
        strict_let: bool,
        pool: &mut StringPool,
    ) -> Result<TokenBuffer, ScriptError> {
        Self::run(source, file, line, column, strict_let, pool, true)
    }

    fn run(
        source: &str,
        file: &str,
        line: u32,
        column: u32,
        strict_let: bool,
        pool: &mut StringPool,
        expression_start: bool,
    ) -> Result<TokenBuffer, ScriptError> {
        let file = pool.intern(file);
        let lexer = Lexer::new(source, file.clone(), line, column, pool)?;
        let mut tokenizer = Tokenizer { lexer, strict_let };
        let mut tokens = Vec::new();
        let mut ctx = ScopeCtx::with_root();
        push_forwarder(&mut tokens, &mut ctx.block_starts);
        if expression_start {
            let mut state = 0u8;
            tokenizer.tokenize_literal(&mut tokens, &mut ctx, 0, &mut state)?;
        } else {
            while tokenizer.lexer.kind() != TokenKind::Eof {
                tokenizer.tokenize_statement(&mut tokens, &mut ctx, 0)?;
            }
        }
        let mut eof = Token::bare(TokenKind::Eof);
        eof.line = tokenizer.lexer.line();
        eof.column = tokenizer.lexer.column();
        tokens.push(eof);
        remove_empty_forwarder(&mut tokens, &mut ctx);
        Ok(TokenBuffer {
            tokens: Rc::new(tokens),
            file,
        })
    }
}

/// Per-pass bookkeeping: open block starts (forwarder positions), skip
/// patch marks, and the active statement/loop label stacks.
struct ScopeCtx {
    block_starts: Vec<usize>,
    marks: Vec<usize>,
    labels: Vec<ScriptString>,
    loop_labels: Vec<ScriptString>,
}

impl ScopeCtx {
    fn new() -> ScopeCtx {
        ScopeCtx {
            block_starts: Vec::new(),
            marks: Vec::new(),
            labels: Vec::new(),
            loop_labels: Vec::new(),
        }
    }

    fn with_root() -> ScopeCtx {
        let mut ctx = ScopeCtx::new();
        ctx.block_starts.push(0);
        ctx
    }

    /// True when the current block is the function/root level itself.
    fn at_function_root(&self) -> bool {
        !self.block_starts.is_empty() && self.block_starts.first() == self.block_starts.last()
    }
}

/// Patch the token at the most recent mark with the distance to the current
/// end of the buffer.
fn set_token_skip(tokens: &mut [Token], marks: &mut Vec<usize>) {
    if let Some(idx) = marks.pop() {
        tokens[idx].skip = (tokens.len() - idx) as u32;
    }
}

fn push_forwarder(tokens: &mut Vec<Token>, block_starts: &mut Vec<usize>) -> Rc<ForwardData> {
    let data = Rc::new(ForwardData::default());
    block_starts.push(tokens.len());
    let mut token = Token::bare(TokenKind::Forward);
    token.payload = TokenPayload::Forward(data.clone());
    tokens.push(token);
    data
}

/// Drop the forwarder at the top block start if it carries no declarations,
/// shifting later positions down.
fn remove_empty_forwarder(tokens: &mut Vec<Token>, ctx: &mut ScopeCtx) {
    if let Some(&idx) = ctx.block_starts.last() {
        if tokens.get(idx).map(|t| t.kind) == Some(TokenKind::Forward) {
            let forwarder = tokens[idx].forwarder().clone();
            forwarder.clear_vars_in_let_scope();
            if forwarder.is_empty() {
                tokens.remove(idx);
                fix_positions(ctx, idx, -1);
            }
        }
    }
    ctx.block_starts.pop();
}

fn fix_positions(ctx: &mut ScopeCtx, start: usize, diff: isize) {
    for pos in ctx.block_starts.iter_mut().chain(ctx.marks.iter_mut()) {
        if *pos >= start {
            *pos = (*pos as isize + diff) as usize;
        }
    }
}

/// Binary operators parsed iteratively, all left-to-right.
fn is_left_to_right_op(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Star | Slash
            | Percent
            | Plus
            | Minus
            | Shl
            | Shr
            | ShrU
            | Equal
            | NotEqual
            | StrictEqual
            | StrictNotEqual
            | Lt
            | LessEqual
            | Gt
            | GreaterEqual
            | In
            | Instanceof
            | Amp
            | Caret
            | Pipe
            | AndAnd
            | OrOr
    )
}

struct Tokenizer<'a> {
    lexer: Lexer<'a>,
    strict_let: bool,
}

impl<'a> Tokenizer<'a> {
    fn err_here(&self, kind: ErrorKind, message: impl Into<String>) -> ScriptError {
        ScriptError::new(
            kind,
            message,
            self.lexer.file().as_str(),
            self.lexer.line(),
            self.lexer.column(),
        )
    }

    /// Push the current token and advance.
    fn push_current(&mut self, tokens: &mut Vec<Token>) -> Result<usize, ScriptError> {
        tokens.push(self.lexer.token().clone());
        self.lexer.advance()?;
        Ok(tokens.len() - 1)
    }

    /// Check the current token against `kind`, push it, and advance.
    fn push_expected(
        &mut self,
        tokens: &mut Vec<Token>,
        kind: TokenKind,
    ) -> Result<usize, ScriptError> {
        self.lexer.check(kind, None)?;
        self.push_current(tokens)
    }

    fn push_expected2(
        &mut self,
        tokens: &mut Vec<Token>,
        kind: TokenKind,
        alternate: TokenKind,
    ) -> Result<usize, ScriptError> {
        self.lexer.check(kind, Some(alternate))?;
        self.push_current(tokens)
    }

    /// Push a `;`, inserting a synthetic one when the grammar allows ASI
    /// (line break before the token, `}`, or EOF).
    fn push_semicolon(&mut self, tokens: &mut Vec<Token>) -> Result<usize, ScriptError> {
        if self.lexer.kind() != TokenKind::Semicolon
            && (self.lexer.newline_before()
                || self.lexer.kind() == TokenKind::RBrace
                || self.lexer.kind() == TokenKind::Eof)
        {
            let mut token = Token::bare(TokenKind::Semicolon);
            token.line = self.lexer.line();
            token.column = self.lexer.column();
            tokens.push(token);
            return Ok(tokens.len() - 1);
        }
        self.push_expected(tokens, TokenKind::Semicolon)
    }

    /// Rewrite trailing `label:` pairs in front of a just-pushed loop head
    /// to dummy labels and append matching `LoopLabel` tokens. Returns how
    /// many labels were injected.
    fn inject_loop_labels(&mut self, tokens: &mut Vec<Token>, into_loop_labels: bool, ctx: &mut ScopeCtx) -> usize {
        let len = tokens.len();
        if len < 3 {
            return 0;
        }
        let mut names: Vec<ScriptString> = Vec::new();
        let mut i = len - 1;
        while i >= 2
            && tokens[i - 1].kind == TokenKind::Colon
            && tokens[i - 2].kind == TokenKind::Label
        {
            names.push(tokens[i - 2].text().clone());
            tokens[i - 2].kind = TokenKind::DummyLabel;
            i -= 2;
        }
        for name in &names {
            if into_loop_labels {
                ctx.loop_labels.push(name.clone());
            }
            let mut token = Token::bare(TokenKind::LoopLabel);
            token.payload = TokenPayload::Str(name.clone());
            tokens.push(token);
        }
        names.len()
    }

    fn pop_loop_labels(&mut self, count: usize, ctx: &mut ScopeCtx) {
        for _ in 0..count {
            ctx.loop_labels.pop();
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn tokenize_statement(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        match self.lexer.kind() {
            TokenKind::LBrace => self.tokenize_block(tokens, ctx, flags),
            TokenKind::Semicolon => {
                self.push_current(tokens)?;
                Ok(())
            }
            TokenKind::Var => self.tokenize_var(tokens, ctx, flags),
            TokenKind::Let => self.tokenize_let(tokens, ctx, flags | F_AS_STATEMENT),
            TokenKind::With => self.tokenize_with(tokens, ctx, flags),
            TokenKind::If => self.tokenize_if(tokens, ctx, flags),
            TokenKind::Switch => self.tokenize_switch(tokens, ctx, flags),
            TokenKind::Do => self.tokenize_do(tokens, ctx, flags),
            TokenKind::While => self.tokenize_while(tokens, ctx, flags),
            TokenKind::For => self.tokenize_for(tokens, ctx, flags),
            TokenKind::Function => {
                self.tokenize_function(tokens, ctx, flags | F_AS_STATEMENT)
            }
            TokenKind::Try => self.tokenize_try(tokens, ctx, flags),
            TokenKind::Return | TokenKind::Throw => {
                if self.lexer.kind() == TokenKind::Return && flags & F_CAN_RETURN == 0 {
                    return Err(self.err_here(
                        ErrorKind::SyntaxError,
                        "'return' statement, but not in a function.",
                    ));
                }
                ctx.marks.push(self.push_current(tokens)?);
                if self.lexer.kind() != TokenKind::Semicolon && !self.lexer.newline_before() {
                    self.tokenize_expression(tokens, ctx, flags)?;
                }
                self.push_semicolon(tokens)?;
                set_token_skip(tokens, &mut ctx.marks);
                Ok(())
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.lexer.kind() == TokenKind::Break;
                ctx.marks.push(self.push_current(tokens)?);
                if self.lexer.kind() != TokenKind::Semicolon && !self.lexer.newline_before() {
                    self.lexer.check(TokenKind::Id, None)?;
                    let known = if is_break {
                        &ctx.labels
                    } else {
                        &ctx.loop_labels
                    };
                    if !known.iter().any(|l| l == self.lexer.text()) {
                        return Err(self.err_here(
                            ErrorKind::SyntaxError,
                            format!("label '{}' not found", self.lexer.text()),
                        ));
                    }
                    self.push_current(tokens)?;
                } else if flags & (if is_break { F_CAN_BREAK } else { F_CAN_CONTINUE }) == 0 {
                    return Err(self.err_here(
                        ErrorKind::SyntaxError,
                        if is_break {
                            "'break' must be inside loop or switch"
                        } else {
                            "'continue' must be inside loop"
                        },
                    ));
                }
                self.push_semicolon(tokens)?;
                set_token_skip(tokens, &mut ctx.marks);
                Ok(())
            }
            TokenKind::Id => {
                let label_count = ctx.labels.len();
                self.tokenize_expression(tokens, ctx, flags | F_CAN_LABEL)?;
                if ctx.labels.len() > label_count && self.lexer.kind() == TokenKind::Colon {
                    self.push_current(tokens)?;
                    self.tokenize_statement(tokens, ctx, flags)?;
                    ctx.labels.pop();
                } else {
                    self.push_semicolon(tokens)?;
                }
                Ok(())
            }
            _ => {
                self.tokenize_expression(tokens, ctx, flags)?;
                self.push_semicolon(tokens)?;
                Ok(())
            }
        }
    }

    fn tokenize_block(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        let add_block_start = flags & F_NO_BLOCK_START == 0;
        let flags = flags & !F_NO_BLOCK_START;
        ctx.marks.push(self.push_expected(tokens, TokenKind::LBrace)?);
        if add_block_start {
            push_forwarder(tokens, &mut ctx.block_starts);
        }
        while self.lexer.kind() != TokenKind::RBrace && self.lexer.kind() != TokenKind::Eof {
            self.tokenize_statement(tokens, ctx, flags)?;
        }
        self.push_expected(tokens, TokenKind::RBrace)?;
        if add_block_start {
            remove_empty_forwarder(tokens, ctx);
        }
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_with(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        ctx.marks.push(self.push_current(tokens)?);
        self.push_expected(tokens, TokenKind::LParen)?;
        self.tokenize_expression(tokens, ctx, flags)?;
        self.push_expected(tokens, TokenKind::RParen)?;
        ctx.block_starts.push(tokens.len());
        self.tokenize_statement(tokens, ctx, flags)?;
        ctx.block_starts.pop();
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_if(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        ctx.marks.push(self.push_current(tokens)?);
        self.push_expected(tokens, TokenKind::LParen)?;
        self.tokenize_expression(tokens, ctx, flags)?;
        self.push_expected(tokens, TokenKind::RParen)?;

        ctx.marks.push(tokens.len());
        tokens.push(Token::bare(TokenKind::Skip));

        ctx.block_starts.push(tokens.len());
        self.tokenize_statement(tokens, ctx, flags)?;
        ctx.block_starts.pop();
        set_token_skip(tokens, &mut ctx.marks);

        if self.lexer.kind() == TokenKind::Else {
            ctx.marks.push(self.push_current(tokens)?);
            ctx.block_starts.push(tokens.len());
            self.tokenize_statement(tokens, ctx, flags)?;
            ctx.block_starts.pop();
            set_token_skip(tokens, &mut ctx.marks);
        }
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_while(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        ctx.marks.push(self.push_current(tokens)?);
        let label_count = self.inject_loop_labels(tokens, true, ctx);
        self.push_expected(tokens, TokenKind::LParen)?;
        self.tokenize_expression(tokens, ctx, flags)?;
        self.push_expected(tokens, TokenKind::RParen)?;

        ctx.marks.push(tokens.len());
        tokens.push(Token::bare(TokenKind::Skip));

        ctx.block_starts.push(tokens.len());
        self.tokenize_statement(tokens, ctx, flags | F_CAN_BREAK | F_CAN_CONTINUE)?;
        ctx.block_starts.pop();
        set_token_skip(tokens, &mut ctx.marks);

        self.pop_loop_labels(label_count, ctx);
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_do(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        ctx.marks.push(self.push_current(tokens)?);
        let label_count = self.inject_loop_labels(tokens, true, ctx);

        ctx.block_starts.push(tokens.len());
        self.tokenize_statement(tokens, ctx, flags | F_CAN_BREAK | F_CAN_CONTINUE)?;
        ctx.block_starts.pop();

        ctx.marks.push(self.push_expected(tokens, TokenKind::While)?);
        self.push_expected(tokens, TokenKind::LParen)?;
        self.tokenize_expression(tokens, ctx, flags)?;
        self.push_expected(tokens, TokenKind::RParen)?;
        self.push_semicolon(tokens)?;
        set_token_skip(tokens, &mut ctx.marks);

        self.pop_loop_labels(label_count, ctx);
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_for(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        // Bounded lookahead to classify for / for-in / for-each-in.
        let checkpoint = self.lexer.checkpoint();
        self.lexer.expect(TokenKind::For)?;
        let for_each = self.lexer.kind() == TokenKind::Id && self.lexer.text() == "each";
        let mut for_in = for_each;
        if for_each {
            self.lexer.advance()?;
        }
        if !for_in {
            self.lexer.expect(TokenKind::LParen)?;
            if self.lexer.kind() == TokenKind::Var || self.lexer.kind() == TokenKind::Let {
                self.lexer.advance()?;
            }
            if self.lexer.kind() == TokenKind::Id {
                self.lexer.advance()?;
                if self.lexer.kind() == TokenKind::In {
                    for_in = true;
                }
            }
        }
        self.lexer.restore(checkpoint);

        let head = self.push_current(tokens)?;
        ctx.marks.push(head);
        if for_in {
            tokens[head].kind = if for_each {
                TokenKind::ForEachIn
            } else {
                TokenKind::ForIn
            };
        }
        if for_each {
            self.lexer.expect(TokenKind::Id)?;
        }

        let label_count = self.inject_loop_labels(tokens, true, ctx);

        self.push_expected(tokens, TokenKind::LParen)?;
        push_forwarder(tokens, &mut ctx.block_starts);
        if for_in {
            if self.lexer.kind() == TokenKind::Var {
                self.push_current(tokens)?;
                let front = ctx.block_starts[0];
                tokens[front]
                    .forwarder()
                    .add_vars(&[self.lexer.text().clone()]);
            } else if self.lexer.kind() == TokenKind::Let {
                self.push_current(tokens)?;
                let back = *ctx.block_starts.last().unwrap_or(&0);
                tokens[back]
                    .forwarder()
                    .add_lets(&[self.lexer.text().clone()]);
            }
            self.push_expected(tokens, TokenKind::Id)?;
            self.push_expected(tokens, TokenKind::In)?;
        } else {
            if self.lexer.kind() == TokenKind::Var {
                self.tokenize_var(tokens, ctx, flags | F_FOR_FOR)?;
            } else if self.lexer.kind() == TokenKind::Let {
                self.tokenize_let(tokens, ctx, flags | F_FOR_FOR | F_AS_STATEMENT)?;
            } else if self.lexer.kind() != TokenKind::Semicolon {
                self.tokenize_expression(tokens, ctx, flags)?;
            }
            // No automatic `;` inside a for head.
            self.push_expected(tokens, TokenKind::Semicolon)?;
            if self.lexer.kind() != TokenKind::Semicolon {
                self.tokenize_expression(tokens, ctx, flags)?;
            }
            self.push_expected(tokens, TokenKind::Semicolon)?;
        }
        if for_in || self.lexer.kind() != TokenKind::RParen {
            self.tokenize_expression(tokens, ctx, flags)?;
        }
        self.push_expected(tokens, TokenKind::RParen)?;

        ctx.block_starts.push(tokens.len());
        self.tokenize_statement(tokens, ctx, flags | F_CAN_BREAK | F_CAN_CONTINUE)?;
        ctx.block_starts.pop();

        remove_empty_forwarder(tokens, ctx);
        self.pop_loop_labels(label_count, ctx);
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_switch(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        ctx.marks.push(self.push_current(tokens)?);
        self.push_expected(tokens, TokenKind::LParen)?;
        self.tokenize_expression(tokens, ctx, flags)?;
        self.push_expected(tokens, TokenKind::RParen)?;

        ctx.marks.push(self.push_expected(tokens, TokenKind::LBrace)?);
        push_forwarder(tokens, &mut ctx.block_starts);

        let marks_floor = ctx.marks.len();
        let flags = flags | F_CAN_BREAK;
        let mut has_default = false;
        loop {
            if self.lexer.kind() == TokenKind::Case || self.lexer.kind() == TokenKind::Default {
                if self.lexer.kind() == TokenKind::Case {
                    ctx.marks.push(self.push_current(tokens)?);
                    ctx.marks.push(tokens.len());
                    tokens.push(Token::bare(TokenKind::Skip));
                    self.tokenize_expression(tokens, ctx, flags)?;
                    set_token_skip(tokens, &mut ctx.marks);
                } else {
                    if has_default {
                        return Err(
                            self.err_here(ErrorKind::SyntaxError, "more than one switch default")
                        );
                    }
                    has_default = true;
                    ctx.marks.push(self.push_current(tokens)?);
                }
                ctx.marks.push(self.push_expected(tokens, TokenKind::Colon)?);
                while !matches!(
                    self.lexer.kind(),
                    TokenKind::RBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof
                ) {
                    self.tokenize_statement(tokens, ctx, flags)?;
                }
                set_token_skip(tokens, &mut ctx.marks);
            } else if self.lexer.kind() == TokenKind::RBrace {
                break;
            } else {
                return Err(self.err_here(ErrorKind::SyntaxError, "invalid switch statement"));
            }
        }
        while marks_floor < ctx.marks.len() {
            set_token_skip(tokens, &mut ctx.marks);
        }
        remove_empty_forwarder(tokens, ctx);
        self.push_expected(tokens, TokenKind::RBrace)?;
        set_token_skip(tokens, &mut ctx.marks); // switch block
        set_token_skip(tokens, &mut ctx.marks); // switch statement
        Ok(())
    }

    fn tokenize_try(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        let is_try = self.lexer.kind() == TokenKind::Try;
        ctx.marks.push(self.push_current(tokens)?);

        // Labeled try: the labels become loop labels so `break label` can
        // unwind out of the try.
        if is_try {
            self.inject_loop_labels(tokens, false, ctx);
        }

        self.tokenize_block(tokens, ctx, flags)?;
        set_token_skip(tokens, &mut ctx.marks);

        if self.lexer.kind() != TokenKind::Finally && is_try {
            self.lexer.check(TokenKind::Catch, Some(TokenKind::Finally))?;
            while self.lexer.kind() == TokenKind::Catch {
                self.tokenize_catch(tokens, ctx, flags)?;
            }
        }
        if self.lexer.kind() == TokenKind::Finally && is_try {
            self.tokenize_try(tokens, ctx, flags)?;
        }
        Ok(())
    }

    fn tokenize_catch(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        ctx.marks.push(self.push_expected(tokens, TokenKind::Catch)?);
        self.push_expected(tokens, TokenKind::LParen)?;
        self.push_expected(tokens, TokenKind::Id)?;
        if self.lexer.kind() == TokenKind::If {
            self.push_current(tokens)?;
            self.tokenize_expression(tokens, ctx, flags)?;
        }
        self.push_expected(tokens, TokenKind::RParen)?;
        self.tokenize_block(tokens, ctx, flags)?;
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    fn tokenize_function(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        let statement = flags & F_AS_STATEMENT != 0;
        let accessor = flags & F_IS_ACCESSOR != 0;

        let kind = if accessor {
            let marker = tokens.pop().unwrap_or_else(|| Token::bare(TokenKind::Id));
            if marker.text() == "get" {
                TokenKind::Get
            } else {
                TokenKind::Set
            }
        } else {
            self.lexer.expect(TokenKind::Function)?;
            if statement {
                TokenKind::Function
            } else {
                TokenKind::FunctionOperator
            }
        };
        // Only function statements at function/root level are hoisted.
        let forward = kind == TokenKind::Function && ctx.at_function_root();

        let mut name = ScriptString::empty();
        if self.lexer.kind() == TokenKind::Id || accessor {
            name = self.lexer.text().clone();
            self.lexer.expect2(TokenKind::Id, Some(TokenKind::Str))?;
        } else if statement {
            return Err(self.err_here(
                ErrorKind::SyntaxError,
                "Function statement requires a name.",
            ));
        }

        self.lexer.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.lexer.kind() != TokenKind::RParen {
            if self.lexer.kind() == TokenKind::LBracket || self.lexer.kind() == TokenKind::LBrace {
                let mut names = Vec::new();
                let pattern = self.tokenize_destructuring_pattern(&mut names)?;
                params.push(Param::Pattern(pattern));
            } else {
                self.lexer.check(TokenKind::Id, None)?;
                params.push(Param::Name(self.lexer.text().clone()));
                self.lexer.advance()?;
            }
            if self.lexer.kind() != TokenKind::RParen {
                self.lexer.expect2(TokenKind::Comma, Some(TokenKind::RParen))?;
            }
        }
        // Consume the `)` as if it were `{` so a regex literal may open a
        // lambda body.
        self.lexer.advance_as(TokenKind::LBrace)?;

        let file = self.lexer.file().clone();
        let line = self.lexer.line();

        let mut body = Vec::new();
        let mut body_ctx = ScopeCtx::new();
        if self.lexer.kind() == TokenKind::LBrace
            || kind == TokenKind::Get
            || kind == TokenKind::Set
        {
            self.tokenize_block(&mut body, &mut body_ctx, F_CAN_RETURN)?;
        } else {
            // Lambda body: a single expression.
            self.tokenize_expression(&mut body, &mut body_ctx, 0)?;
            if self.lexer.kind() == TokenKind::Semicolon {
                self.lexer.advance()?;
            } else if self.lexer.kind() != TokenKind::RBrace
                && self.lexer.kind() != TokenKind::Eof
                && !self.lexer.newline_before()
            {
                self.lexer.check(TokenKind::Semicolon, None)?;
            }
        }

        let data = Rc::new(FnData {
            name,
            params,
            file,
            line,
            body: Rc::new(body),
        });
        let mut token = Token::bare(if forward {
            TokenKind::FunctionPlaceholder
        } else {
            kind
        });
        token.payload = TokenPayload::Function(data.clone());
        if forward {
            let front = ctx.block_starts[0];
            tokens[front].forwarder().add_function(data);
        }
        tokens.push(token);
        Ok(())
    }

    fn tokenize_var(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        let for_for = flags & F_FOR_FOR != 0;
        let flags = flags & !F_FOR_FOR;
        let line = self.lexer.line();
        let column = self.lexer.column();

        ctx.marks.push(self.push_current(tokens)?);

        let mut names = Vec::new();
        loop {
            let destructuring =
                self.lexer.kind() == TokenKind::LBracket || self.lexer.kind() == TokenKind::LBrace;
            if destructuring {
                let token = self.tokenize_destructuring_token(&mut names)?;
                tokens.push(token);
            } else {
                self.lexer.check(TokenKind::Id, None)?;
                names.push(self.lexer.text().clone());
                self.push_current(tokens)?;
            }
            if destructuring || self.lexer.kind() == TokenKind::Assign {
                self.push_expected(tokens, TokenKind::Assign)?;
                self.tokenize_assignment(tokens, ctx, flags)?;
            }
            if self.lexer.kind() == TokenKind::Comma {
                self.push_current(tokens)?;
            } else {
                break;
            }
        }
        if !for_for {
            self.push_semicolon(tokens)?;
        }
        set_token_skip(tokens, &mut ctx.marks);

        let front = ctx.block_starts[0];
        tokens[front].forwarder().add_vars(&names);
        let mut redeclared = None;
        if !ctx.at_function_root() {
            let back = *ctx.block_starts.last().unwrap_or(&front);
            if tokens[back].kind == TokenKind::Forward {
                redeclared = tokens[back].forwarder().add_vars_in_let_scope(&names);
            }
        } else if self.strict_let {
            redeclared = tokens[front].forwarder().add_vars_in_let_scope(&names);
        }
        if let Some(name) = redeclared {
            return Err(ScriptError::new(
                ErrorKind::TypeError,
                format!("redeclaration of variable '{}'", name),
                self.lexer.file().as_str(),
                line,
                column,
            ));
        }
        Ok(())
    }

    fn tokenize_let(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        let for_for = flags & F_FOR_FOR != 0;
        let statement = flags & F_AS_STATEMENT != 0;
        let flags = flags & !(F_FOR_FOR | F_AS_STATEMENT);
        let line = self.lexer.line();
        let column = self.lexer.column();

        ctx.marks.push(self.push_current(tokens)?);

        let mut expression = false;
        if !for_for && (self.lexer.kind() == TokenKind::LParen || !statement) {
            expression = true;
            self.push_expected(tokens, TokenKind::LParen)?;
            push_forwarder(tokens, &mut ctx.block_starts);
        }

        let mut names = Vec::new();
        loop {
            let destructuring =
                self.lexer.kind() == TokenKind::LBracket || self.lexer.kind() == TokenKind::LBrace;
            if destructuring {
                let token = self.tokenize_destructuring_token(&mut names)?;
                tokens.push(token);
            } else {
                self.lexer.check(TokenKind::Id, None)?;
                names.push(self.lexer.text().clone());
                self.push_current(tokens)?;
            }
            if destructuring || self.lexer.kind() == TokenKind::Assign {
                self.push_expected(tokens, TokenKind::Assign)?;
                self.tokenize_assignment(tokens, ctx, flags)?;
            }
            if self.lexer.kind() == TokenKind::Comma {
                self.push_current(tokens)?;
            } else {
                break;
            }
        }

        if expression {
            let back = *ctx.block_starts.last().unwrap_or(&0);
            if let Some(name) = tokens[back].forwarder().add_lets(&names) {
                return Err(ScriptError::new(
                    ErrorKind::TypeError,
                    format!("redeclaration of variable '{}'", name),
                    self.lexer.file().as_str(),
                    line,
                    column,
                ));
            }
            self.push_expected(tokens, TokenKind::RParen)?;
            if statement {
                if self.lexer.kind() == TokenKind::LBrace {
                    self.tokenize_block(tokens, ctx, flags | F_NO_BLOCK_START)?;
                } else {
                    self.tokenize_statement(tokens, ctx, flags)?;
                }
            } else {
                self.tokenize_expression(tokens, ctx, flags)?;
            }
            // The forwarder token must stay (the evaluator builds the let
            // scope from it); only the redeclaration scratch is cleared.
            tokens[back].forwarder().clear_vars_in_let_scope();
            ctx.block_starts.pop();
        } else {
            if !for_for {
                self.push_semicolon(tokens)?;
            }
            let mut redeclared = None;
            if ctx.at_function_root() {
                // `let` at function root is treated as `var` unless the
                // strict flag turns the redeclaration check on.
                let front = ctx.block_starts[0];
                if self.strict_let {
                    redeclared = tokens[front].forwarder().add_lets(&names);
                } else {
                    tokens[front].forwarder().add_vars(&names);
                }
            } else {
                let back = *ctx.block_starts.last().unwrap_or(&0);
                if tokens[back].kind == TokenKind::Forward {
                    redeclared = tokens[back].forwarder().add_lets(&names);
                } else {
                    return Err(self.err_here(
                        ErrorKind::SyntaxError,
                        "let declaration not directly within block",
                    ));
                }
            }
            if let Some(name) = redeclared {
                return Err(ScriptError::new(
                    ErrorKind::TypeError,
                    format!("redeclaration of variable '{}'", name),
                    self.lexer.file().as_str(),
                    line,
                    column,
                ));
            }
        }
        set_token_skip(tokens, &mut ctx.marks);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Destructuring pre-parse
    // ------------------------------------------------------------------

    fn tokenize_destructuring_token(
        &mut self,
        names: &mut Vec<ScriptString>,
    ) -> Result<Token, ScriptError> {
        let line = self.lexer.line();
        let column = self.lexer.column();
        let pattern = self.tokenize_destructuring_pattern(names)?;
        let mut token = Token::bare(TokenKind::DestructuringVar);
        token.payload = TokenPayload::Destructuring(pattern);
        token.line = line;
        token.column = column;
        Ok(token)
    }

    fn tokenize_destructuring_pattern(
        &mut self,
        names: &mut Vec<ScriptString>,
    ) -> Result<Rc<DestructuringData>, ScriptError> {
        let mut steps = Vec::new();
        self.destructure_item(&mut steps, ScriptString::empty(), names)?;
        Ok(Rc::new(DestructuringData { steps }))
    }

    fn destructure_item(
        &mut self,
        steps: &mut Vec<DestructuringStep>,
        path: ScriptString,
        names: &mut Vec<ScriptString>,
    ) -> Result<(), ScriptError> {
        match self.lexer.kind() {
            TokenKind::LBracket => {
                steps.push(DestructuringStep {
                    path,
                    item: PatternItem::Enter(PatternKind::Array),
                });
                self.destructure_array(steps, names)?;
                steps.push(DestructuringStep {
                    path: ScriptString::empty(),
                    item: PatternItem::Leave,
                });
            }
            TokenKind::LBrace => {
                steps.push(DestructuringStep {
                    path,
                    item: PatternItem::Enter(PatternKind::Object),
                });
                self.destructure_object(steps, names)?;
                steps.push(DestructuringStep {
                    path: ScriptString::empty(),
                    item: PatternItem::Leave,
                });
            }
            _ => {
                self.lexer.check(TokenKind::Id, None)?;
                let name = self.lexer.text().clone();
                names.push(name.clone());
                steps.push(DestructuringStep {
                    path,
                    item: PatternItem::Bind(name),
                });
                self.lexer.advance()?;
            }
        }
        Ok(())
    }

    fn destructure_array(
        &mut self,
        steps: &mut Vec<DestructuringStep>,
        names: &mut Vec<ScriptString>,
    ) -> Result<(), ScriptError> {
        self.lexer.expect(TokenKind::LBracket)?;
        let mut idx = 0;
        while self.lexer.kind() != TokenKind::RBracket {
            if self.lexer.kind() == TokenKind::Comma {
                steps.push(DestructuringStep {
                    path: ScriptString::empty(),
                    item: PatternItem::Skip,
                });
            } else {
                self.destructure_item(steps, ScriptString::from(idx.to_string()), names)?;
            }
            idx += 1;
            if self.lexer.kind() != TokenKind::RBracket {
                self.lexer.expect2(TokenKind::Comma, Some(TokenKind::RBracket))?;
            }
        }
        self.lexer.expect(TokenKind::RBracket)
    }

    fn destructure_object(
        &mut self,
        steps: &mut Vec<DestructuringStep>,
        names: &mut Vec<ScriptString>,
    ) -> Result<(), ScriptError> {
        self.lexer.expect(TokenKind::LBrace)?;
        while self.lexer.kind() != TokenKind::RBrace {
            let checkpoint = self.lexer.checkpoint();
            self.lexer.check(TokenKind::Id, Some(TokenKind::Str))?;
            let path = self.lexer.text().clone();
            self.lexer.advance()?;
            if self.lexer.kind() == TokenKind::Colon {
                self.lexer.advance()?;
                self.destructure_item(steps, path, names)?;
            } else {
                // Shorthand `{a}`: path and binding share the name.
                self.lexer.restore(checkpoint);
                self.lexer.check(TokenKind::Id, None)?;
                let name = self.lexer.text().clone();
                names.push(name.clone());
                steps.push(DestructuringStep {
                    path: name.clone(),
                    item: PatternItem::Bind(name),
                });
                self.lexer.advance()?;
            }
            if self.lexer.kind() != TokenKind::RBrace {
                self.lexer.expect2(TokenKind::Comma, Some(TokenKind::RBrace))?;
            }
        }
        self.lexer.expect(TokenKind::RBrace)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn tokenize_expression(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        self.tokenize_assignment(tokens, ctx, flags)?;
        while self.lexer.kind() == TokenKind::Comma {
            self.push_current(tokens)?;
            self.tokenize_assignment(tokens, ctx, flags)?;
        }
        Ok(())
    }

    fn tokenize_assignment(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
    ) -> Result<(), ScriptError> {
        let mut state = 0u8;
        self.tokenize_assignment_state(tokens, ctx, flags, &mut state)
    }

    fn tokenize_assignment_state(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
    ) -> Result<(), ScriptError> {
        *state &= !S_LEFT_HAND;
        self.tokenize_condition(tokens, ctx, flags, state)?;
        if self.lexer.kind().is_assignment() {
            *state &= !S_DESTRUCTURING;
            if *state & S_LEFT_HAND == 0 {
                return Err(self.err_here(
                    ErrorKind::ReferenceError,
                    "invalid assignment left-hand side",
                ));
            }
            self.push_current(tokens)?;
            self.tokenize_assignment(tokens, ctx, flags)?;
        }
        Ok(())
    }

    fn tokenize_condition(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
    ) -> Result<(), ScriptError> {
        self.tokenize_sub_expression(tokens, ctx, flags, state)?;
        if self.lexer.kind() == TokenKind::Question {
            self.push_current(tokens)?;
            self.tokenize_condition(tokens, ctx, flags, state)?;
            self.push_expected(tokens, TokenKind::Colon)?;
            self.tokenize_condition(tokens, ctx, flags, state)?;
            *state &= !S_LEFT_HAND;
        }
        Ok(())
    }

    fn tokenize_sub_expression(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
    ) -> Result<(), ScriptError> {
        let mut flags = flags;
        let mut no_left_hand = false;
        loop {
            // Unary prefixes (right-to-left).
            loop {
                match self.lexer.kind() {
                    TokenKind::Minus
                    | TokenKind::Plus
                    | TokenKind::Not
                    | TokenKind::Tilde
                    | TokenKind::Typeof
                    | TokenKind::Void
                    | TokenKind::Delete => {
                        flags &= !F_CAN_LABEL;
                        no_left_hand = true;
                        self.push_current(tokens)?;
                    }
                    TokenKind::PlusPlus | TokenKind::MinusMinus => {
                        let op = self.lexer.kind();
                        flags &= !F_CAN_LABEL;
                        no_left_hand = true;
                        self.push_current(tokens)?;
                        if self.lexer.kind() == TokenKind::Id && self.lexer.text() == "this" {
                            return Err(self.err_here(
                                ErrorKind::SyntaxError,
                                if op == TokenKind::PlusPlus {
                                    "invalid increment operand"
                                } else {
                                    "invalid decrement operand"
                                },
                            ));
                        }
                        break;
                    }
                    _ => break,
                }
            }

            self.tokenize_function_call(tokens, ctx, flags, state)?;

            // Postfix ++/-- bind only without a preceding line break.
            if !self.lexer.newline_before()
                && matches!(
                    self.lexer.kind(),
                    TokenKind::PlusPlus | TokenKind::MinusMinus
                )
            {
                no_left_hand = true;
                self.push_current(tokens)?;
            }
            if is_left_to_right_op(self.lexer.kind()) {
                no_left_hand = true;
                self.push_current(tokens)?;
            } else {
                break;
            }
        }
        if no_left_hand {
            *state &= !S_LEFT_HAND;
        }
        Ok(())
    }

    fn tokenize_function_call(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
    ) -> Result<(), ScriptError> {
        let for_new = flags & F_CALL_FOR_NEW != 0;
        let flags = flags & !F_CALL_FOR_NEW;
        self.tokenize_literal(tokens, ctx, flags, state)?;
        self.tokenize_member(tokens, ctx, flags, state)?;
        while self.lexer.kind() == TokenKind::LParen {
            *state &= !S_LEFT_HAND;
            ctx.marks.push(self.push_current(tokens)?);
            while self.lexer.kind() != TokenKind::RParen {
                self.tokenize_assignment(tokens, ctx, flags)?;
                if self.lexer.kind() != TokenKind::RParen {
                    self.push_expected2(tokens, TokenKind::Comma, TokenKind::RParen)?;
                }
            }
            self.push_expected(tokens, TokenKind::RParen)?;
            set_token_skip(tokens, &mut ctx.marks);
            if for_new {
                break;
            }
            self.tokenize_member(tokens, ctx, flags, state)?;
        }
        Ok(())
    }

    fn tokenize_member(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
    ) -> Result<(), ScriptError> {
        while self.lexer.kind() == TokenKind::Dot || self.lexer.kind() == TokenKind::LBracket {
            if self.lexer.kind() == TokenKind::Dot {
                self.push_current(tokens)?;
                self.push_expected(tokens, TokenKind::Id)?;
            } else {
                ctx.marks.push(self.push_current(tokens)?);
                self.tokenize_expression(tokens, ctx, flags)?;
                self.push_expected(tokens, TokenKind::RBracket)?;
                set_token_skip(tokens, &mut ctx.marks);
            }
            *state |= S_LEFT_HAND;
        }
        Ok(())
    }

    fn tokenize_literal(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
    ) -> Result<(), ScriptError> {
        *state &= !S_LEFT_HAND;
        let can_label = flags & F_CAN_LABEL != 0;
        let flags = flags & !F_CAN_LABEL;
        match self.lexer.kind() {
            TokenKind::Id => {
                let name = self.lexer.text().clone();
                let idx = self.push_current(tokens)?;
                if self.lexer.kind() == TokenKind::Colon && can_label {
                    if ctx.labels.iter().any(|l| *l == name) {
                        return Err(self.err_here(
                            ErrorKind::SyntaxError,
                            format!("duplicate label '{}'", name),
                        ));
                    }
                    tokens[idx].kind = TokenKind::Label;
                    ctx.labels.push(name);
                } else if name == "this" {
                    if self.lexer.kind().is_assignment() {
                        return Err(self.err_here(
                            ErrorKind::SyntaxError,
                            "invalid assignment left-hand side",
                        ));
                    }
                    if matches!(
                        self.lexer.kind(),
                        TokenKind::PlusPlus | TokenKind::MinusMinus
                    ) {
                        return Err(self.err_here(
                            ErrorKind::SyntaxError,
                            if self.lexer.kind() == TokenKind::PlusPlus {
                                "invalid increment operand"
                            } else {
                                "invalid decrement operand"
                            },
                        ));
                    }
                } else {
                    *state |= S_LEFT_HAND;
                }
            }
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Str
            | TokenKind::RegExp
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                self.push_current(tokens)?;
            }
            TokenKind::LBrace => {
                self.tokenize_object_literal(tokens, ctx, flags, state, ObjectLiteralKind::Object)?;
            }
            TokenKind::LBracket => {
                self.tokenize_object_literal(tokens, ctx, flags, state, ObjectLiteralKind::Array)?;
            }
            TokenKind::Let => {
                self.tokenize_let(tokens, ctx, flags)?;
            }
            TokenKind::Function => {
                self.tokenize_function(tokens, ctx, flags)?;
            }
            TokenKind::New => {
                ctx.marks.push(self.push_current(tokens)?);
                let mut new_state = 0u8;
                self.tokenize_function_call(tokens, ctx, flags | F_CALL_FOR_NEW, &mut new_state)?;
                set_token_skip(tokens, &mut ctx.marks);
            }
            TokenKind::LParen => {
                ctx.marks.push(self.push_current(tokens)?);
                self.tokenize_expression(tokens, ctx, flags)?;
                self.push_expected(tokens, TokenKind::RParen)?;
                set_token_skip(tokens, &mut ctx.marks);
            }
            _ => {
                return Err(self.err_here(
                    ErrorKind::SyntaxError,
                    format!("Got unexpected {}", self.lexer.kind().describe()),
                ));
            }
        }
        Ok(())
    }

    /// `{ … }` / `[ … ]`: parsed once into an element list that can serve as
    /// either an object/array literal or a destructuring pattern; the
    /// trailing context resolves the mode.
    fn tokenize_object_literal(
        &mut self,
        tokens: &mut Vec<Token>,
        ctx: &mut ScopeCtx,
        flags: u16,
        state: &mut u8,
        kind: ObjectLiteralKind,
    ) -> Result<(), ScriptError> {
        let nested = flags & F_NESTED_OBJECT != 0;
        let flags = flags & !F_NESTED_OBJECT;
        let line = self.lexer.line();
        let column = self.lexer.column();

        let (open, close) = match kind {
            ObjectLiteralKind::Object => (TokenKind::LBrace, TokenKind::RBrace),
            ObjectLiteralKind::Array => (TokenKind::LBracket, TokenKind::RBracket),
        };

        let mut elements: Vec<ObjectLiteralElement> = Vec::new();
        let mut destructuring = true;
        let mut structuring = true;
        // A shorthand `{a, b}` is only valid as a pattern; remember the
        // would-be error until the mode is known.
        let mut pending_error: Option<ScriptError> = None;
        let mut array_idx = 0;

        self.lexer.expect(open)?;
        while self.lexer.kind() != close {
            let mut id = ScriptString::empty();
            let mut value: Vec<Token> = Vec::new();
            let mut assign = false;

            if kind == ObjectLiteralKind::Array {
                id = ScriptString::from(array_idx.to_string());
                array_idx += 1;
                if self.lexer.kind() != TokenKind::Comma {
                    let mut dstate = S_DESTRUCTURING;
                    self.tokenize_assignment_state(
                        &mut value,
                        ctx,
                        flags | F_NESTED_OBJECT,
                        &mut dstate,
                    )?;
                    if destructuring {
                        destructuring = dstate == (S_LEFT_HAND | S_DESTRUCTURING);
                    }
                }
            } else {
                match self.lexer.kind() {
                    TokenKind::Id => {
                        id = self.lexer.text().clone();
                        let id_token = self.lexer.token().clone();
                        self.lexer.advance()?;
                        if (self.lexer.kind() == TokenKind::Id
                            || self.lexer.kind() == TokenKind::Str)
                            && (id == "get" || id == "set")
                        {
                            id = self.lexer.text().clone();
                            value.push(id_token);
                            self.tokenize_function(&mut value, ctx, flags | F_IS_ACCESSOR)?;
                            destructuring = false;
                        } else if destructuring
                            && (self.lexer.kind() == TokenKind::Comma
                                || self.lexer.kind() == close)
                        {
                            if pending_error.is_none() {
                                structuring = false;
                                pending_error = Some(self.err_here(
                                    ErrorKind::SyntaxError,
                                    format!(
                                        "Got '{}' expected ':'",
                                        self.lexer.kind().describe()
                                    ),
                                ));
                            }
                            value.push(id_token);
                        } else {
                            assign = true;
                        }
                    }
                    TokenKind::Int => {
                        id = ScriptString::from(self.lexer.token().int().to_string());
                        self.lexer.advance()?;
                        assign = true;
                    }
                    TokenKind::Float => {
                        id = ScriptString::from(format_double(self.lexer.token().float()));
                        self.lexer.advance()?;
                        assign = true;
                    }
                    TokenKind::Str => {
                        id = self.lexer.text().clone();
                        self.lexer.advance()?;
                        assign = true;
                    }
                    _ => {
                        self.lexer.check(TokenKind::Id, Some(TokenKind::Str))?;
                    }
                }
                if assign {
                    self.lexer.expect(TokenKind::Colon)?;
                    let mut dstate = S_DESTRUCTURING;
                    self.tokenize_assignment_state(
                        &mut value,
                        ctx,
                        flags | F_NESTED_OBJECT,
                        &mut dstate,
                    )?;
                    if destructuring {
                        destructuring = dstate == (S_LEFT_HAND | S_DESTRUCTURING);
                    }
                }
                if !destructuring {
                    if let Some(err) = pending_error.take() {
                        return Err(err);
                    }
                }
            }

            elements.push(ObjectLiteralElement {
                id,
                value: Rc::new(value),
            });
            if self.lexer.kind() != close {
                self.lexer.expect2(TokenKind::Comma, Some(close))?;
            }
        }
        self.lexer.expect(close)?;

        let data = Rc::new(ObjectLiteralData {
            kind,
            elements,
            destructuring: Cell::new(destructuring),
            structuring: Cell::new(structuring),
        });

        if destructuring && structuring {
            if nested {
                // Ambiguity survives into the parent literal unless the
                // trailing token rules a pattern out.
                if self.lexer.kind() != TokenKind::Comma
                    && self.lexer.kind() != close
                    && self.lexer.kind() != TokenKind::Assign
                {
                    data.destructuring.set(false);
                    data.structuring.set(true);
                }
            } else {
                data.set_mode(self.lexer.kind() == TokenKind::Assign);
            }
        } else if !data.destructuring.get() {
            if let Some(err) = pending_error {
                return Err(err);
            }
        }

        if data.destructuring.get() {
            *state |= S_LEFT_HAND | S_DESTRUCTURING;
        }
        let mut token = Token::bare(TokenKind::ObjectLiteral);
        token.payload = TokenPayload::ObjectLiteral(data);
        token.line = line;
        token.column = column;
        tokens.push(token);
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Cursor
// ----------------------------------------------------------------------

/// A saved position within the cursor's current token stream.
#[derive(Clone)]
pub struct CursorPos {
    tokens: TokenVec,
    pos: usize,
}

impl PartialEq for CursorPos {
    fn eq(&self, other: &CursorPos) -> bool {
        Rc::ptr_eq(&self.tokens, &other.tokens) && self.pos == other.pos
    }
}

struct CursorFrame {
    tokens: TokenVec,
    pos: usize,
}

/// The evaluator's cursor over a token buffer. Nested streams (function
/// bodies, object-literal elements) are pushed as frames; a frame pops
/// automatically when its last token has been consumed.
pub struct TokenCursor {
    stack: Vec<CursorFrame>,
    pub file: ScriptString,
}

impl TokenCursor {
    pub fn new(buffer: &TokenBuffer) -> TokenCursor {
        TokenCursor {
            stack: vec![CursorFrame {
                tokens: buffer.tokens.clone(),
                pos: 0,
            }],
            file: buffer.file.clone(),
        }
    }

    /// A cursor with nothing to execute; function bodies push their own
    /// frames onto it (host-initiated calls).
    pub fn empty(file: ScriptString) -> TokenCursor {
        TokenCursor {
            stack: vec![CursorFrame {
                tokens: Rc::new(vec![Token::bare(TokenKind::Eof)]),
                pos: 0,
            }],
            file,
        }
    }

    fn frame(&self) -> &CursorFrame {
        self.stack.last().unwrap_or_else(|| unreachable!())
    }

    pub fn token(&self) -> &Token {
        let frame = self.frame();
        &frame.tokens[frame.pos]
    }

    pub fn kind(&self) -> TokenKind {
        self.token().kind
    }

    pub fn line(&self) -> u32 {
        self.token().line
    }

    pub fn column(&self) -> u32 {
        self.token().column
    }

    /// Step to the next token, popping exhausted nested frames.
    pub fn advance(&mut self) {
        if self.kind() == TokenKind::Eof {
            return;
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.pos += 1;
        }
        self.normalize();
    }

    /// Jump past the current construct using its skip offset.
    pub fn skip_current(&mut self) {
        let skip = self.token().skip.max(1) as usize;
        if let Some(frame) = self.stack.last_mut() {
            frame.pos += skip;
        }
        self.normalize();
    }

    /// Pop frames whose last token has been consumed; the bottom frame
    /// clamps to its EOF sentinel instead.
    fn normalize(&mut self) {
        loop {
            let exhausted = {
                let frame = self.frame();
                frame.pos >= frame.tokens.len()
            };
            if !exhausted {
                return;
            }
            if self.stack.len() > 1 {
                self.stack.pop();
            } else if let Some(frame) = self.stack.last_mut() {
                frame.pos = frame.tokens.len() - 1;
                return;
            }
        }
    }

    /// Expect `kind` at the cursor and step over it. A missing `;` is
    /// tolerated before `}` and EOF.
    pub fn expect(&mut self, kind: TokenKind) -> Result<(), ScriptError> {
        if kind == TokenKind::Semicolon
            && (self.kind() == TokenKind::Eof || self.kind() == TokenKind::RBrace)
        {
            return Ok(());
        }
        if self.kind() != kind {
            return Err(ScriptError::syntax(
                format!(
                    "Got '{}' expected '{}'",
                    self.kind().describe(),
                    kind.describe()
                ),
                self.file.as_str(),
                self.line(),
                self.column(),
            ));
        }
        self.advance();
        Ok(())
    }

    /// Push a nested token stream; the cursor resumes after it on exhaustion.
    pub fn push_stream(&mut self, tokens: TokenVec) {
        if tokens.is_empty() {
            return;
        }
        self.stack.push(CursorFrame { tokens, pos: 0 });
    }

    pub fn position(&self) -> CursorPos {
        let frame = self.frame();
        CursorPos {
            tokens: frame.tokens.clone(),
            pos: frame.pos,
        }
    }

    /// Restore a position previously taken in the same frame.
    pub fn set_position(&mut self, pos: &CursorPos) {
        let frame = self.stack.last_mut().unwrap_or_else(|| unreachable!());
        debug_assert!(Rc::ptr_eq(&frame.tokens, &pos.tokens));
        frame.pos = pos.pos;
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drop nested frames down to `depth` (error recovery in callers that
    /// pushed streams).
    pub fn truncate(&mut self, depth: usize) {
        while self.stack.len() > depth.max(1) {
            self.stack.pop();
        }
    }
}

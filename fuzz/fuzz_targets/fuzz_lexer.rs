#![no_main]

use libfuzzer_sys::fuzz_target;

use scriptling::lexer::Lexer;
use scriptling::string_pool::StringPool;
use scriptling::token::TokenKind;
use scriptling::value::ScriptString;

fuzz_target!(|data: &str| {
    let mut pool = StringPool::new();
    let Ok(mut lexer) = Lexer::new(data, ScriptString::from("fuzz"), 0, 0, &mut pool) else {
        return;
    };
    for _ in 0..100_000 {
        if lexer.kind() == TokenKind::Eof {
            break;
        }
        if lexer.advance().is_err() {
            break;
        }
    }
});

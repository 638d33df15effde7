#![no_main]

use libfuzzer_sys::fuzz_target;

use scriptling::string_pool::StringPool;
use scriptling::tokenizer::TokenBuffer;

fuzz_target!(|data: &str| {
    let mut pool = StringPool::new();
    let _ = TokenBuffer::parse(data, "fuzz", 0, 0, false, &mut pool);
    let mut pool = StringPool::new();
    let _ = TokenBuffer::parse_expression(data, "fuzz", 0, 0, false, &mut pool);
});

//! Lexer throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scriptling::lexer::Lexer;
use scriptling::string_pool::StringPool;
use scriptling::token::TokenKind;
use scriptling::value::ScriptString;

const SAMPLE: &str = r#"
function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
var total = 0;
for (var i = 0; i < 100; i++) {
    total += fib(i % 10);
}
var config = {name: "bench", values: [1, 2.5, 0x1f, 1e-3], pattern: /[a-z]+/gi};
try { total = total / config.values.length; } catch (e) { total = -1; }
"#;

fn lex_all(source: &str) -> usize {
    let mut pool = StringPool::with_common_names();
    let mut lexer = Lexer::new(source, ScriptString::from("bench"), 0, 0, &mut pool)
        .unwrap_or_else(|e| panic!("{}", e));
    let mut count = 0;
    while lexer.kind() != TokenKind::Eof {
        count += 1;
        lexer.advance().unwrap_or_else(|e| panic!("{}", e));
    }
    count
}

fn bench_lexer(c: &mut Criterion) {
    c.bench_function("lex_sample", |b| {
        b.iter(|| lex_all(black_box(SAMPLE)));
    });

    let large: String = SAMPLE.repeat(50);
    c.bench_function("lex_sample_x50", |b| {
        b.iter(|| lex_all(black_box(&large)));
    });
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);

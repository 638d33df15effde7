//! Tokenizer (preparser) benchmarks: full TokenBuffer construction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scriptling::string_pool::StringPool;
use scriptling::tokenizer::TokenBuffer;

const SAMPLE: &str = r#"
function process(items) {
    var out = [];
    outer: for (var i = 0; i < items.length; i++) {
        let item = items[i];
        switch (typeof item) {
        case 'number': out[out.length] = item * 2; break;
        case 'string': continue outer;
        default: break outer;
        }
    }
    return out;
}
var {a, b} = {a: 1, b: 2};
try { process([a, b, 'x']); } catch (e if e.fatal) { throw e; } catch (e) {} finally {}
"#;

fn bench_tokenizer(c: &mut Criterion) {
    c.bench_function("tokenize_sample", |b| {
        b.iter(|| {
            let mut pool = StringPool::with_common_names();
            TokenBuffer::parse(black_box(SAMPLE), "bench", 0, 0, false, &mut pool)
                .unwrap_or_else(|e| panic!("{}", e))
        });
    });

    let large: String = SAMPLE.repeat(20);
    c.bench_function("tokenize_sample_x20", |b| {
        b.iter(|| {
            let mut pool = StringPool::with_common_names();
            TokenBuffer::parse(black_box(&large), "bench", 0, 0, false, &mut pool)
                .unwrap_or_else(|e| panic!("{}", e))
        });
    });
}

criterion_group!(benches, bench_tokenizer);
criterion_main!(benches);

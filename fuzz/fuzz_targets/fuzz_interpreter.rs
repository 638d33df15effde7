#![no_main]

use libfuzzer_sys::fuzz_target;

use scriptling::{Interpreter, InterpreterOptions};

fuzz_target!(|data: &str| {
    let mut interp = Interpreter::with_options(InterpreterOptions {
        max_call_depth: 32,
        ..Default::default()
    });
    let _ = interp.evaluate(data);
});

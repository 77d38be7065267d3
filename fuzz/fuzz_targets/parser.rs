#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Keep inputs small; the lexer and parser are linear but the harness allocates per token.
    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let (_tokens, _lex_diags) = cleave::lex(&src);
    let (program, _diags) = cleave::parse_program(Path::new("fuzz.js"), &src);
    let _ = cleave::check_program(Path::new("fuzz.js"), &program);
});

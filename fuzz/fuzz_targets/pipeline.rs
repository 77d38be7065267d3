#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if data.len() > 32 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let Ok((program, _warnings)) = cleave::parse_source(Path::new("fuzz.js"), &src) else {
        return;
    };

    // Partition invariants are checked by debug assertions inside the decomposer.
    let Ok(compilation) = cleave::compile_program(&program, "fuzz") else {
        return;
    };
    let settings = cleave::BuildSettings::default();
    let _ = cleave::render_text(&compilation.config);
    let _ = cleave::render_toml(&compilation.config, &settings);
});

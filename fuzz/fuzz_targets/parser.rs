#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Avoid pathological allocations in the harness itself; libFuzzer will still mutate below this.
    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let options = parsley::ParseOptions {
        max_diagnostics: usize::MAX,
        ..parsley::ParseOptions::default()
    };
    let program = parsley::parse_program_with_options(&src, &options);
    for pair in program.diagnostics.windows(2) {
        assert!(pair[0].span.start <= pair[1].span.start, "diagnostics out of order");
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let program = parsley::parse_program(&src);
    if !program.diagnostics.is_empty() {
        return;
    }

    // Clean programs must print to source that parses cleanly and prints the same way again.
    let options = parsley::FormatOptions::default();
    let printed = parsley::format_program(&program, &options);
    let reparsed = parsley::parse_program(&printed);
    assert!(reparsed.diagnostics.is_empty(), "printed source does not parse:\n{printed}");
    assert_eq!(parsley::format_program(&reparsed, &options), printed);
});

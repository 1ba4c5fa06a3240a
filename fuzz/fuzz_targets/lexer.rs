#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let (tokens, _diags) = parsley::tokenize(&src);
    for pair in tokens.windows(2) {
        assert!(pair[0].start <= pair[1].start, "tokens out of order");
    }
});

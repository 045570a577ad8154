#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Corrupt baselines decode to an empty map, never a panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = covlens::baseline::decode(s);
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parser must not panic on any input.
    let prefixes = vec!["app/".to_string(), "src/".to_string()];
    let _ = covlens::parsers::clover::parse(data, &prefixes);
});

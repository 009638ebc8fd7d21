#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any response body must yield prices or an error, never a panic
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = entsoe::client::document::parse_document(text);
        let _ = entsoe::client::document::resolution_minutes(text);
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(size) = imgprobe::miaf::read_size_from_meta(data) {
        assert!(size.orientation <= 8);
        assert!(!size.variants.is_empty());
    }
});

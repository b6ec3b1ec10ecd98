//! Feeds arbitrary bytes to every buffered decoder.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_probe_buffer

#![no_main]

use imgprobe::ImageFormat;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for format in ImageFormat::ALL {
        let _ = format.parse(data);
    }
});

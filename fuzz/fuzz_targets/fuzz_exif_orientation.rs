#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let orientation = imgprobe::exif::orientation(data);
    assert!(orientation <= 8);
});

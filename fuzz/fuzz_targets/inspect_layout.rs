//! Fuzz target for the tar block scanner with arbitrary input.
//!
//! The scanner must either describe the stream or report corruption; it must
//! never panic or overflow on hostile header sizes.
//!
//! Run with: cargo +nightly fuzz run inspect_layout

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(layout) = tarsplitter::format::inspect_layout(data, Path::new("fuzz")) {
        assert_eq!(layout.total_len, data.len() as u64);
        assert!(layout.data_end <= layout.total_len);
        assert_eq!(layout.total_len % tarsplitter::format::BLOCK_SIZE, 0);
    }
});

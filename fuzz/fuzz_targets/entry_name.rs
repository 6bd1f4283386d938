//! Fuzz target for entry name derivation with arbitrary path strings.
//!
//! Run with: cargo +nightly fuzz run entry_name
//!
//! Accepted names must be relative and free of `..` components.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::{Component, Path};

fuzz_target!(|data: &[u8]| {
    if let Ok(path_str) = std::str::from_utf8(data) {
        if let Ok(name) = tarsplitter::archive::entry_name(Path::new(path_str), None) {
            assert!(name.is_relative(), "absolute entry name: {:?}", name);
            assert!(
                name.components().all(|c| matches!(c, Component::Normal(_))),
                "unexpected component in {:?}",
                name
            );
        }
    }
});

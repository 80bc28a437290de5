//! Fuzz target for site file parsing.
//!
//! Feeds arbitrary bytes to the site JSON loader and validates whatever it
//! accepts, checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pipark_setup::site::io_json::from_json_slice;
use pipark_setup::validation::{validate_site, ValidateOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(site) = from_json_slice(data) {
        let _ = validate_site(&site, &ValidateOptions::default());
    }
});

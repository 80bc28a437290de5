//! Fuzz target for console session line parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pipark_setup::session::{parse_line, parse_world_coordinate};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_line(line);
    let _ = parse_world_coordinate(line);
});

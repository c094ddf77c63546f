//! Fuzz target for AIPP config extraction and input-slot planning.
//!
//! Arbitrary config values must never panic the extractor, and planning a
//! layout from whatever it accepts must not panic either.

#![no_main]

use aipp_runtime::aipp::{extract_configs, InputLayout};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(extracted) = extract_configs(data) else {
        return;
    };
    for data_len in 1..4 {
        let _ = InputLayout::plan_for_data(&extracted.configs, data_len);
    }
});

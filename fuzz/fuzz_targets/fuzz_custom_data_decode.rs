//! Fuzz target for custom-data envelope decoding.
//!
//! Arbitrary model buffers must decode to Ok or Err, never panic. A
//! successful decode must re-encode to the same envelope prefix.

#![no_main]

use aipp_runtime::model::custom_data::{decode, encode_with_payload, parse_envelope};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = parse_envelope(data);

    if let Ok(decoded) = decode(data) {
        if let Some(custom) = decoded.custom_data {
            // A non-canonical combined length only warns, so compare the parts.
            let encoded = encode_with_payload(&custom, decoded.payload).unwrap();
            assert_eq!(encoded.len(), data.len());
            assert_eq!(&encoded[8..], &data[8..]);
        }
    }
});

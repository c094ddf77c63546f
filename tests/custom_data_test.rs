//! Custom-data envelope: encode/decode round trips, framing boundaries and
//! file probing.

use std::io::Write;

use aipp_runtime::aipp::{encode_configs, AippPreprocessConfig, AIPP_PREPROCESS_TYPE};
use aipp_runtime::model::custom_data::{
    decode, encode_into, encode_with_payload, parse_envelope, probe_file, write_custom_data,
    CustomModelData, ENVELOPE_HEADER_LEN,
};
use aipp_runtime::AippError;

fn aipp_data() -> CustomModelData {
    CustomModelData::new(
        AIPP_PREPROCESS_TYPE,
        encode_configs(&[AippPreprocessConfig::default()]).unwrap(),
    )
}

#[test]
fn encoded_length_of_single_default_config() {
    let data = aipp_data();
    let bytes = data.envelope_bytes().unwrap();
    assert_eq!(data.value.len(), 308);
    assert_eq!(bytes.len(), 4 + 4 + 4 + 20 + 4 + 308);

    let (decoded, offset) = parse_envelope(&bytes).unwrap().unwrap();
    assert_eq!(decoded, data);
    assert_eq!(offset, bytes.len(), "no payload follows the envelope");
}

#[test]
fn roundtrip_with_payload() {
    let cases: Vec<(String, Vec<u8>, Vec<u8>)> = vec![
        ("T".to_string(), vec![1], vec![0xAA]),
        (
            AIPP_PREPROCESS_TYPE.to_string(),
            aipp_data().value,
            b"compiled-model".to_vec(),
        ),
        ("x".repeat(300), vec![7; 4096], vec![0; 1]),
    ];
    for (data_type, value, payload) in cases {
        let data = CustomModelData::new(data_type, value);
        let buffer = encode_with_payload(&data, &payload).unwrap();
        assert_eq!(buffer.len(), data.encoded_len() + payload.len());

        let decoded = decode(&buffer).unwrap();
        assert_eq!(decoded.custom_data.as_ref(), Some(&data));
        assert_eq!(decoded.payload, payload.as_slice());
    }
}

#[test]
fn encode_into_matches_encode_with_payload() {
    let data = aipp_data();
    let payload = b"model";
    let mut buffer = vec![0u8; data.encoded_len() + payload.len()];
    let mut offset = 0;
    encode_into(&mut buffer, &mut offset, &data).unwrap();
    assert_eq!(offset, data.encoded_len());
    buffer[offset..].copy_from_slice(payload);

    assert_eq!(buffer, encode_with_payload(&data, payload).unwrap());
}

#[test]
fn encode_into_rejects_buffer_without_room_for_payload() {
    let data = aipp_data();
    let mut buffer = vec![0u8; data.encoded_len()];
    let mut offset = 0;
    let err = encode_into(&mut buffer, &mut offset, &data).unwrap_err();
    assert!(matches!(err, AippError::InvalidArgument(_)));
    assert_eq!(offset, 0, "offset untouched on failure");
    assert!(buffer.iter().all(|&b| b == 0), "buffer untouched on failure");
}

#[test]
fn write_custom_data_streams_envelope() {
    let data = aipp_data();
    let mut out = Vec::new();
    write_custom_data(&mut out, &data).unwrap();
    assert_eq!(out, data.envelope_bytes().unwrap());
}

#[test]
fn untagged_buffer_is_returned_whole() {
    let buffer = b"\x7fELF-not-a-tagged-model";
    let decoded = decode(buffer).unwrap();
    assert!(decoded.custom_data.is_none());
    assert_eq!(decoded.payload, buffer);
    assert!(parse_envelope(buffer).unwrap().is_none());
}

#[test]
fn framing_errors_are_corrupt() {
    let good = encode_with_payload(&aipp_data(), b"payload").unwrap();

    // Every truncation inside the envelope must be rejected.
    let envelope_len = aipp_data().encoded_len();
    for cut in [5, ENVELOPE_HEADER_LEN - 1, 12 + 10, envelope_len - 1] {
        let err = decode(&good[..cut]).unwrap_err();
        assert!(err.is_corruption(), "cut at {} gave {:?}", cut, err);
    }

    // Negative value length.
    let mut bad = good.clone();
    let value_len_at = 12 + AIPP_PREPROCESS_TYPE.len();
    bad[value_len_at..value_len_at + 4].copy_from_slice(&(-1i32).to_le_bytes());
    assert!(decode(&bad).unwrap_err().is_corruption());

    // Value length running past the end.
    let mut bad = good.clone();
    bad[value_len_at..value_len_at + 4].copy_from_slice(&i32::MAX.to_le_bytes());
    assert!(decode(&bad).unwrap_err().is_corruption());

    // Envelope with nothing after it.
    let bare = aipp_data().envelope_bytes().unwrap();
    assert!(decode(&bare).unwrap_err().is_corruption());
}

#[test]
fn inconsistent_combined_length_still_decodes() {
    let mut buffer = encode_with_payload(&aipp_data(), b"p").unwrap();
    buffer[4..8].copy_from_slice(&0i32.to_le_bytes());
    let decoded = decode(&buffer).unwrap();
    assert_eq!(decoded.custom_data.unwrap(), aipp_data());
    assert_eq!(decoded.payload, b"p");
}

#[test]
fn probe_agrees_with_decode() {
    let tagged = encode_with_payload(&aipp_data(), b"payload").unwrap();
    let untagged = b"plain model payload".to_vec();

    for bytes in [tagged, untagged] {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let probed = probe_file(file.path());
        let decoded = decode(&bytes).unwrap();
        assert_eq!(probed, decoded.custom_data.is_some());
    }
}

#[test]
fn probe_short_or_missing_file_is_false() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"CUS").unwrap();
    file.flush().unwrap();
    assert!(!probe_file(file.path()));
    assert!(!probe_file("/nonexistent/model.om"));
}

//! Custom-data envelope codec.
//!
//! A model buffer may start with a tagged envelope carrying opaque
//! `(type, value)` metadata, followed by the compiled model payload:
//!
//! ```text
//! "CUST" | combined_len i32 | type_len i32 | type | value_len i32 | value | payload
//! ```
//!
//! All integers are little-endian. `combined_len` is `type_len + value_len`.
//! Buffers without the magic are plain model payloads.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::aipp::config::AIPP_PREPROCESS_TYPE;
use crate::error::{AippError, Result};
use crate::wire::{ByteReader, ByteWriter};

/// Magic tag opening a custom-data envelope.
pub const CUSTOM_DATA_MAGIC: &[u8; 4] = b"CUST";

/// Fixed bytes of an envelope: magic plus three length fields.
pub const ENVELOPE_HEADER_LEN: usize = CUSTOM_DATA_MAGIC.len() + 3 * 4;

/// Opaque metadata attached to a compiled model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CustomModelData {
    /// Discriminator, e.g. `"AippPreprocessConfig"`. Empty means no data.
    pub data_type: String,
    #[serde(skip)]
    pub value: Vec<u8>,
}

impl CustomModelData {
    pub fn new(data_type: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            data_type: data_type.into(),
            value,
        }
    }

    /// True when no metadata is attached.
    pub fn is_empty(&self) -> bool {
        self.data_type.is_empty()
    }

    /// True when the value carries AIPP preprocessing configs.
    pub fn is_aipp(&self) -> bool {
        self.data_type == AIPP_PREPROCESS_TYPE
    }

    /// Size of the envelope encoding this data, payload excluded.
    pub fn encoded_len(&self) -> usize {
        ENVELOPE_HEADER_LEN + self.data_type.len() + self.value.len()
    }

    fn length_field(len: usize, what: &str) -> Result<i32> {
        i32::try_from(len).map_err(|_| {
            AippError::InvalidArgument(format!("{} length {} does not fit the envelope", what, len))
        })
    }

    fn write_envelope(&self, w: &mut ByteWriter) -> Result<()> {
        let combined = Self::length_field(self.data_type.len() + self.value.len(), "custom data")?;
        let type_len = Self::length_field(self.data_type.len(), "type")?;
        let value_len = Self::length_field(self.value.len(), "value")?;
        w.put_bytes(CUSTOM_DATA_MAGIC);
        w.put_i32(combined);
        w.put_i32(type_len);
        w.put_bytes(self.data_type.as_bytes());
        w.put_i32(value_len);
        w.put_bytes(&self.value);
        Ok(())
    }

    /// The encoded envelope on its own.
    pub fn envelope_bytes(&self) -> Result<Vec<u8>> {
        let mut w = ByteWriter::with_capacity(self.encoded_len());
        self.write_envelope(&mut w)?;
        Ok(w.into_inner())
    }
}

/// Write the envelope for `data` into `buffer` at `*offset` and advance the
/// offset past it.
///
/// The space after `offset` must be strictly larger than the envelope so a
/// payload can follow it.
pub fn encode_into(buffer: &mut [u8], offset: &mut usize, data: &CustomModelData) -> Result<()> {
    let needed = data.encoded_len();
    let available = buffer.len().checked_sub(*offset).ok_or_else(|| {
        AippError::InvalidArgument(format!(
            "offset {} is past the end of a {} byte buffer",
            offset,
            buffer.len()
        ))
    })?;
    if available <= needed {
        tracing::error!(available, needed, "buffer too small for custom data");
        return Err(AippError::InvalidArgument(format!(
            "{} bytes available, envelope needs more than {}",
            available, needed
        )));
    }

    let envelope = data.envelope_bytes()?;
    buffer[*offset..*offset + envelope.len()].copy_from_slice(&envelope);
    *offset += envelope.len();
    Ok(())
}

/// Prepend the envelope for `data` to `payload`.
///
/// Returns `payload` unchanged when `data` is empty.
pub fn encode_with_payload(data: &CustomModelData, payload: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(payload.to_vec());
    }
    let mut w = ByteWriter::with_capacity(data.encoded_len() + payload.len());
    data.write_envelope(&mut w)?;
    w.put_bytes(payload);
    Ok(w.into_inner())
}

/// Stream the envelope for `data` to `writer`. Writes nothing when `data`
/// is empty.
pub fn write_custom_data<W: Write>(writer: &mut W, data: &CustomModelData) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    writer.write_all(&data.envelope_bytes()?)?;
    Ok(())
}

/// True if `bytes` starts with the envelope magic.
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(CUSTOM_DATA_MAGIC)
}

fn read_length(r: &mut ByteReader<'_>, field: &str) -> Result<usize> {
    let len = r.read_i32(field)?;
    if len <= 0 {
        tracing::error!(field, len, "custom data length must be positive");
        return Err(AippError::Corrupt(format!("{} {} must be positive", field, len)));
    }
    Ok(len as usize)
}

/// Parse the envelope at the start of `buffer`.
///
/// Returns `None` when the magic is absent, otherwise the custom data and
/// the offset at which the payload starts. The payload may be empty.
pub fn parse_envelope(buffer: &[u8]) -> Result<Option<(CustomModelData, usize)>> {
    if !has_magic(buffer) {
        return Ok(None);
    }
    let mut r = ByteReader::new(buffer);
    r.skip(CUSTOM_DATA_MAGIC.len(), "magic")?;
    let combined = r.read_i32("combined length")?;

    let type_len = read_length(&mut r, "type length")?;
    let data_type = std::str::from_utf8(r.take(type_len, "type")?)
        .map_err(|e| AippError::Corrupt(format!("custom data type is not UTF-8: {}", e)))?
        .to_string();
    let value_len = read_length(&mut r, "value length")?;
    let value = r.take(value_len, "value")?.to_vec();

    if i64::from(combined) != (type_len + value_len) as i64 {
        tracing::warn!(
            combined,
            type_len,
            value_len,
            "custom data combined length disagrees with its parts"
        );
    }

    Ok(Some((CustomModelData { data_type, value }, r.position())))
}

/// A model buffer split into its custom data and compiled payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBuffer<'a> {
    pub custom_data: Option<CustomModelData>,
    pub payload: &'a [u8],
}

/// Split `buffer` into custom data and model payload.
///
/// A buffer without the magic is returned whole as the payload. A tagged
/// buffer must carry a non-empty payload after its envelope.
pub fn decode(buffer: &[u8]) -> Result<ModelBuffer<'_>> {
    if buffer.len() <= CUSTOM_DATA_MAGIC.len() {
        return Err(AippError::InvalidArgument(format!(
            "model buffer of {} bytes is too small",
            buffer.len()
        )));
    }

    let Some((custom_data, offset)) = parse_envelope(buffer)? else {
        return Ok(ModelBuffer {
            custom_data: None,
            payload: buffer,
        });
    };
    let payload = &buffer[offset..];
    if payload.is_empty() {
        tracing::error!("custom data envelope is not followed by a model payload");
        return Err(AippError::Corrupt("empty model payload after custom data".into()));
    }

    tracing::debug!(
        data_type = %custom_data.data_type,
        value_len = custom_data.value.len(),
        payload_len = payload.len(),
        "decoded custom data"
    );
    Ok(ModelBuffer {
        custom_data: Some(custom_data),
        payload,
    })
}

/// Check whether the file at `path` starts with the envelope magic,
/// reading only the magic bytes.
pub fn probe_file(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    let mut head = [0u8; 4];
    let read = File::open(path).and_then(|mut f| f.read_exact(&mut head));
    match read {
        Ok(()) => has_magic(&head),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "custom data probe failed");
            false
        }
    }
}

//! Fixed binary envelope wrapped around every encoded payload.
//!
//! ```text
//! byte 0:      magic byte (0x00)
//! bytes 1-4:   schema id, u32 big-endian
//! bytes 5..N:  payload, extends to the end of the buffer
//! ```

use crate::errors::FramingError;

/// Reserved leading byte for this wire format version.
pub const MAGIC_BYTE: u8 = 0x0;

/// Magic byte plus schema id.
pub const HEADER_LEN: usize = 5;

/// A decoded envelope borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub schema_id: u32,
    pub payload: &'a [u8],
}

pub fn encode_envelope(schema_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(MAGIC_BYTE);
    buf.extend_from_slice(&schema_id.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Splits `data` into schema id and payload.
///
/// Inputs of `HEADER_LEN` bytes or fewer are rejected: a frame must carry
/// at least one payload byte.
pub fn decode_envelope(data: &[u8]) -> Result<Envelope<'_>, FramingError> {
    if data.len() <= HEADER_LEN {
        return Err(FramingError::TooShort { len: data.len() });
    }

    if data[0] != MAGIC_BYTE {
        return Err(FramingError::UnexpectedMagicByte { found: data[0] });
    }

    let schema_id = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);

    Ok(Envelope {
        schema_id,
        payload: &data[HEADER_LEN..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_writes_big_endian_header() {
        let framed = encode_envelope(7, br#"{"id": 42}"#);
        assert_eq!(&framed[..5], &[0x00, 0x00, 0x00, 0x00, 0x07]);
        assert_eq!(&framed[5..], br#"{"id": 42}"#);

        let framed = encode_envelope(0x0102_0304, b"x");
        assert_eq!(framed, vec![0x00, 0x01, 0x02, 0x03, 0x04, b'x']);
    }

    #[test]
    fn test_decode_splits_header_and_payload() {
        let data = [0x00, 0x00, 0x00, 0x01, 0x00, b'{', b'}'];
        let envelope = decode_envelope(&data).unwrap();
        assert_eq!(envelope.schema_id, 256);
        assert_eq!(envelope.payload, b"{}");
    }

    #[test]
    fn test_decode_rejects_header_only_frames() {
        for len in 0..=HEADER_LEN {
            let data = vec![0u8; len];
            assert_eq!(
                decode_envelope(&data),
                Err(FramingError::TooShort { len })
            );
        }
    }

    #[test]
    fn test_decode_rejects_wrong_magic_byte() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x07, b'1'];
        let err = decode_envelope(&data).unwrap_err();
        assert_eq!(err, FramingError::UnexpectedMagicByte { found: 1 });
        assert!(err.to_string().contains("Unexpected magic byte 1"));
    }

    #[test]
    fn test_max_schema_id_survives_framing() {
        let framed = encode_envelope(u32::MAX, b"0");
        assert_eq!(decode_envelope(&framed).unwrap().schema_id, u32::MAX);
    }
}

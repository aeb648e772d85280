//! Framed JSON codec: `<decimal-length>:<utf8-json-bytes>` messages with no
//! delimiter between them on the wire.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ArenaError, Result};

/// Encode `value` as `<len>:<json>` and flush the writer.
pub fn encode<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value).map_err(|e| ArenaError::BadJson {
        detail: e.to_string(),
    })?;
    write!(writer, "{}:", payload.len())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one `<len>:<json>` message from `reader` and deserialize it as `T`.
///
/// On any error the caller should treat the stream as unusable for further
/// reads: this function does not attempt to resynchronize after a partial
/// or malformed message.
pub fn decode<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let payload = read_framed(reader)?;
    serde_json::from_slice(&payload).map_err(|e| ArenaError::BadJson {
        detail: e.to_string(),
    })
}

/// Read the raw JSON payload bytes of one framed message, validating the
/// length prefix but not parsing the payload.
fn read_framed<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut digits = String::new();
    let mut bytes = reader.bytes();

    loop {
        let byte = match bytes.next() {
            Some(Ok(b)) => b,
            Some(Err(e)) => return Err(ArenaError::Io(e)),
            None => {
                return Err(ArenaError::Truncated);
            }
        };

        if byte == b':' {
            break;
        }

        if !byte.is_ascii_digit() {
            digits.push(byte as char);
            return Err(ArenaError::BadLength { found: digits });
        }

        digits.push(byte as char);
    }

    if digits.is_empty() {
        return Err(ArenaError::EmptyLength);
    }

    let length: u64 = digits.parse().map_err(|_| ArenaError::BadLength {
        found: digits.clone(),
    })?;
    if length.to_string() != digits {
        return Err(ArenaError::BadLength { found: digits });
    }

    let mut payload = vec![0u8; length as usize];
    let mut filled = 0usize;
    while filled < payload.len() {
        match bytes.next() {
            Some(Ok(b)) => {
                payload[filled] = b;
                filled += 1;
            }
            Some(Err(e)) => return Err(ArenaError::Io(e)),
            None => return Err(ArenaError::Truncated),
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::Cursor;

    #[test]
    fn round_trips_arbitrary_json() {
        let mut buf = Vec::new();
        let value = json!({"a": [1, 2, 3], "b": "hello", "c": null});
        encode(&mut buf, &value).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: Value = decode(&mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn encode_hello_matches_reference_wire_format() {
        let mut buf = Vec::new();
        encode(&mut buf, "hello").unwrap();
        assert_eq!(buf, b"7:\"hello\"");
    }

    #[test]
    fn encode_object_matches_reference_wire_format() {
        let mut buf = Vec::new();
        encode(&mut buf, &json!({"a": [1, 2, 3]})).unwrap();
        assert_eq!(buf, b"13:{\"a\":[1,2,3]}");
    }

    #[test]
    fn empty_length_before_colon() {
        let mut cursor = Cursor::new(b":{}".to_vec());
        let err = decode::<_, Value>(&mut cursor).unwrap_err();
        assert!(matches!(err, ArenaError::EmptyLength));
    }

    #[test]
    fn bad_length_non_canonical() {
        let mut cursor = Cursor::new(b"abc:hello".to_vec());
        let err = decode::<_, Value>(&mut cursor).unwrap_err();
        assert!(matches!(err, ArenaError::BadLength { .. }));
    }

    #[test]
    fn bad_length_leading_zero() {
        let mut cursor = Cursor::new(b"05:{\"a\":1}".to_vec());
        let err = decode::<_, Value>(&mut cursor).unwrap_err();
        assert!(matches!(err, ArenaError::BadLength { .. }));
    }

    #[test]
    fn truncated_payload() {
        let mut cursor = Cursor::new(b"10:{\"a\":1}".to_vec());
        // claim a length longer than what's actually available
        let mut cursor2 = Cursor::new(b"100:{\"a\":1}".to_vec());
        let err = decode::<_, Value>(&mut cursor2).unwrap_err();
        assert!(matches!(err, ArenaError::Truncated));

        // sanity: exact length succeeds
        let decoded: Value = decode(&mut cursor).unwrap();
        assert_eq!(decoded, json!({"a": 1}));
    }

    #[test]
    fn truncated_before_colon() {
        let mut cursor = Cursor::new(b"12".to_vec());
        let err = decode::<_, Value>(&mut cursor).unwrap_err();
        assert!(matches!(err, ArenaError::Truncated));
    }

    #[test]
    fn bad_json_payload() {
        let mut cursor = Cursor::new(b"5:not j".to_vec());
        let err = decode::<_, Value>(&mut cursor).unwrap_err();
        assert!(matches!(err, ArenaError::BadJson { .. }));
    }
}

//! Code-length-value codec
//!
//! DHCP options (RFC 2132) and the encapsulated vendor options carried inside
//! option 43 share the same layout: one code byte, one length byte and then
//! `length` bytes of payload. The end code (255) is a single byte with no
//! length field.

use crate::error::PxeError;
use bytes::{BufMut as _, Bytes, BytesMut};

/// Code that closes a TLV sequence.
pub const END: u8 = 255;

/// A single code-length-value entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub code: u8,
    pub payload: Bytes,
}

impl Tlv {
    pub fn new(code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    /// The terminator entry (code 255, no payload).
    pub fn end() -> Self {
        Self::new(END, Bytes::new())
    }

    pub fn is_end(&self) -> bool {
        self.code == END
    }

    /// Number of bytes this entry occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        if self.is_end() {
            1
        } else {
            2 + self.payload.len()
        }
    }
}

/// Encodes `entries` in order.
///
/// Fails if a payload does not fit in a single length byte, or if a
/// terminator carries a payload.
pub fn encode(entries: &[Tlv]) -> Result<Bytes, PxeError> {
    let mut buf = BytesMut::with_capacity(entries.iter().map(Tlv::encoded_len).sum());
    for entry in entries {
        if entry.is_end() {
            if !entry.payload.is_empty() {
                return Err(PxeError::PayloadTooLong {
                    code: entry.code,
                    len: entry.payload.len(),
                });
            }
            buf.put_u8(END);
            continue;
        }

        let len = u8::try_from(entry.payload.len()).map_err(|_| PxeError::PayloadTooLong {
            code: entry.code,
            len: entry.payload.len(),
        })?;
        buf.put_u8(entry.code);
        buf.put_u8(len);
        buf.extend_from_slice(&entry.payload);
    }
    Ok(buf.freeze())
}

/// Decodes a TLV sequence.
///
/// Decoding stops after a terminator, which is returned as the last entry.
/// Bytes following it are ignored. A missing terminator is not an error.
pub fn decode(data: &[u8]) -> Result<Vec<Tlv>, PxeError> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let code = data[offset];
        if code == END {
            entries.push(Tlv::end());
            break;
        }

        let Some(&len) = data.get(offset + 1) else {
            return Err(PxeError::MalformedTlv {
                offset,
                reason: "missing length byte",
            });
        };
        let start = offset + 2;
        let end = start + usize::from(len);
        if end > data.len() {
            return Err(PxeError::MalformedTlv {
                offset,
                reason: "length runs past end of buffer",
            });
        }

        entries.push(Tlv::new(code, Bytes::copy_from_slice(&data[start..end])));
        offset = end;
    }

    Ok(entries)
}

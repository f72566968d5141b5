//! Raw option access for DHCPv4 messages
//!
//! `dhcproto` models options as typed variants. The PXE logic only cares about
//! raw payload bytes, so this module bridges the two through the TLV codec.

use crate::{
    error::PxeError,
    tlv::{self, Tlv},
};
use bytes::{Bytes, BytesMut};
use dhcproto::{v4, Decodable as _, Decoder, Encodable as _};

/// Vendor-Specific Information (RFC 2132 §8.4).
pub const VENDOR_SPECIFIC_INFORMATION: u8 = 43;
/// Vendor Class Identifier (RFC 2132 §9.13).
pub const CLASS_IDENTIFIER: u8 = 60;
/// Client Machine Identifier (RFC 4578 §2.2).
pub const CLIENT_MACHINE_IDENTIFIER: u8 = 97;

/// An ordered option set with update-in-place semantics.
pub trait OptionStore {
    /// Returns the raw payload of option `code`, if present.
    fn get_option(&self, code: u8) -> Option<Bytes>;

    /// Sets option `code` to `payload`, replacing any previous value.
    fn set_option(&mut self, code: u8, payload: &[u8]) -> Result<(), PxeError>;

    /// Shortcut for the Vendor Class Identifier payload.
    fn class_identifier(&self) -> Option<Bytes> {
        self.get_option(CLASS_IDENTIFIER)
    }
}

impl OptionStore for v4::Message {
    fn get_option(&self, code: u8) -> Option<Bytes> {
        let opt = self.opts().get(v4::OptionCode::from(code))?;
        option_payload(code, opt)
    }

    fn set_option(&mut self, code: u8, payload: &[u8]) -> Result<(), PxeError> {
        let opt = option_from_payload(code, payload)?;
        self.opts_mut().insert(opt);
        Ok(())
    }

    fn class_identifier(&self) -> Option<Bytes> {
        match self.opts().get(v4::OptionCode::ClassIdentifier) {
            Some(v4::DhcpOption::ClassIdentifier(id)) => Some(Bytes::copy_from_slice(id)),
            Some(other) => option_payload(CLASS_IDENTIFIER, other),
            None => None,
        }
    }
}

/// Pad (RFC 2132 §3.1), a single byte with no payload.
pub const PAD: u8 = 0;

/// Builds a typed option from a raw payload.
///
/// The payload goes through the same decoder used for options on the wire, so
/// the resulting variant is whatever `dhcproto` would produce for that code.
/// Pad and End carry no payload and cannot be stored in an option set.
pub fn option_from_payload(code: u8, payload: &[u8]) -> Result<v4::DhcpOption, PxeError> {
    if code == PAD || code == tlv::END {
        return Err(PxeError::ReservedOptionCode(code));
    }
    let raw = tlv::encode(&[Tlv::new(code, Bytes::copy_from_slice(payload))])?;
    v4::DhcpOption::decode(&mut Decoder::new(&raw)).map_err(|e| PxeError::Protocol(Box::new(e)))
}

/// Extracts the raw payload of `opt`, which must carry `code`.
///
/// Options longer than 255 bytes are split into several entries on the wire
/// (RFC 3396); their payloads are concatenated back together.
pub fn option_payload(code: u8, opt: &v4::DhcpOption) -> Option<Bytes> {
    let raw = match opt.to_vec() {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!("Failed to encode option {}: {}", code, e);
            return None;
        }
    };

    let entries = match tlv::decode(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Option {} did not re-encode as TLV: {}", code, e);
            return None;
        }
    };

    let mut payload = BytesMut::new();
    let mut found = false;
    for entry in entries.iter().filter(|entry| entry.code == code) {
        payload.extend_from_slice(&entry.payload);
        found = true;
    }
    found.then(|| payload.freeze())
}

//! PXE client detection
//!
//! A PXE client announces itself in option 60 with a fixed 32 byte string
//! (Intel PXE §3.2.1):
//!
//! ```text
//! PXEClient:Arch:xxxxx:UNDI:yyyzzz
//! ```

use super::options::OptionStore;

/// Class identifier prefix sent by PXE clients, and the name echoed back in replies.
pub const PXE_CLIENT: &[u8] = b"PXEClient";

/// Exact length of a PXE client's class identifier.
pub const PXE_CLASS_IDENTIFIER_LEN: usize = 32;

/// Returns true if the message carries a PXE class identifier.
///
/// Absent or differently shaped identifiers are simply not PXE.
pub fn is_pxe_client(msg: &impl OptionStore) -> bool {
    msg.class_identifier()
        .is_some_and(|id| id.len() == PXE_CLASS_IDENTIFIER_LEN && id.starts_with(PXE_CLIENT))
}

/// Fields of a full `PXEClient:Arch:xxxxx:UNDI:yyyzzz` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PxeClassIdentifier {
    /// Client system architecture (RFC 4578 §2.1).
    pub arch: u16,
    pub undi_major: u16,
    pub undi_minor: u16,
}

impl PxeClassIdentifier {
    pub fn parse(id: &[u8]) -> Option<Self> {
        if id.len() != PXE_CLASS_IDENTIFIER_LEN {
            return None;
        }
        let id = std::str::from_utf8(id).ok()?;
        let rest = id.strip_prefix("PXEClient:Arch:")?;
        let (arch, undi) = rest.split_once(":UNDI:")?;
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if arch.len() != 5 || undi.len() != 6 || !digits(arch) || !digits(undi) {
            return None;
        }

        Some(Self {
            arch: arch.parse().ok()?,
            undi_major: undi[..3].parse().ok()?,
            undi_minor: undi[3..].parse().ok()?,
        })
    }
}

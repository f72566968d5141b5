//! PXE vendor options carried in option 43 (Intel PXE §3.2.3)

use super::options::{option_from_payload, VENDOR_SPECIFIC_INFORMATION};
use crate::{
    error::PxeError,
    tlv::{self, Tlv},
};
use bitflags::bitflags;
use bytes::Bytes;
use dhcproto::v4;

/// PXE sub-option codes inside option 43.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PxeVendorOption {
    MtftpIpAddress = 1,
    MtftpClientPort = 2,
    MtftpServerPort = 3,
    MtftpTimeout = 4,
    MtftpDelay = 5,
    DiscoveryControl = 6,
    DiscoveryMulticastAddress = 7,
    BootServers = 8,
    BootMenu = 9,
    MenuPrompt = 10,
    MulticastAddressAllocation = 11,
    CredentialTypes = 12,
    BootItem = 71,
    End = 255,
}

impl From<PxeVendorOption> for u8 {
    fn from(opt: PxeVendorOption) -> Self {
        opt as u8
    }
}

bitflags! {
    /// PXE_DISCOVERY_CONTROL bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DiscoveryControl: u8 {
        /// Broadcast discovery of boot servers is not allowed.
        const NO_BROADCAST = 0b0000_0001;
        /// Multicast discovery of boot servers is not allowed.
        const NO_MULTICAST = 0b0000_0010;
        /// Only use servers listed in PXE_BOOT_SERVERS.
        const SERVER_LIST_ONLY = 0b0000_0100;
        /// Download the boot file directly, without a menu prompt.
        const BOOT_WITHOUT_PROMPT = 0b0000_1000;
    }
}

/// Assembles an option 43 payload from PXE sub-options.
#[derive(Debug, Clone)]
pub struct VendorOptionBuilder {
    sub_options: Vec<Tlv>,
    terminate: bool,
}

impl VendorOptionBuilder {
    pub fn new() -> Self {
        Self {
            sub_options: Vec::new(),
            terminate: true,
        }
    }

    pub fn sub_option(mut self, code: PxeVendorOption, payload: impl Into<Bytes>) -> Self {
        self.sub_options.push(Tlv::new(code.into(), payload));
        self
    }

    pub fn discovery_control(self, control: DiscoveryControl) -> Self {
        self.sub_option(PxeVendorOption::DiscoveryControl, vec![control.bits()])
    }

    /// Whether to close the payload with PXE_END. Defaults to true.
    pub fn terminate(mut self, terminate: bool) -> Self {
        self.terminate = terminate;
        self
    }

    /// Encodes the sub-options into an option 43 payload.
    pub fn payload(&self) -> Result<Bytes, PxeError> {
        let mut entries = self.sub_options.clone();
        if self.terminate {
            entries.push(Tlv::end());
        }
        tlv::encode(&entries)
    }

    pub fn build(&self) -> Result<v4::DhcpOption, PxeError> {
        option_from_payload(VENDOR_SPECIFIC_INFORMATION, &self.payload()?)
    }
}

impl Default for VendorOptionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Option 43 carrying only discovery control `8` and the terminator (`06 01 08 FF`).
pub fn build_discovery_control_option() -> Result<v4::DhcpOption, PxeError> {
    VendorOptionBuilder::new()
        .discovery_control(DiscoveryControl::BOOT_WITHOUT_PROMPT)
        .build()
}

/// Decodes an option 43 payload into its sub-options.
///
/// A non-empty payload must be well-formed and closed by PXE_END.
pub fn parse_vendor_options(payload: &[u8]) -> Result<Vec<Tlv>, PxeError> {
    let entries = tlv::decode(payload)?;
    match entries.last() {
        None => Ok(entries),
        Some(last) if last.is_end() => Ok(entries),
        Some(_) => Err(PxeError::MalformedTlv {
            offset: payload.len(),
            reason: "vendor options are not terminated",
        }),
    }
}

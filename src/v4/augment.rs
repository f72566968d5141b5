//! Adds PXE options to a reply

use super::{
    classifier::{is_pxe_client, PXE_CLIENT},
    options::{option_from_payload, option_payload, CLASS_IDENTIFIER, CLIENT_MACHINE_IDENTIFIER},
    vendor::build_discovery_control_option,
};
use crate::error::PxeError;
use dhcproto::v4;

/// Length of option 97: one type byte followed by a 16 byte UUID.
pub const CLIENT_MACHINE_IDENTIFIER_LEN: usize = 17;

/// Options inserted into every PXE reply.
///
/// Built once and only ever read afterwards.
#[derive(Debug, Clone)]
pub struct Templates {
    pub class_identifier: v4::DhcpOption,
    pub vendor_specific: v4::DhcpOption,
}

impl Templates {
    pub fn new() -> Result<Self, PxeError> {
        Ok(Self {
            class_identifier: option_from_payload(CLASS_IDENTIFIER, PXE_CLIENT)?,
            vendor_specific: build_discovery_control_option()?,
        })
    }
}

/// Adds the PXE options to `resp` if `req` comes from a PXE client.
///
/// Sets option 60 to `PXEClient`, echoes the request's option 97 and replaces
/// option 43 with the vendor template. Returns false and leaves `resp`
/// untouched when the request is not PXE or its machine identifier is missing
/// or not 17 bytes long.
pub fn augment(templates: &Templates, req: &v4::Message, resp: &mut v4::Message) -> bool {
    if !is_pxe_client(req) {
        return false;
    }

    let Some(cmi) = req.opts().get(v4::OptionCode::from(CLIENT_MACHINE_IDENTIFIER)) else {
        tracing::debug!("PXE client without a machine identifier, skipping");
        return false;
    };
    let cmi_len = option_payload(CLIENT_MACHINE_IDENTIFIER, cmi).map(|payload| payload.len());
    if cmi_len != Some(CLIENT_MACHINE_IDENTIFIER_LEN) {
        tracing::debug!(
            "PXE client machine identifier has length {:?}, skipping",
            cmi_len
        );
        return false;
    }

    let opts = resp.opts_mut();
    opts.insert(templates.class_identifier.clone());
    opts.insert(cmi.clone());
    opts.insert(templates.vendor_specific.clone());
    true
}

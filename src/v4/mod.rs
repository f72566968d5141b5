//! DHCPv4 PXE support
//!
//! This module contains:
//! - Raw option access on `dhcproto` messages
//! - PXE client classification
//! - Option 43 vendor sub-option encoding
//! - The PXE request handler

pub mod augment;
pub mod classifier;
pub mod handler;
pub mod options;
pub mod vendor;


pub use augment::{augment, Templates};
pub use classifier::{is_pxe_client, PxeClassIdentifier};
pub use handler::PxeHandler;
pub use options::OptionStore;
pub use vendor::{build_discovery_control_option, DiscoveryControl, VendorOptionBuilder};

//! PXE request handler
//!
//! The handler only exists once its templates are built, so a request can never
//! be processed before setup has finished. After that it holds no mutable state
//! and can be shared across any number of concurrent requests.

use super::{
    augment::{augment, Templates},
    classifier::PxeClassIdentifier,
    options::OptionStore,
};
use crate::{
    error::PxeError,
    plugin::{Flow, Handler4},
};
use dhcproto::v4;

#[derive(Debug, Clone)]
pub struct PxeHandler {
    templates: Templates,
}

impl PxeHandler {
    /// Builds the reply templates. The plugin takes no arguments.
    pub fn setup(args: &[String]) -> Result<Self, PxeError> {
        if !args.is_empty() {
            tracing::warn!("PXE plugin ignores its arguments: {:?}", args);
        }

        let templates = Templates::new()
            .map_err(|e| PxeError::Setup(format!("failed to build PXE option templates: {e}")))?;

        tracing::info!("Loaded PXE plugin for DHCPv4");
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }
}

impl Handler4 for PxeHandler {
    fn handle(&self, req: &v4::Message, resp: &mut v4::Message) -> Flow {
        if augment(&self.templates, req, resp) {
            match req.class_identifier().and_then(|id| PxeClassIdentifier::parse(&id)) {
                Some(id) => tracing::debug!(
                    "Added PXE options for xid {:#x} (arch {}, UNDI {}.{})",
                    req.xid(),
                    id.arch,
                    id.undi_major,
                    id.undi_minor
                ),
                None => tracing::debug!("Added PXE options for xid {:#x}", req.xid()),
            }
        }

        // PXE options never preclude other plugins from adding theirs.
        Flow::Continue
    }
}

//! Plugin registry and handler chain
//!
//! Every plugin builds its handler once at startup. Requests then run through
//! the handlers in configuration order, each one free to add options to the
//! shared reply.

use crate::{config::PluginSpec, error::PxeError, v4::PxeHandler};
use dhcproto::v4;

/// What the chain should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// A per-request DHCPv4 handler.
pub trait Handler4: Send + Sync {
    /// Inspects `req` and updates `resp` in place.
    fn handle(&self, req: &v4::Message, resp: &mut v4::Message) -> Flow;
}

/// Builds a handler from its plugin arguments.
pub type Setup4 = fn(&[String]) -> Result<Box<dyn Handler4>, PxeError>;

/// A named handler factory.
#[derive(Clone, Copy)]
pub struct Plugin {
    pub name: &'static str,
    pub setup4: Setup4,
}

fn setup_pxe(args: &[String]) -> Result<Box<dyn Handler4>, PxeError> {
    Ok(Box::new(PxeHandler::setup(args)?))
}

/// All plugins known to the server.
pub static PLUGINS: &[Plugin] = &[Plugin {
    name: "pxe",
    setup4: setup_pxe,
}];

pub fn lookup(name: &str) -> Option<&'static Plugin> {
    PLUGINS.iter().find(|plugin| plugin.name == name)
}

/// Handlers in the order they run.
#[derive(Default)]
pub struct HandlerChain {
    handlers: Vec<(&'static str, Box<dyn Handler4>)>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets up every configured plugin, failing on the first error.
    pub fn from_specs(specs: &[PluginSpec]) -> Result<Self, PxeError> {
        let mut chain = Self::new();
        for spec in specs {
            let plugin =
                lookup(&spec.name).ok_or_else(|| PxeError::UnknownPlugin(spec.name.clone()))?;
            let handler = (plugin.setup4)(&spec.args)?;
            tracing::info!("Loaded plugin '{}'", plugin.name);
            chain.push(plugin.name, handler);
        }
        Ok(chain)
    }

    pub fn push(&mut self, name: &'static str, handler: Box<dyn Handler4>) {
        self.handlers.push((name, handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs `req` through the handlers until one of them stops the chain.
    pub fn run(&self, req: &v4::Message, mut resp: v4::Message) -> v4::Message {
        for (name, handler) in &self.handlers {
            if handler.handle(req, &mut resp) == Flow::Stop {
                tracing::debug!("Plugin '{}' stopped the handler chain", name);
                break;
            }
        }
        resp
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|(name, _)| name))
            .finish()
    }
}
